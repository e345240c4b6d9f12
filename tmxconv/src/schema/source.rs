//! Where a DTD comes from, and a cache that fetches it at most once.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use tracing::{debug, info};

use super::dtd::Dtd;
use super::validate::Violation;
use crate::error::Error;

/// Published location of the TMX 1.4 DTD.
pub const TMX14_DTD_URL: &str =
    "https://www.gala-global.org/sites/default/files/uploads/pdfs/tmx14%20%281%29.dtd";

/// Something that can produce DTD text.
pub trait SchemaSource {
    fn load(&self) -> Result<String, Error>;
}

/// A DTD fetched over HTTP(S).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSchema {
    pub url: String,
}

impl RemoteSchema {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for RemoteSchema {
    fn default() -> Self {
        Self::new(TMX14_DTD_URL)
    }
}

impl SchemaSource for RemoteSchema {
    fn load(&self) -> Result<String, Error> {
        info!(url = %self.url, "fetching schema");
        let response = reqwest::blocking::get(&self.url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::schema_error(format!(
                "GET {} returned {status}",
                self.url
            )));
        }
        Ok(response.text()?)
    }
}

/// A DTD read from the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSchema {
    pub path: PathBuf,
}

impl FileSchema {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SchemaSource for FileSchema {
    fn load(&self) -> Result<String, Error> {
        debug!(path = %self.path.display(), "reading schema");
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// A schema given on the command line or in configuration: a URL or a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaLocation {
    Remote(RemoteSchema),
    File(FileSchema),
}

impl SchemaLocation {
    /// `http://` and `https://` locations are fetched; anything else is a path.
    pub fn parse(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SchemaLocation::Remote(RemoteSchema::new(location))
        } else {
            SchemaLocation::File(FileSchema::new(location))
        }
    }
}

impl Default for SchemaLocation {
    fn default() -> Self {
        SchemaLocation::Remote(RemoteSchema::default())
    }
}

impl Display for SchemaLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaLocation::Remote(remote) => f.write_str(&remote.url),
            SchemaLocation::File(file) => write!(f, "{}", file.path.display()),
        }
    }
}

impl SchemaSource for SchemaLocation {
    fn load(&self) -> Result<String, Error> {
        match self {
            SchemaLocation::Remote(remote) => remote.load(),
            SchemaLocation::File(file) => file.load(),
        }
    }
}

/// Lazily loaded, process-lifetime DTD.
///
/// The source is consulted on the first successful [`SchemaCache::get`] only.
/// A failed load is not cached, so a later call may retry. Safe to share
/// between threads; concurrent first calls load once.
#[derive(Debug)]
pub struct SchemaCache<S> {
    source: S,
    dtd: OnceLock<Dtd>,
    loading: Mutex<()>,
}

impl<S: SchemaSource> SchemaCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            dtd: OnceLock::new(),
            loading: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.dtd.get().is_some()
    }

    /// The parsed DTD, loading it on first use.
    pub fn get(&self) -> Result<&Dtd, Error> {
        if let Some(dtd) = self.dtd.get() {
            return Ok(dtd);
        }
        let _guard = self
            .loading
            .lock()
            .map_err(|_| Error::schema_error("schema loader poisoned"))?;
        if let Some(dtd) = self.dtd.get() {
            return Ok(dtd);
        }
        let dtd = Dtd::parse(&self.source.load()?)?;
        debug!(elements = dtd.element_count(), "schema loaded");
        Ok(self.dtd.get_or_init(|| dtd))
    }

    /// Validate one file against the cached DTD.
    pub fn validate_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Violation>, Error> {
        self.get()?.validate_file(path)
    }
}
