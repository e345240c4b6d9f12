//! Output file naming.

use std::path::{Path, PathBuf};

/// Derive an output file name from an input file name.
///
/// If `name` ends with `from_ext` (compared case-insensitively) that suffix is
/// replaced by `to_ext`; otherwise `to_ext` is appended. No filesystem access.
///
/// ```rust
/// use tmxconv::path::derive_output_path;
/// assert_eq!(derive_output_path("a.csv", ".csv", ".tmx"), "a.tmx");
/// assert_eq!(derive_output_path("A.CSV", ".csv", ".tmx"), "A.tmx");
/// assert_eq!(derive_output_path("a.txt", ".csv", ".tmx"), "a.txt.tmx");
/// ```
pub fn derive_output_path(name: &str, from_ext: &str, to_ext: &str) -> String {
    match strip_suffix_ignore_case(name, from_ext) {
        Some(stem) => format!("{stem}{to_ext}"),
        None => format!("{name}{to_ext}"),
    }
}

/// [`derive_output_path`] for filesystem paths.
///
/// Non-UTF-8 names never match `from_ext` and get `to_ext` appended.
pub fn derive_output_pathbuf(path: &Path, from_ext: &str, to_ext: &str) -> PathBuf {
    match path.to_str() {
        Some(name) => PathBuf::from(derive_output_path(name, from_ext, to_ext)),
        None => {
            let mut os = path.as_os_str().to_owned();
            os.push(to_ext);
            PathBuf::from(os)
        }
    }
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}
