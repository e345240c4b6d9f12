//! TMX validation against a DTD.
//!
//! The DTD is obtained through a [`SchemaSource`] and held by a
//! [`SchemaCache`], which loads it once per process and hands the parsed
//! [`Dtd`] to every validation.

pub mod dtd;
pub mod source;
pub mod validate;

pub use dtd::Dtd;
pub use source::{
    FileSchema, RemoteSchema, SchemaCache, SchemaLocation, SchemaSource, TMX14_DTD_URL,
};
pub use validate::{Violation, ViolationKind};
