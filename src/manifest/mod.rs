//! Manifest store: the declaration grammar, file I/O, and manifest discovery.
pub mod catalog;
pub mod declaration;
pub mod store;

pub use catalog::{Catalog, LoadedManifest, Manifest, ManifestId, PRIMARY_FILE, Scope, Selection};
pub use declaration::{Declaration, Kind};
