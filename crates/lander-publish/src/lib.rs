//! Static publishing pipeline for lander landing pages.
//!
//! Stage A ([`Transformer`]) turns a site build into a relocatable bundle
//! with a manifest. Stage B ([`Publisher`]) fetches the manifest's files,
//! drops editor-only assets, seeds the entry document with the live
//! configuration and packs everything into one archive.

pub mod html;
pub mod manifest;
pub mod package;
pub mod source;
pub mod templates;
pub mod transform;

pub use manifest::{Manifest, MANIFEST_FILE};
pub use package::{PublishBundle, PublishConfig, PublishError, Publisher};
pub use source::{AssetSource, DirSource, FetchError, HttpSource};
pub use templates::{TemplateEngine, BOOTSTRAP_GLOBAL};
pub use transform::{TransformConfig, TransformError, TransformResult, Transformer};
