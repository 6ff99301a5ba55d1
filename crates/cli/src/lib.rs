//! Documentation generators for the frolf bot event contracts
//!
//! The build-time pipeline runs in two steps:
//! - [`asyncapi`] projects the event registry onto an AsyncAPI 2.4 document
//! - [`eventcatalog`] turns that document into an EventCatalog site tree
//!
//! Both are exposed as binaries (`asyncapi-gen`, `eventcatalog-gen`) and as
//! library functions for tests and tooling.

pub mod asyncapi;
pub mod error;
pub mod eventcatalog;

pub use asyncapi::AsyncApiDocument;
pub use error::{CodegenError, Result};
pub use eventcatalog::CatalogSummary;
