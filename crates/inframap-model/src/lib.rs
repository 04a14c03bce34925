#![forbid(unsafe_code)]
//! Inventory model SSOT.

mod asset;
mod issue;
mod registry;

pub use asset::{Asset, AssetId, DependencyExpr, ValidationError, RECOGNIZED_TAGS};
pub use issue::{Issue, IssueReport, Severity};
pub use registry::{
    AssetTypeSpec, DependencyPattern, RegistryError, TypeRegistry, TypeTag,
};
