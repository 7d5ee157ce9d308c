//! `ledgerpost-io` — File I/O: workbook normalization, the party email
//! directory store, and xlsx exports.

pub mod auth;
pub mod directory;
pub mod error;
pub mod export;
pub mod normalize;

pub use auth::verify_secret;
pub use directory::{DirectoryStore, ImportOutcome};
pub use error::{AuthError, ExportError, SchemaError, StoreError};
pub use normalize::{normalize_workbook, NormalizedTables};
