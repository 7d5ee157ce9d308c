//! `ledgerpost-recon` — Vendor payment reconciliation engine.
//!
//! Pure engine crate: receives canonical payment and note tables, matches
//! them per party against the contact directory, and renders statements.
//! No CLI or IO dependencies.

pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod render;

pub use config::{MatchKey, RowPolicy, RunConfig};
pub use error::ReconError;
pub use matcher::{match_parties, MatchOptions};
pub use model::{
    DispatchRecord, DispatchStatus, MatchReport, MatchResult, MissingContact, NoteRow,
    PartyContact, PartySkip, PaymentRow, RowMismatch, SheetVariant, SkipReason,
};
pub use render::{render, Statement};
