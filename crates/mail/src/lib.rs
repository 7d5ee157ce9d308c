//! `ledgerpost-mail` — Statement dispatch: SMTP transport, append-only
//! audit log, optional dedup store, and the sequential run orchestrator.

pub mod audit;
pub mod dedup;
pub mod error;
pub mod run;
pub mod transport;

pub use audit::AuditLog;
pub use dedup::{DedupStore, NoopDedup, SqliteDedup};
pub use error::{AuditError, DedupError, DispatchError};
pub use run::{append_match_logs, Dispatcher, RunOutcome};
pub use transport::{MailTransport, OutgoingEmail, SmtpMailer};
