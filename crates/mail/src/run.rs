//! Sequential dispatch orchestration: one run processes READY parties in
//! match-report order, with per-party fault isolation and a blocking
//! inter-message delay as backpressure against transport rate limits.

use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use ledgerpost_recon::model::{
    DispatchRecord, DispatchStatus, MatchReport, MatchResult, SheetVariant,
};
use ledgerpost_recon::render::render;

use crate::audit::{append_lines, AuditLog};
use crate::dedup::DedupStore;
use crate::error::AuditError;
use crate::transport::{MailTransport, OutgoingEmail};

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub records: Vec<DispatchRecord>,
}

pub struct Dispatcher<'a> {
    pub transport: &'a dyn MailTransport,
    pub dedup: &'a dyn DedupStore,
    pub audit: &'a AuditLog,
    /// Sender address for every message in the run.
    pub from: String,
    /// Blocking delay after each transport attempt.
    pub throttle: Duration,
}

fn distinct_invoices(result: &MatchResult) -> Vec<String> {
    let mut invoices: Vec<String> = Vec::new();
    for row in &result.payments {
        if !row.invoice_no.is_empty() && !invoices.contains(&row.invoice_no) {
            invoices.push(row.invoice_no.clone());
        }
    }
    invoices
}

impl Dispatcher<'_> {
    /// Dispatch one statement per READY party. A failure for one party is
    /// recorded and the loop continues; only audit-append failures abort.
    pub fn run(
        &self,
        ready: &[MatchResult],
        variant: SheetVariant,
    ) -> Result<RunOutcome, AuditError> {
        let mut outcome = RunOutcome::default();

        for result in ready {
            let sent_at = chrono::Utc::now().to_rfc3339();
            let invoices = distinct_invoices(result);

            // The dedup store is consulted opportunistically: a store
            // failure downgrades to "not yet sent".
            let already_sent = match self.dedup.any_sent(&result.party_code, &invoices) {
                Ok(hit) => hit,
                Err(e) => {
                    warn!("dedup lookup failed for {}: {e}", result.party_code);
                    false
                }
            };

            let mut attempted_transport = false;
            let status = if already_sent {
                outcome.skipped += 1;
                info!("skipping {}: an invoice was already recorded as sent", result.party_code);
                DispatchStatus::Skipped("invoice already recorded as sent".into())
            } else {
                attempted_transport = true;
                let statement = render(result, variant);
                let email = OutgoingEmail {
                    from: self.from.clone(),
                    to: result.to_emails.clone(),
                    cc: result.cc_emails.clone(),
                    subject: format!(
                        "Payment Reconciliation for {} - {}",
                        result.party_code, result.party_name
                    ),
                    html_body: statement.to_html(),
                };
                match self.transport.send(&email) {
                    Ok(()) => {
                        outcome.sent += 1;
                        info!(
                            "sent statement to {} ({})",
                            result.party_name, result.party_code
                        );
                        if let Err(e) =
                            self.dedup.record_sent(&result.party_code, &invoices, &sent_at)
                        {
                            warn!("dedup record failed for {}: {e}", result.party_code);
                        }
                        DispatchStatus::Sent
                    }
                    Err(e) => {
                        outcome.failed += 1;
                        warn!("dispatch failed for {}: {e}", result.party_code);
                        DispatchStatus::Failed(e.to_string())
                    }
                }
            };

            let record = DispatchRecord {
                party_code: result.party_code.clone(),
                party_name: result.party_name.clone(),
                recipients: result.to_emails.clone(),
                cc: result.cc_emails.clone(),
                status,
                sent_at,
            };
            self.audit.append(&record)?;
            outcome.records.push(record);

            if attempted_transport && !self.throttle.is_zero() {
                thread::sleep(self.throttle);
            }
        }

        info!(
            "run complete: {} sent, {} failed, {} skipped",
            outcome.sent, outcome.failed, outcome.skipped
        );
        Ok(outcome)
    }
}

/// Append the matcher's diagnostics to the two append-only text logs.
pub fn append_match_logs(
    report: &MatchReport,
    skip_log: &Path,
    mismatch_log: &Path,
) -> Result<(), AuditError> {
    if !report.skips.is_empty() {
        append_lines(skip_log, report.skips.iter().map(|s| s.to_string()))?;
    }
    if !report.mismatches.is_empty() {
        append_lines(mismatch_log, report.mismatches.iter().map(|m| m.to_string()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
