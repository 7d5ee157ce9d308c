use std::collections::BTreeMap;

use crate::config::{MatchKey, RowPolicy};
use crate::model::{
    MatchReport, MatchResult, MissingContact, NoteRow, PartyContact, PartySkip, PaymentRow,
    RowMismatch, SkipReason, AMOUNT_TOLERANCE_CENTS,
};

#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    pub match_key: MatchKey,
    pub row_policy: RowPolicy,
}

impl MatchOptions {
    pub fn new(match_key: MatchKey, row_policy: RowPolicy) -> Self {
        Self { match_key, row_policy }
    }
}

fn payment_key<'a>(row: &'a PaymentRow, key: MatchKey) -> &'a str {
    match key {
        MatchKey::PartyCode => row.party_code.trim(),
        MatchKey::PartyName => row.party_name.trim(),
    }
}

fn note_key<'a>(row: &'a NoteRow, key: MatchKey) -> &'a str {
    match key {
        MatchKey::PartyCode => row.party_code.trim(),
        MatchKey::PartyName => row.party_name.trim(),
    }
}

fn contact_key<'a>(contact: &'a PartyContact, key: MatchKey) -> &'a str {
    match key {
        MatchKey::PartyCode => contact.party_code.trim(),
        MatchKey::PartyName => contact.party_name.trim(),
    }
}

/// Join canonical payments and notes per directory entry.
///
/// Iteration order is directory order, so the output is deterministic and a
/// party appears in at most one `MatchResult`. The missing-contact sweep runs
/// over the full payment set independently: a key without a directory entry
/// never reaches the per-party loop at all, and surfaces only there.
pub fn match_parties(
    payments: &[PaymentRow],
    notes: &[NoteRow],
    directory: &[PartyContact],
    options: &MatchOptions,
) -> MatchReport {
    let mut ready = Vec::new();
    let mut skips = Vec::new();
    let mut mismatches = Vec::new();

    for contact in directory {
        let key = contact_key(contact, options.match_key);

        let party_payments: Vec<&PaymentRow> = payments
            .iter()
            .filter(|row| payment_key(row, options.match_key) == key)
            .collect();
        if party_payments.is_empty() {
            skips.push(PartySkip {
                party_code: contact.party_code.clone(),
                reason: SkipReason::NoPayments,
            });
            continue;
        }

        let party_notes: Vec<&NoteRow> = notes
            .iter()
            .filter(|row| note_key(row, options.match_key) == key)
            .collect();

        // Credit notes (negative) offset balance but are not debit
        // obligations, so the consistency gate sums positive notes only.
        let note_debit_cents: i64 = party_notes
            .iter()
            .filter(|n| n.amount_cents > 0)
            .map(|n| n.amount_cents)
            .sum();
        let payment_debit_cents: i64 = party_payments.iter().map(|r| r.debit_cents).sum();

        if (payment_debit_cents - note_debit_cents).abs() > AMOUNT_TOLERANCE_CENTS {
            skips.push(PartySkip {
                party_code: contact.party_code.clone(),
                reason: SkipReason::DebitMismatch {
                    payment_debit_cents,
                    note_debit_cents,
                },
            });
            continue;
        }

        let included = select_rows(
            &party_payments,
            &party_notes,
            options.row_policy,
            &contact.party_code,
            &mut mismatches,
        );
        if included.is_empty() {
            skips.push(PartySkip {
                party_code: contact.party_code.clone(),
                reason: SkipReason::AllRowsMatched,
            });
            continue;
        }

        ready.push(MatchResult {
            party_code: contact.party_code.clone(),
            party_name: contact.party_name.clone(),
            to_emails: contact.to_emails.clone(),
            cc_emails: contact.cc_emails.clone(),
            payments: included,
            notes: party_notes.into_iter().cloned().collect(),
        });
    }

    let missing_contacts = missing_contact_sweep(payments, directory, options.match_key);

    MatchReport {
        ready,
        skips,
        missing_contacts,
        mismatches,
    }
}

fn select_rows(
    party_payments: &[&PaymentRow],
    party_notes: &[&NoteRow],
    policy: RowPolicy,
    party_code: &str,
    mismatches: &mut Vec<RowMismatch>,
) -> Vec<PaymentRow> {
    let mut included = Vec::with_capacity(party_payments.len());
    for row in party_payments {
        match policy {
            RowPolicy::IncludeAll => included.push((*row).clone()),
            RowPolicy::CrossCheck => {
                let note_ref = row
                    .debit_note_ref
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty());
                let Some(note_ref) = note_ref else {
                    included.push((*row).clone());
                    continue;
                };
                match party_notes.iter().find(|n| n.reference_no == note_ref) {
                    None => included.push((*row).clone()),
                    Some(note) => {
                        if (row.net_cents - note.amount_cents).abs() <= AMOUNT_TOLERANCE_CENTS {
                            included.push((*row).clone());
                        } else {
                            mismatches.push(RowMismatch {
                                party_code: party_code.to_string(),
                                note_ref: note_ref.to_string(),
                                payment_net_cents: row.net_cents,
                                note_amount_cents: note.amount_cents,
                            });
                        }
                    }
                }
            }
        }
    }
    included
}

/// Every distinct key in the payment sheet that is absent from the
/// directory, or present with only empty/placeholder addresses. First-seen
/// payment order; one entry per key.
fn missing_contact_sweep(
    payments: &[PaymentRow],
    directory: &[PartyContact],
    key: MatchKey,
) -> Vec<MissingContact> {
    let directory_by_key: BTreeMap<&str, &PartyContact> = directory
        .iter()
        .map(|c| (contact_key(c, key), c))
        .collect();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in payments {
        let k = payment_key(row, key);
        if k.is_empty() {
            continue;
        }
        let count = counts.entry(k).or_insert(0);
        if *count == 0 {
            order.push(k);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|k| match directory_by_key.get(k) {
            None => true,
            Some(contact) => !contact.has_real_address(),
        })
        .map(|k| MissingContact {
            key: k.to_string(),
            payment_rows: counts[k],
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
