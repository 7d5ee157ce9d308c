use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration, loaded from a TOML file.
///
/// Every field has a default so a run can start with no config file at all;
/// `validate()` rejects inconsistent settings before any work happens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Which canonical field the matcher keys on. The two workbook families
    /// populate different fields reliably, so this is explicit, not a
    /// fallback chain.
    pub match_key: MatchKey,
    pub row_policy: RowPolicy,
    /// Shared secret gating directory mutations. Unset = mutations refused.
    pub admin_secret: Option<String>,
    pub store: StoreConfig,
    pub smtp: SmtpConfig,
    /// Blocking delay between successive dispatches, in seconds.
    pub throttle_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            match_key: MatchKey::PartyCode,
            row_policy: RowPolicy::CrossCheck,
            admin_secret: None,
            store: StoreConfig::default(),
            smtp: SmtpConfig::default(),
            throttle_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    PartyCode,
    PartyName,
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PartyCode => write!(f, "party_code"),
            Self::PartyName => write!(f, "party_name"),
        }
    }
}

/// Row inclusion policy for parties that pass the debit-sum gate. The two
/// source lineages disagree, so the choice is explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// A row with a debit-note reference is excluded when the referenced
    /// note's amount disagrees with the row's net amount.
    CrossCheck,
    /// Every payment row is included unconditionally.
    IncludeAll,
}

// ---------------------------------------------------------------------------
// Store + SMTP
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Party directory document.
    pub directory: String,
    /// Append-only dispatch outcome log.
    pub audit_log: String,
    /// Append-only skipped-parties log.
    pub skip_log: String,
    /// Append-only row-mismatch log.
    pub mismatch_log: String,
    /// Optional SQLite dedup store. Unset = dedup disabled.
    pub dedup_db: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: "party_emails.json".into(),
            audit_log: "FinalEmailLog.txt".into(),
            skip_log: "SkippedPartiesLog.txt".into(),
            mismatch_log: "MismatchLog.txt".into(),
            dedup_db: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 465,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        // Observed safe throttle range against transport rate limiting
        if self.throttle_secs < 1 || self.throttle_secs > 5 {
            return Err(ReconError::ConfigValidation(format!(
                "throttle_secs must be between 1 and 5, got {}",
                self.throttle_secs
            )));
        }

        if self.store.directory.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "store.directory must not be empty".into(),
            ));
        }

        if self.smtp.host.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "smtp.host must not be empty".into(),
            ));
        }
        if self.smtp.port == 0 {
            return Err(ReconError::ConfigValidation("smtp.port must not be 0".into()));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
