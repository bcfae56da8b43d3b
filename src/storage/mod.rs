//! Persistence layer.
//!
//! Keeps accepted deals in a single human-readable JSON array. Every save
//! reads the whole record, appends one deal, and rewrites it. There is no
//! locking; one process owns the file.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::types::{Deal, FlipCandidate};

/// Default deal record path.
pub const DEFAULT_DEALS_FILE: &str = "deals.json";

/// Append-only JSON record of accepted deals.
#[derive(Debug, Clone)]
pub struct DealStore {
    path: PathBuf,
}

impl DealStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored deal. A missing, empty, or unreadable record is
    /// treated as empty. Entries that do not parse as deals are skipped here
    /// but stay on disk.
    pub fn load(&self) -> Vec<Deal> {
        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load deal record");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<Deal>(entry) {
                Ok(deal) => Some(deal),
                Err(e) => {
                    warn!(path = %self.path.display(), index, error = %e, "Skipping unrecognised deal entry");
                    None
                }
            })
            .collect()
    }

    /// Append a deal bought now and held for resale. Returns the stored deal.
    ///
    /// Existing entries are carried over as raw JSON, so anything already in
    /// the record survives the rewrite whether or not it parses as a [`Deal`].
    pub fn save(&self, candidate: FlipCandidate) -> Result<Deal> {
        let mut entries = self.read_entries()?;
        let deal = Deal::holding(candidate, Utc::now());
        entries.push(serde_json::to_value(&deal).context("Failed to serialise deal")?);

        let json = serde_json::to_string_pretty(&entries).context("Failed to serialise deals")?;

        // Write a sibling file and rename it over the record so a crash
        // mid-write leaves the previous record intact.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .with_context(|| format!("Failed to write deals to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            item_id = %deal.item_id,
            total = entries.len(),
            "Deal saved"
        );
        Ok(deal)
    }

    /// Raw entries of the record. Missing, empty, and non-JSON files read as
    /// an empty record; read failures and JSON that is not an array are
    /// errors, so a save never overwrites them.
    fn read_entries(&self) -> Result<Vec<Value>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No deal record yet, starting fresh");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read deal record {}", self.path.display()))
            }
        };

        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&json) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => bail!("Deal record {} is not a JSON array", self.path.display()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Deal record is not valid JSON, starting fresh");
                Ok(Vec::new())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
