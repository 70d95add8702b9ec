//! Timestamped, hash-chained record of one proof run.
//!
//! Each event carries the SHA-256 of its predecessor's hash and its own
//! body, so a reader can tell whether `audit.jsonl` was edited, reordered,
//! or truncated at the front. Events hold counts and digests only.

use chrono::{DateTime, Utc};
use proofpack_hash::digest;
use proofpack_types::{DigestAlgorithm, ProofError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pipeline stage an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    Started,
    Scanned,
    Sealed,
    Disclosed,
    ProofBuilt,
    Emitted,
}

/// One line of `audit.jsonl`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub stage: AuditStage,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
    pub previous_hash: Option<String>,
    pub entry_hash: String,
}

/// The hashed portion of an event.
#[derive(Serialize)]
struct EventBody<'a> {
    sequence: u64,
    timestamp: &'a DateTime<Utc>,
    stage: AuditStage,
    message: &'a str,
    context: &'a BTreeMap<String, serde_json::Value>,
    previous_hash: Option<&'a str>,
}

impl AuditEvent {
    fn compute_hash(&self) -> Result<String> {
        let body = EventBody {
            sequence: self.sequence,
            timestamp: &self.timestamp,
            stage: self.stage,
            message: &self.message,
            context: &self.context,
            previous_hash: self.previous_hash.as_deref(),
        };
        let bytes = serde_json::to_vec(&body)?;
        Ok(digest(DigestAlgorithm::Sha256, &bytes).to_hex())
    }
}

/// Append-only event list for a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event stamped with the current time.
    pub fn record<I, K>(
        &mut self,
        stage: AuditStage,
        message: impl Into<String>,
        context: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        self.record_at(Utc::now(), stage, message, context)
    }

    pub fn record_at<I, K>(
        &mut self,
        timestamp: DateTime<Utc>,
        stage: AuditStage,
        message: impl Into<String>,
        context: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        let mut event = AuditEvent {
            sequence: self.events.len() as u64,
            timestamp,
            stage,
            message: message.into(),
            context: context.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            previous_hash: self.events.last().map(|e| e.entry_hash.clone()),
            entry_hash: String::new(),
        };
        event.entry_hash = event.compute_hash()?;
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn head_hash(&self) -> Option<&str> {
        self.events.last().map(|e| e.entry_hash.as_str())
    }

    /// One compact JSON object per line.
    pub fn to_jsonl(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for event in &self.events {
            serde_json::to_writer(&mut out, event)?;
            out.push(b'\n');
        }
        Ok(out)
    }

    /// Parse `audit.jsonl` and check its chain.
    pub fn from_jsonl(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ProofError::ManifestCorrupt(format!("audit trail: {e}")))?;
        let events = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str::<AuditEvent>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ProofError::ManifestCorrupt(format!("audit trail: {e}")))?;
        let trail = Self { events };
        trail.verify_chain()?;
        Ok(trail)
    }

    /// Every event must hash to its recorded value and link to the one before.
    pub fn verify_chain(&self) -> Result<()> {
        let mut previous: Option<&str> = None;
        for (index, event) in self.events.iter().enumerate() {
            if event.sequence != index as u64 {
                return Err(ProofError::ManifestCorrupt(format!(
                    "audit event {index} carries sequence {}",
                    event.sequence
                )));
            }
            if event.previous_hash.as_deref() != previous {
                return Err(ProofError::ManifestCorrupt(format!(
                    "audit event {index} does not link to its predecessor"
                )));
            }
            if event.compute_hash()? != event.entry_hash {
                return Err(ProofError::ManifestCorrupt(format!(
                    "audit event {index} was modified"
                )));
            }
            previous = Some(&event.entry_hash);
        }
        Ok(())
    }
}
