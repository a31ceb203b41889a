//! Record of transactions submitted from this wallet.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lifecycle of a transaction as seen by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionStatus {
    /// Nothing submitted yet
    #[default]
    None,
    /// Accepted by the node, waiting for a block
    Pending,
    /// Included and executed successfully
    Success,
    /// Included but failed, or dropped by the network
    Failure,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Failure)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::None => "none",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Success => "success",
            TransactionStatus::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub hash: String,
    /// Shown while the transaction is pending, e.g. "Sending sICX..."
    pub pending: String,
    /// Shown once it settled, e.g. "Sent 1.5 sICX to hx..."
    pub summary: String,
    pub status: TransactionStatus,
    pub added_time: DateTime<Utc>,
    pub confirmed_time: Option<DateTime<Utc>>,
}

impl TransactionRecord {
    pub fn new(
        hash: impl Into<String>,
        pending: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            pending: pending.into(),
            summary: summary.into(),
            status: TransactionStatus::Pending,
            added_time: Utc::now(),
            confirmed_time: None,
        }
    }

    /// Text to show for the record in its current state.
    pub fn message(&self) -> &str {
        match self.status {
            TransactionStatus::Success => &self.summary,
            TransactionStatus::Failure => "Transaction failed.",
            _ => &self.pending,
        }
    }
}

/// Shared, cloneable transaction history.
#[derive(Clone, Default)]
pub struct TransactionStore {
    records: Arc<Mutex<Vec<TransactionRecord>>>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly accepted transaction. A hash that is already known is
    /// left untouched.
    pub async fn add_transaction(&self, hash: &str, pending: &str, summary: &str) {
        let mut records = self.records.lock().await;
        if records.iter().any(|r| r.hash == hash) {
            tracing::warn!("Transaction {} already recorded", hash);
            return;
        }
        records.push(TransactionRecord::new(hash, pending, summary));
    }

    /// Move a pending transaction to a terminal status.
    ///
    /// Returns `true` only for the call that performed the transition; records
    /// that already settled are never modified again.
    pub async fn finalize(&self, hash: &str, status: TransactionStatus) -> bool {
        if !status.is_terminal() {
            return false;
        }
        let mut records = self.records.lock().await;
        match records.iter_mut().find(|r| r.hash == hash) {
            Some(record) if !record.status.is_terminal() => {
                record.status = status;
                record.confirmed_time = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub async fn status(&self, hash: &str) -> Option<TransactionStatus> {
        let records = self.records.lock().await;
        records.iter().find(|r| r.hash == hash).map(|r| r.status)
    }

    pub async fn get(&self, hash: &str) -> Option<TransactionRecord> {
        let records = self.records.lock().await;
        records.iter().find(|r| r.hash == hash).cloned()
    }

    /// All records, newest first.
    pub async fn all(&self) -> Vec<TransactionRecord> {
        let records = self.records.lock().await;
        let mut out = records.clone();
        out.sort_by(|a, b| b.added_time.cmp(&a.added_time));
        out
    }

    pub async fn clear_all(&self) {
        self.records.lock().await.clear();
    }

    pub async fn get_statistics(&self) -> TransactionStatistics {
        let records = self.records.lock().await;
        let mut stats = TransactionStatistics::default();
        for record in records.iter() {
            stats.total += 1;
            match record.status {
                TransactionStatus::Pending | TransactionStatus::None => stats.pending += 1,
                TransactionStatus::Success => stats.success += 1,
                TransactionStatus::Failure => stats.failed += 1,
            }
        }
        stats
    }

    /// Write the history as CSV (hash, status, summary, added, confirmed).
    pub async fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let records = self.all().await;
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["hash", "status", "summary", "added_time", "confirmed_time"])?;
        for r in &records {
            let confirmed = r.confirmed_time.map(|t| t.to_rfc3339()).unwrap_or_default();
            wtr.write_record([
                r.hash.as_str(),
                r.status.label(),
                r.summary.as_str(),
                r.added_time.to_rfc3339().as_str(),
                confirmed.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Counts of records by status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionStatistics {
    pub total: usize,
    pub pending: usize,
    pub success: usize,
    pub failed: usize,
}

impl TransactionStatistics {
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {} | Pending: {} | Success: {} | Failed: {}",
            self.total, self.pending, self.success, self.failed
        )
    }
}
