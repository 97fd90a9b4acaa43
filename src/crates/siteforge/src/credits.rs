//! Credit ledger for managing per-submitter revision credits
//!
//! Credits are advisory: delivery proceeds whether or not a deduction
//! succeeds. Each operation is a single get followed by a single set, so two
//! concurrent revisions from the same submitter can both read the same
//! balance and one deduction is lost. There is no compare-and-swap on the
//! store boundary to prevent this.

use crate::error::SiteforgeError;
use crate::store::StateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_INITIAL_CREDITS: u32 = 3;
pub const DEFAULT_PLAN: &str = "starter";

#[derive(Debug, Error)]
pub enum CreditError {
    #[error("No credits remaining for {identity} ({used}/{total} used)")]
    Exhausted { identity: String, used: u32, total: u32 },

    #[error(transparent)]
    Store(#[from] SiteforgeError),
}

/// Per-submitter ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub identity: String,
    pub total: u32,
    pub used: u32,
    pub plan: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditRecord {
    pub fn new(identity: impl Into<String>, total: u32, plan: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            identity: identity.into(),
            total,
            used: 0,
            plan: plan.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

/// Grant given to a submitter the first time they are seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditPolicy {
    pub initial_credits: u32,
    pub plan: String,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            initial_credits: DEFAULT_INITIAL_CREDITS,
            plan: DEFAULT_PLAN.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CreditLedger {
    store: StateStore,
    policy: CreditPolicy,
}

impl CreditLedger {
    pub fn new(store: StateStore, policy: CreditPolicy) -> Self {
        Self { store, policy }
    }

    /// Load the record, creating it with the initial grant if absent
    pub async fn get_or_create(&self, identity: &str) -> Result<CreditRecord, CreditError> {
        if let Some(record) = self.store.load_credits(identity).await? {
            return Ok(record);
        }

        let record = CreditRecord::new(identity, self.policy.initial_credits, self.policy.plan.clone());
        self.store.save_credits(&record).await?;
        info!(identity = %identity, total = record.total, plan = %record.plan, "Created credit record");
        Ok(record)
    }

    /// Use one credit and return the updated record
    pub async fn deduct(&self, identity: &str) -> Result<CreditRecord, CreditError> {
        let mut record = self.get_or_create(identity).await?;

        if record.is_exhausted() {
            return Err(CreditError::Exhausted {
                identity: identity.to_string(),
                used: record.used,
                total: record.total,
            });
        }

        record.used += 1;
        record.updated_at = Utc::now();
        self.store.save_credits(&record).await?;
        debug!(identity = %identity, remaining = record.remaining(), "Deducted credit");
        Ok(record)
    }

    /// Remaining credits without creating a record; unknown submitters
    /// report the initial grant.
    pub async fn remaining(&self, identity: &str) -> Result<u32, CreditError> {
        Ok(self
            .store
            .load_credits(identity)
            .await?
            .map(|r| r.remaining())
            .unwrap_or(self.policy.initial_credits))
    }
}
