use chrono::Utc;
use hisab_core::form::validate_draft;
use hisab_core::{Totals, TotalsOverflow, Transaction, TransactionDraft, TransactionId};
use std::collections::HashSet;
use thiserror::Error;

use crate::kv::{KeyValueStore, KvError};

/// Key the full transaction list is stored under.
pub const STORAGE_KEY: &str = "billing-transactions";

/// Number of transactions shown on the dashboard list.
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),
    #[error("Failed to persist transactions: {0}")]
    Persistence(#[from] KvError),
    #[error("Failed to serialize transactions: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Why some or all stored transactions were not loaded. The store still
/// opens, with whatever records survived.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read stored transactions, starting with none: {0}")]
    Read(#[from] KvError),
    #[error("Stored transactions are corrupt, starting with none: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Ignored {0} stored transactions that were invalid or had duplicate ids")]
    Dropped(usize),
}

/// Owns the canonical, newest-first transaction list and mirrors it to a
/// key-value backend after every mutation.
pub struct TransactionStore<S: KeyValueStore> {
    backend: S,
    transactions: Vec<Transaction>,
    load_warning: Option<LoadError>,
}

impl<S: KeyValueStore> TransactionStore<S> {
    /// Hydrates from the backend. Unreadable or corrupt data is logged and
    /// replaced by an empty list; it is only overwritten on the next mutation.
    pub fn open(backend: S) -> Self {
        let (transactions, load_warning) = match load(&backend) {
            Ok(transactions) => (transactions, None),
            Err(e) => {
                tracing::warn!("Starting with no transactions: {e}");
                (Vec::new(), Some(e))
            }
        };

        let mut store = TransactionStore {
            backend,
            transactions,
            load_warning,
        };
        let dropped = store.drop_invalid() + store.drop_duplicate_ids();
        if dropped > 0 && store.load_warning.is_none() {
            store.load_warning = Some(LoadError::Dropped(dropped));
        }
        tracing::info!("Loaded {} transactions", store.transactions.len());
        store
    }

    pub fn load_warning(&self) -> Option<&LoadError> {
        self.load_warning.as_ref()
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn list(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn recent(&self, limit: usize) -> &[Transaction] {
        &self.transactions[..limit.min(self.transactions.len())]
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn totals(&self) -> Result<Totals, TotalsOverflow> {
        Totals::of(&self.transactions)
    }

    pub fn add(&mut self, draft: TransactionDraft) -> Result<Transaction, StoreError> {
        let mut id = TransactionId::generate();
        while self.get(&id).is_some() {
            id = TransactionId::generate();
        }
        let tx = Transaction::new(id, draft, Utc::now());

        self.transactions.insert(0, tx.clone());
        if let Err(e) = self.persist() {
            self.transactions.remove(0);
            return Err(e);
        }

        tracing::info!("Added {} transaction {} ({})", tx.kind, tx.id, tx.amount);
        Ok(tx)
    }

    /// Replaces every field except `id` and `created_at`.
    pub fn update(
        &mut self,
        id: &TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, StoreError> {
        let idx = self.position(id)?;

        let previous = self.transactions[idx].clone();
        self.transactions[idx].replace_with(draft);
        if let Err(e) = self.persist() {
            self.transactions[idx] = previous;
            return Err(e);
        }

        tracing::info!("Updated transaction {id}");
        Ok(self.transactions[idx].clone())
    }

    /// Removes the transaction and returns it.
    pub fn delete(&mut self, id: &TransactionId) -> Result<Transaction, StoreError> {
        let idx = self.position(id)?;

        let removed = self.transactions.remove(idx);
        if let Err(e) = self.persist() {
            self.transactions.insert(idx, removed);
            return Err(e);
        }

        tracing::info!("Deleted transaction {id}");
        Ok(removed)
    }

    fn position(&self, id: &TransactionId) -> Result<usize, StoreError> {
        self.transactions
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.transactions)?;
        self.backend.set(STORAGE_KEY, &json)?;
        tracing::debug!("Persisted {} transactions", self.transactions.len());
        Ok(())
    }

    /// Trims sources and drops records a form would have rejected.
    fn drop_invalid(&mut self) -> usize {
        let before = self.transactions.len();
        self.transactions.retain_mut(|t| {
            t.source = t.source.trim().to_string();
            let errors = validate_draft(&t.to_draft());
            if !errors.is_empty() {
                tracing::debug!("Dropping stored transaction {}: {errors:?}", t.id);
            }
            errors.is_empty()
        });
        let dropped = before - self.transactions.len();
        if dropped > 0 {
            tracing::warn!("Ignored {dropped} invalid stored transactions");
        }
        dropped
    }

    fn drop_duplicate_ids(&mut self) -> usize {
        let before = self.transactions.len();
        let mut seen = HashSet::new();
        self.transactions.retain(|t| seen.insert(t.id.clone()));
        let dropped = before - self.transactions.len();
        if dropped > 0 {
            tracing::warn!("Ignored {dropped} stored transactions with duplicate ids");
        }
        dropped
    }
}

fn load<S: KeyValueStore>(backend: &S) -> Result<Vec<Transaction>, LoadError> {
    match backend.get(STORAGE_KEY)? {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
        _ => Ok(Vec::new()),
    }
}
