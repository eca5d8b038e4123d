use crate::domain::DepositRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// Deposit list shared between the session binder and the views
///
/// Newest first. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct DepositStore {
    deposits: Arc<RwLock<Vec<DepositRecord>>>,
}

impl DepositStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `record` unless a record with the same id exists
    ///
    /// Returns `true` if the record was inserted.
    pub fn insert(&self, record: DepositRecord) -> bool {
        let mut deposits = self.deposits.write();
        if deposits.iter().any(|existing| existing.id == record.id) {
            return false;
        }
        deposits.insert(0, record);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.deposits.read().iter().any(|record| record.id == id)
    }

    pub fn get(&self, id: &str) -> Option<DepositRecord> {
        self.deposits.read().iter().find(|record| record.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.deposits.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.read().is_empty()
    }

    /// Copy of the list, newest first
    pub fn snapshot(&self) -> Vec<DepositRecord> {
        self.deposits.read().clone()
    }
}
