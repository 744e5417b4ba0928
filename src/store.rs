use rand::Rng;
use rust_decimal::Decimal;
use tracing::warn;

use crate::db::storage::Storage;
use crate::errors::StoreError;
use crate::models::transaction::Transaction;

/// The single durable slot holding the serialized transaction list.
pub const SLOT_KEY: &str = "transactions";

const ID_SPACE: u32 = 1_000_000;

/// Owns the ordered in-memory transaction list and the storage handle.
/// The slot is rewritten in full immediately after every mutation, so
/// memory and storage never disagree between events.
pub struct TransactionStore<S: Storage> {
    transactions: Vec<Transaction>,
    storage: S,
}

impl<S: Storage> TransactionStore<S> {
    /// Reads the slot and rebuilds the list. An absent slot means a fresh
    /// install and yields an empty list. Unreadable content is recovered
    /// record by record: whatever parses is kept, the rest is logged and
    /// skipped.
    pub fn load(storage: S) -> Result<Self, StoreError> {
        let transactions = match storage.get(SLOT_KEY)? {
            Some(raw) => parse_slot(&raw),
            None => Vec::new(),
        };
        Ok(Self {
            transactions,
            storage,
        })
    }

    /// Validates, appends, persists. On a validation failure the list and
    /// the slot are left untouched; on a storage failure the append is
    /// rolled back so memory stays in sync with the slot.
    pub fn add(&mut self, description: &str, amount: Decimal) -> Result<Transaction, StoreError> {
        let description = description.trim();
        if description.is_empty() || amount == Decimal::ZERO {
            return Err(StoreError::validation());
        }

        let tx = Transaction::new(self.fresh_id(), description.to_string(), amount);
        self.transactions.push(tx.clone());
        if let Err(e) = self.persist() {
            self.transactions.pop();
            return Err(e);
        }
        Ok(tx)
    }

    /// Removes every transaction with the given id, preserving the order
    /// of the rest, then persists. An unknown id is a no-op delete.
    pub fn remove(&mut self, id: u32) -> Result<(), StoreError> {
        self.transactions.retain(|tx| tx.id != id);
        self.persist()
    }

    pub fn all(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Exact sum of all amounts. Rounding happens at display time only.
    pub fn balance(&self) -> Decimal {
        self.transactions.iter().map(|tx| tx.amount).sum()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.transactions)?;
        self.storage.set(SLOT_KEY, &raw)
    }

    // Ids stay in [0, 1_000_000) for compatibility with previously
    // persisted lists, but are re-drawn on collision so uniqueness holds.
    fn fresh_id(&self) -> u32 {
        let mut rng = rand::thread_rng();
        loop {
            let id = rng.gen_range(0..ID_SPACE);
            if !self.transactions.iter().any(|tx| tx.id == id) {
                return id;
            }
        }
    }

    #[cfg(test)]
    pub fn slot_raw(&self) -> Option<String> {
        self.storage.get(SLOT_KEY).expect("storage read failed")
    }

    #[cfg(test)]
    pub fn into_storage(self) -> S {
        self.storage
    }
}

fn parse_slot(raw: &str) -> Vec<Transaction> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            warn!("persisted transaction list is unreadable, starting empty: {e}");
            return Vec::new();
        }
    };

    let mut transactions = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<Transaction>(value) {
            Ok(tx) => transactions.push(tx),
            Err(e) => warn!("skipping unreadable transaction record: {e}"),
        }
    }
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_connection;
    use crate::db::storage::{MemoryStorage, SqliteStorage};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn empty_store() -> TransactionStore<MemoryStorage> {
        TransactionStore::load(MemoryStorage::new()).unwrap()
    }

    #[test]
    fn test_absent_slot_loads_empty() {
        let store = empty_store();

        assert!(store.all().is_empty());
        assert_eq!(store.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_add_rejects_empty_description() {
        let mut store = empty_store();

        let result = store.add("", dec("100"));

        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.all().is_empty());
        assert!(store.slot_raw().is_none());
    }

    #[test]
    fn test_add_rejects_whitespace_description() {
        let mut store = empty_store();

        let result = store.add("   ", dec("100"));

        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_add_rejects_zero_amount() {
        let mut store = empty_store();

        let result = store.add("coffee", Decimal::ZERO);

        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.all().is_empty());
        assert!(store.slot_raw().is_none());
    }

    #[test]
    fn test_validation_error_message() {
        let err = empty_store().add("", dec("1")).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Please provide a valid description and amount"
        );
    }

    #[test]
    fn test_add_appends_and_persists_in_order() {
        let mut store = empty_store();

        store.add("salary", dec("5000")).unwrap();
        store.add("rent", dec("-1200")).unwrap();

        assert_eq!(store.balance(), dec("3800"));
        assert_eq!(store.all()[0].description, "salary");
        assert_eq!(store.all()[1].description, "rent");

        let persisted: Vec<Transaction> =
            serde_json::from_str(&store.slot_raw().unwrap()).unwrap();
        assert_eq!(persisted.as_slice(), store.all());
    }

    #[test]
    fn test_add_trims_description() {
        let mut store = empty_store();

        let tx = store.add("  salary  ", dec("5000")).unwrap();

        assert_eq!(tx.description, "salary");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = empty_store();
        let tx = store.add("a", dec("10")).unwrap();

        store.remove(tx.id).unwrap();
        assert!(store.all().is_empty());
        assert_eq!(store.slot_raw().as_deref(), Some("[]"));

        store.remove(tx.id).unwrap();
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_remove_preserves_order_of_survivors() {
        let mut store = empty_store();
        store.add("a", dec("1")).unwrap();
        let middle = store.add("b", dec("2")).unwrap();
        store.add("c", dec("3")).unwrap();

        store.remove(middle.id).unwrap();

        let descriptions: Vec<&str> = store
            .all()
            .iter()
            .map(|tx| tx.description.as_str())
            .collect();
        assert_eq!(descriptions, ["a", "c"]);
    }

    #[test]
    fn test_round_trip_reload() {
        let mut store = empty_store();
        store.add("salary", dec("5000")).unwrap();
        store.add("rent", dec("-1200")).unwrap();
        store.add("snack", dec("10.4")).unwrap();
        let before = store.all().to_vec();

        let reloaded = TransactionStore::load(store.into_storage()).unwrap();

        assert_eq!(reloaded.all(), before.as_slice());
    }

    #[test]
    fn test_round_trip_on_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.db");
        let path = path.to_str().unwrap();

        {
            let storage = SqliteStorage::new(establish_connection(path).unwrap());
            let mut store = TransactionStore::load(storage).unwrap();
            store.add("salary", dec("5000")).unwrap();
            store.add("rent", dec("-1200")).unwrap();
        }

        let storage = SqliteStorage::new(establish_connection(path).unwrap());
        let store = TransactionStore::load(storage).unwrap();

        assert_eq!(store.all().len(), 2);
        assert_eq!(store.all()[0].description, "salary");
        assert_eq!(store.all()[1].amount, dec("-1200"));
        assert_eq!(store.balance(), dec("3800"));
    }

    #[test]
    fn test_balance_is_exact_on_fractions() {
        let mut store = empty_store();
        store.add("a", dec("10.4")).unwrap();
        store.add("b", dec("-0.4")).unwrap();

        assert_eq!(store.balance(), dec("10"));
    }

    #[test]
    fn test_malformed_slot_loads_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(SLOT_KEY, "not json").unwrap();

        let store = TransactionStore::load(storage).unwrap();

        assert!(store.all().is_empty());
    }

    #[test]
    fn test_corrupted_record_is_skipped() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                SLOT_KEY,
                r#"[{"id":1,"description":"ok","amount":5.0},{"id":"bad"},{"id":2,"description":"also ok","amount":-2.0}]"#,
            )
            .unwrap();

        let store = TransactionStore::load(storage).unwrap();

        let descriptions: Vec<&str> = store
            .all()
            .iter()
            .map(|tx| tx.description.as_str())
            .collect();
        assert_eq!(descriptions, ["ok", "also ok"]);
    }

    #[test]
    fn test_ids_are_unique_and_in_range() {
        let mut store = empty_store();
        for i in 0..50 {
            store.add(&format!("tx {i}"), dec("1")).unwrap();
        }

        let mut ids: Vec<u32> = store.all().iter().map(|tx| tx.id).collect();
        assert!(ids.iter().all(|&id| id < ID_SPACE));

        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
