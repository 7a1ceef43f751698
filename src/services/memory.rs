use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::services::store::{Filter, Store, StoreError, Table};

/// In-process store used for demo mode and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `rows` in `table`
    pub fn with_rows(table: Table, rows: Vec<Value>) -> Result<Self, StoreError> {
        for row in &rows {
            table.check_row(row)?;
        }

        let mut tables = HashMap::new();
        tables.insert(table, rows);

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Number of rows currently held in `table`
    pub async fn len(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }

    fn check_filters(table: Table, filters: &[Filter]) -> Result<(), StoreError> {
        filters
            .iter()
            .try_for_each(|filter| table.check_column(&filter.column))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        Self::check_filters(table, filters)?;

        let tables = self.tables.read().await;
        let rows = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| filters.iter().all(|f| f.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<(), StoreError> {
        table.check_row(&row)?;
        self.tables.write().await.entry(table).or_default().push(row);
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, conflict_keys: &[&str]) -> Result<(), StoreError> {
        table.check_row(&row)?;
        for key in conflict_keys {
            table.check_column(key)?;
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        let position = rows
            .iter()
            .position(|candidate| conflict_keys.iter().all(|key| candidate.get(*key) == row.get(*key)));

        match position {
            Some(index) => match (&mut rows[index], row) {
                (Value::Object(current), Value::Object(incoming)) => current.extend(incoming),
                (slot, row) => *slot = row,
            },
            None => rows.push(row),
        }

        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<(), StoreError> {
        Self::check_filters(table, filters)?;

        if let Some(rows) = self.tables.write().await.get_mut(&table) {
            rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_key() {
        let store = MemoryStore::new();
        let keys = ["user_id", "liked_profile_id"];

        store
            .upsert(Table::Likes, json!({"user_id": "a", "liked_profile_id": "b", "status": "pending"}), &keys)
            .await
            .unwrap();
        store
            .upsert(Table::Likes, json!({"user_id": "a", "liked_profile_id": "b", "status": "accepted"}), &keys)
            .await
            .unwrap();

        let rows = store.select(Table::Likes, &[Filter::eq("user_id", "a")]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "accepted");
    }

    #[tokio::test]
    async fn test_delete_with_filters() {
        let store = MemoryStore::new();
        store.insert(Table::Likes, json!({"user_id": "a", "liked_profile_id": "b"})).await.unwrap();
        store.insert(Table::Likes, json!({"user_id": "a", "liked_profile_id": "c"})).await.unwrap();

        store
            .delete(Table::Likes, &[Filter::eq("user_id", "a"), Filter::eq("liked_profile_id", "b")])
            .await
            .unwrap();

        assert_eq!(store.len(Table::Likes).await, 1);
    }

    #[tokio::test]
    async fn test_rejects_unknown_columns() {
        let store = MemoryStore::new();
        let result = store.select(Table::Profiles, &[Filter::eq("secret", "x")]).await;
        assert!(matches!(result, Err(StoreError::UnknownColumn { .. })));
    }
}
