use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

use crate::services::store::{Filter, FilterOp, Store, StoreError, Table};

/// Client for a PostgREST endpoint (e.g. a hosted Supabase project)
///
/// Handles all communication with the hosted backend:
/// - Selecting profiles and like relations
/// - Upserting like relations
/// - Deleting like relations
pub struct PostgrestStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl PostgrestStore {
    /// Create a new store client
    pub fn new(base_url: String, api_key: String) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table.name())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Failed to {}: {} - {}", action, status, body);

        Err(StoreError::ApiError(format!("Failed to {}: {}", action, status)))
    }
}

/// Render filters as PostgREST query parameters, e.g. `user_id=eq.abc`
pub fn encode_filters(table: Table, filters: &[Filter]) -> Result<Vec<String>, StoreError> {
    filters
        .iter()
        .map(|filter| {
            table.check_column(&filter.column)?;

            let expression = match &filter.op {
                FilterOp::Eq(value) => format!("eq.{}", value),
                FilterOp::Neq(value) => format!("neq.{}", value),
                FilterOp::In(values) => {
                    let quoted = values
                        .iter()
                        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
                        .collect::<Vec<_>>()
                        .join(",");
                    format!("in.({})", quoted)
                }
            };

            Ok(format!("{}={}", filter.column, urlencoding::encode(&expression)))
        })
        .collect()
}

#[async_trait]
impl Store for PostgrestStore {
    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        let mut params = vec!["select=*".to_string()];
        params.extend(encode_filters(table, filters)?);

        let url = format!("{}?{}", self.table_url(table), params.join("&"));
        tracing::debug!("Selecting from {}: {}", table, url);

        let response = self.request(Method::GET, &url).send().await?;
        let response = Self::ensure_success(response, &format!("select from {}", table)).await?;

        let json: Value = response.json().await?;
        match json {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::InvalidResponse(format!(
                "Expected an array of rows from {}, got {}",
                table, other
            ))),
        }
    }

    async fn insert(&self, table: Table, row: Value) -> Result<(), StoreError> {
        table.check_row(&row)?;

        let response = self
            .request(Method::POST, &self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::ensure_success(response, &format!("insert into {}", table)).await?;

        tracing::debug!("Inserted row into {}", table);
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, conflict_keys: &[&str]) -> Result<(), StoreError> {
        table.check_row(&row)?;
        for key in conflict_keys {
            table.check_column(key)?;
        }

        let url = format!(
            "{}?on_conflict={}",
            self.table_url(table),
            urlencoding::encode(&conflict_keys.join(","))
        );

        let response = self
            .request(Method::POST, &url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::ensure_success(response, &format!("upsert into {}", table)).await?;

        tracing::debug!("Upserted row into {} (conflict on {:?})", table, conflict_keys);
        Ok(())
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> Result<(), StoreError> {
        let params = encode_filters(table, filters)?;
        let url = format!("{}?{}", self.table_url(table), params.join("&"));

        let response = self.request(Method::DELETE, &url).send().await?;
        Self::ensure_success(response, &format!("delete from {}", table)).await?;

        tracing::debug!("Deleted rows from {}", table);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!("{}/rest/v1/", self.base_url.trim_end_matches('/'));
        let response = self.request(Method::GET, &url).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_creation() {
        let store = PostgrestStore::new("https://db.test/".to_string(), "test_key".to_string()).unwrap();

        assert_eq!(store.table_url(Table::Likes), "https://db.test/rest/v1/likes");
        assert_eq!(store.api_key, "test_key");
    }

    #[test]
    fn test_encode_filters() {
        let params = encode_filters(
            Table::Likes,
            &[
                Filter::eq("user_id", "abc"),
                Filter::in_list("liked_profile_id", ["x", "y"]),
            ],
        )
        .unwrap();

        assert_eq!(params[0], "user_id=eq.abc");
        assert_eq!(params[1], format!("liked_profile_id={}", urlencoding::encode("in.(\"x\",\"y\")")));
    }

    #[test]
    fn test_encode_filters_rejects_unknown_column() {
        assert!(encode_filters(Table::Likes, &[Filter::eq("password", "x")]).is_err());
    }
}
