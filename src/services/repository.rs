use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Gender, Like, Profile, ProfileId, ProfileRow};
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::store::{text_value, Filter, Store, StoreError, Table};

/// Typed access to profiles and like relations on top of a [`Store`]
///
/// This is where raw rows become [`Profile`]s, so identifier shape is
/// decided here once and never re-derived downstream.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn Store>,
    cache: Option<Arc<CacheManager>>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn Store>, cache: Option<Arc<CacheManager>>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// Fetch the candidates a viewer of `viewer_gender` may be shown.
    ///
    /// The gender complement is pushed down to the store; an unknown viewer
    /// gender returns nothing without a store call.
    pub async fn candidates_for(&self, viewer_gender: Option<Gender>) -> Result<Vec<Profile>, StoreError> {
        let Some(viewer_gender) = viewer_gender else {
            return Ok(Vec::new());
        };
        let wanted = viewer_gender.opposite();
        let key = CacheKey::candidates(wanted);

        if let Some(cache) = &self.cache {
            match cache.get::<Vec<Value>>(&key).await {
                Ok(rows) => return Ok(ingest(rows)),
                Err(e) => tracing::trace!("Candidate cache lookup failed: {}", e),
            }
        }

        let rows = self
            .store
            .select(Table::Profiles, &[Filter::eq("gender", wanted.as_str())])
            .await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &rows).await {
                tracing::warn!("Failed to cache candidates: {}", e);
            }
        }

        tracing::debug!("Fetched {} {} candidates", rows.len(), wanted.as_str());
        Ok(ingest(rows))
    }

    /// Get a single profile; local-only ids are never stored
    pub async fn profile(&self, id: &ProfileId) -> Result<Option<Profile>, StoreError> {
        if !id.is_persisted() {
            return Ok(None);
        }

        let rows = self
            .store
            .select(Table::Profiles, &[Filter::eq("id", id)])
            .await?;

        Ok(ingest(rows).into_iter().next())
    }

    /// Profiles the viewer has liked
    pub async fn liked_profiles(&self, viewer: Uuid) -> Result<Vec<Profile>, StoreError> {
        let likes = self
            .store
            .select(Table::Likes, &[Filter::eq("user_id", viewer)])
            .await?;

        self.profiles_by_ids(column_values(&likes, "liked_profile_id")).await
    }

    /// Profiles that have liked the viewer
    pub async fn admirers(&self, viewer: Uuid) -> Result<Vec<Profile>, StoreError> {
        let likes = self
            .store
            .select(Table::Likes, &[Filter::eq("liked_profile_id", viewer)])
            .await?;

        self.profiles_by_ids(column_values(&likes, "user_id")).await
    }

    /// Like rows pointing at the viewer; malformed rows are skipped
    pub async fn incoming_likes(&self, viewer: Uuid) -> Result<Vec<Like>, StoreError> {
        let rows = self
            .store
            .select(Table::Likes, &[Filter::eq("liked_profile_id", viewer)])
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Like>(row) {
                Ok(like) => Some(like),
                Err(e) => {
                    tracing::warn!("Skipping malformed like row: {}", e);
                    None
                }
            })
            .collect())
    }

    pub(crate) async fn profiles_by_ids(&self, ids: Vec<String>) -> Result<Vec<Profile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .store
            .select(Table::Profiles, &[Filter::in_list("id", ids)])
            .await?;

        Ok(ingest(rows))
    }
}

fn column_values(rows: &[Value], column: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(column).and_then(text_value))
        .collect()
}

/// Convert raw profile rows, skipping rows that do not parse or carry an
/// invalid id
pub fn ingest(rows: Vec<Value>) -> Vec<Profile> {
    let today = Utc::now().date_naive();

    rows.into_iter()
        .filter_map(|row| {
            let row: ProfileRow = match serde_json::from_value(row) {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping malformed profile row: {}", e);
                    return None;
                }
            };

            match row.into_profile(today) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Skipping profile row: {}", e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;
    use serde_json::json;

    const VIEWER: &str = "11111111-1111-4111-8111-111111111111";
    const MEERA: &str = "22222222-2222-4222-8222-222222222222";
    const KAVYA: &str = "33333333-3333-4333-8333-333333333333";

    fn repository() -> ProfileRepository {
        let store = MemoryStore::with_rows(
            Table::Profiles,
            vec![
                json!({"id": VIEWER, "first_name": "Ravi", "gender": "male"}),
                json!({"id": MEERA, "first_name": "Meera", "gender": "female", "date_of_birth": "1995-02-01"}),
                json!({"id": KAVYA, "first_name": "Kavya", "gender": "Female"}),
                json!({"id": "bogus-id", "first_name": "Broken", "gender": "female"}),
            ],
        )
        .unwrap();

        ProfileRepository::new(Arc::new(store), Some(Arc::new(CacheManager::in_memory(10, 60))))
    }

    #[tokio::test]
    async fn test_candidates_skip_invalid_ids() {
        let repo = repository();
        let candidates = repo.candidates_for(Some(Gender::Male)).await.unwrap();

        // "Female" with a capital letter is not an exact store match
        let names: Vec<&str> = candidates.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Meera"]);
    }

    #[tokio::test]
    async fn test_candidates_without_viewer_gender() {
        let repo = repository();
        assert!(repo.candidates_for(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_liked_profiles_and_admirers() {
        let repo = repository();
        let store = repo.store();
        store
            .insert(Table::Likes, json!({"user_id": VIEWER, "liked_profile_id": MEERA, "status": "pending"}))
            .await
            .unwrap();
        store
            .insert(Table::Likes, json!({"user_id": KAVYA, "liked_profile_id": VIEWER, "status": "pending"}))
            .await
            .unwrap();

        let viewer = Uuid::parse_str(VIEWER).unwrap();

        let liked = repo.liked_profiles(viewer).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].name, "Meera");

        let admirers = repo.admirers(viewer).await.unwrap();
        assert_eq!(admirers.len(), 1);
        assert_eq!(admirers[0].name, "Kavya");
    }

    #[tokio::test]
    async fn test_incoming_likes_skip_malformed_rows() {
        let repo = repository();
        let store = repo.store();
        let viewer = Uuid::parse_str(VIEWER).unwrap();
        let kavya = Uuid::parse_str(KAVYA).unwrap();

        store
            .insert(Table::Likes, serde_json::to_value(Like::pending(kavya, viewer)).unwrap())
            .await
            .unwrap();
        store
            .insert(Table::Likes, json!({"user_id": MEERA, "liked_profile_id": VIEWER}))
            .await
            .unwrap();

        let likes = repo.incoming_likes(viewer).await.unwrap();
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].user_id, kavya);
    }

    #[tokio::test]
    async fn test_local_profile_lookup_skips_store() {
        let repo = repository();
        let profile = repo.profile(&ProfileId::parse("5").unwrap()).await.unwrap();
        assert!(profile.is_none());
    }
}
