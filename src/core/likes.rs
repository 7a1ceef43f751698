use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Like, ProfileId};
use crate::services::store::{Filter, Store, StoreError, Table, LIKE_CONFLICT_KEYS};

/// What a like call did to the relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl LikeAction {
    fn from_liked(liked: bool) -> Self {
        if liked {
            LikeAction::Liked
        } else {
            LikeAction::Unliked
        }
    }
}

/// Like state of one target as seen by the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikeState {
    #[default]
    Unknown,
    NotLiked,
    Liked,
    /// A store call is pending. `to` is the optimistic outcome and is `None`
    /// while the existing relation is still being looked up.
    InFlight { from: Option<bool>, to: Option<bool> },
}

impl LikeState {
    fn settled(liked: bool) -> Self {
        if liked {
            LikeState::Liked
        } else {
            LikeState::NotLiked
        }
    }

    fn known(self) -> Option<bool> {
        match self {
            LikeState::Unknown => None,
            LikeState::NotLiked => Some(false),
            LikeState::Liked => Some(true),
            LikeState::InFlight { from, to } => to.or(from),
        }
    }

    /// Visible state; optimistic while in flight
    pub fn is_liked(self) -> bool {
        self.known().unwrap_or(false)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, LikeState::InFlight { .. })
    }
}

/// State of one target plus a counter bumped on every write, so a lookup
/// that raced with a like can tell its answer is stale
#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    state: LikeState,
    generation: u64,
}

impl Entry {
    fn set(&mut self, state: LikeState) {
        self.state = state;
        self.generation += 1;
    }
}

#[derive(Debug, Clone, Copy)]
enum Intent {
    Toggle,
    Like,
}

impl Intent {
    fn target(self, current: bool) -> bool {
        match self {
            Intent::Toggle => !current,
            Intent::Like => true,
        }
    }
}

/// Per-viewer like/unlike workflow with optimistic state.
///
/// At most one store mutation is in flight per target; a second request for
/// the same target is rejected instead of queued. The state map lock is never
/// held across a store call.
pub struct LikeWorkflow {
    store: Arc<dyn Store>,
    viewer: Option<Uuid>,
    states: Mutex<HashMap<ProfileId, Entry>>,
    closed: AtomicBool,
}

impl LikeWorkflow {
    pub fn new(store: Arc<dyn Store>, viewer: Option<Uuid>) -> Self {
        Self {
            store,
            viewer,
            states: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn viewer(&self) -> Result<Uuid> {
        self.viewer.ok_or(Error::Unauthenticated)
    }

    pub fn state(&self, target: &ProfileId) -> LikeState {
        self.states().get(target).map(|e| e.state).unwrap_or_default()
    }

    pub fn is_liked(&self, target: &ProfileId) -> bool {
        self.state(target).is_liked()
    }

    /// Dispose the workflow. Pending store calls still finish but no longer
    /// update state, and every later call fails with [`Error::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.states().clear();
        tracing::debug!("Like workflow closed for viewer {:?}", self.viewer);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Look up whether the viewer already likes `target`.
    ///
    /// Local-only targets and targets with a pending mutation answer from
    /// local state.
    pub async fn check_existing_like(&self, target: &ProfileId) -> Result<bool> {
        self.ensure_open()?;
        let viewer = self.viewer()?;

        let Some(target_id) = target.as_uuid() else {
            return Ok(self.is_liked(target));
        };

        let observed = {
            let states = self.states();
            let entry = states.get(target).copied().unwrap_or_default();
            if entry.state.is_in_flight() {
                return Ok(entry.state.is_liked());
            }
            entry.generation
        };

        let liked = self.fetch_existing(viewer, target_id).await?;

        if !self.is_closed() {
            let mut states = self.states();
            let entry = states.entry(target.clone()).or_default();
            // anything written since the lookup started is newer than our answer
            if entry.generation == observed {
                entry.set(LikeState::settled(liked));
            } else {
                tracing::debug!("Discarding stale like lookup for {}", target);
                return Ok(entry.state.is_liked());
            }
        }

        Ok(liked)
    }

    /// Toggle the like on `target`
    pub async fn like(&self, target: &ProfileId) -> Result<LikeAction> {
        self.transition(target, Intent::Toggle).await
    }

    /// Make sure `target` is liked; an existing like is left alone
    pub async fn ensure_liked(&self, target: &ProfileId) -> Result<LikeAction> {
        self.transition(target, Intent::Like).await
    }

    async fn transition(&self, target: &ProfileId, intent: Intent) -> Result<LikeAction> {
        self.ensure_open()?;
        let viewer = self.viewer()?;

        let Some(target_id) = target.as_uuid() else {
            return Ok(self.transition_local(target, intent));
        };

        let current = match self.claim(target)? {
            Some(current) => current,
            None => {
                let existing = self.fetch_existing(viewer, target_id).await;
                self.resolve(target, existing)?
            }
        };

        let liked = intent.target(current);
        if liked == current {
            self.settle(target, LikeState::settled(current));
            return Ok(LikeAction::from_liked(liked));
        }

        self.update(target, LikeState::InFlight {
            from: Some(current),
            to: Some(liked),
        });

        let result = self.persist(viewer, target_id, liked).await;

        match result {
            Ok(()) => {
                self.settle(target, LikeState::settled(liked));
                tracing::info!("Viewer {} {:?} profile {}", viewer, LikeAction::from_liked(liked), target);
                Ok(LikeAction::from_liked(liked))
            }
            Err(e) => {
                self.settle(target, LikeState::settled(current));
                Err(e)
            }
        }
    }

    fn transition_local(&self, target: &ProfileId, intent: Intent) -> LikeAction {
        let mut states = self.states();
        let entry = states.entry(target.clone()).or_default();
        let liked = intent.target(entry.state.is_liked());
        entry.set(LikeState::settled(liked));

        tracing::debug!("Local-only profile {} is not persisted", target);
        LikeAction::from_liked(liked)
    }

    /// Mark `target` in flight. Returns the known state, or `None` when it
    /// still has to be looked up.
    fn claim(&self, target: &ProfileId) -> Result<Option<bool>> {
        let mut states = self.states();
        let entry = states.entry(target.clone()).or_default();

        if entry.state.is_in_flight() {
            tracing::debug!("Rejecting like for {}: already processing", target);
            return Err(Error::Conflict);
        }

        let known = entry.state.known();
        entry.set(LikeState::InFlight { from: known, to: None });
        Ok(known)
    }

    fn resolve(&self, target: &ProfileId, existing: Result<bool>) -> Result<bool> {
        match existing {
            Ok(liked) => {
                self.ensure_open()?;
                Ok(liked)
            }
            Err(e) => {
                self.settle(target, LikeState::Unknown);
                Err(e)
            }
        }
    }

    async fn fetch_existing(&self, viewer: Uuid, target: Uuid) -> Result<bool> {
        let rows = self
            .store
            .select(
                Table::Likes,
                &[Filter::eq("user_id", viewer), Filter::eq("liked_profile_id", target)],
            )
            .await
            .map_err(|e| store_failure("check like", e))?;

        Ok(!rows.is_empty())
    }

    async fn persist(&self, viewer: Uuid, target: Uuid, liked: bool) -> Result<()> {
        let result = if liked {
            let row = serde_json::to_value(Like::pending(viewer, target)).map_err(StoreError::from)?;
            self.store.upsert(Table::Likes, row, LIKE_CONFLICT_KEYS).await
        } else {
            self.store
                .delete(
                    Table::Likes,
                    &[Filter::eq("user_id", viewer), Filter::eq("liked_profile_id", target)],
                )
                .await
        };

        result.map_err(|e| store_failure(if liked { "like profile" } else { "unlike profile" }, e))
    }

    fn update(&self, target: &ProfileId, state: LikeState) {
        // a closed workflow keeps no state
        if self.is_closed() {
            return;
        }
        self.states().entry(target.clone()).or_default().set(state);
    }

    fn settle(&self, target: &ProfileId, state: LikeState) {
        self.update(target, state);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    fn states(&self) -> MutexGuard<'_, HashMap<ProfileId, Entry>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn store_failure(action: &str, e: StoreError) -> Error {
    tracing::error!("Failed to {}: {}", action, e);
    Error::Store(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    const TARGET: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        fail_mutations: bool,
        // selects read their rows, then park here while `hold_selects` is set
        select_gate: Option<Arc<Notify>>,
        hold_selects: AtomicBool,
        held_selects: AtomicUsize,
        // mutations park here before touching the inner store
        mutation_gate: Option<Arc<Notify>>,
        held_mutations: AtomicUsize,
    }

    impl CountingStore {
        fn failing() -> Self {
            Self {
                fail_mutations: true,
                ..Default::default()
            }
        }

        fn gated_selects(gate: Arc<Notify>) -> Self {
            Self {
                select_gate: Some(gate),
                ..Default::default()
            }
        }

        fn gated_mutations(gate: Arc<Notify>) -> Self {
            Self {
                mutation_gate: Some(gate),
                ..Default::default()
            }
        }

        async fn wait_for_mutation_gate(&self) {
            if let Some(gate) = &self.mutation_gate {
                self.held_mutations.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn mutation(&self) -> std::result::Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_mutations {
                Err(StoreError::ApiError("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Store for CountingStore {
        async fn select(&self, table: Table, filters: &[Filter]) -> std::result::Result<Vec<Value>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rows = self.inner.select(table, filters).await?;
            if let Some(gate) = &self.select_gate {
                if self.hold_selects.load(Ordering::SeqCst) {
                    self.held_selects.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                }
            }
            Ok(rows)
        }

        async fn insert(&self, table: Table, row: Value) -> std::result::Result<(), StoreError> {
            self.mutation()?;
            self.wait_for_mutation_gate().await;
            self.inner.insert(table, row).await
        }

        async fn upsert(&self, table: Table, row: Value, keys: &[&str]) -> std::result::Result<(), StoreError> {
            self.mutation()?;
            self.wait_for_mutation_gate().await;
            self.inner.upsert(table, row, keys).await
        }

        async fn delete(&self, table: Table, filters: &[Filter]) -> std::result::Result<(), StoreError> {
            self.mutation()?;
            self.wait_for_mutation_gate().await;
            self.inner.delete(table, filters).await
        }
    }

    fn target() -> ProfileId {
        ProfileId::parse(TARGET).unwrap()
    }

    fn workflow(store: Arc<CountingStore>) -> LikeWorkflow {
        LikeWorkflow::new(store, Some(Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let store = Arc::new(CountingStore::default());
        let likes = workflow(Arc::clone(&store));

        assert!(!likes.check_existing_like(&target()).await.unwrap());
        assert_eq!(likes.like(&target()).await.unwrap(), LikeAction::Liked);
        assert!(likes.is_liked(&target()));
        assert_eq!(store.inner.len(Table::Likes).await, 1);

        assert_eq!(likes.like(&target()).await.unwrap(), LikeAction::Unliked);
        assert_eq!(likes.state(&target()), LikeState::NotLiked);
        assert_eq!(store.inner.len(Table::Likes).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_state_is_resolved_before_toggling() {
        let store = Arc::new(CountingStore::default());
        let viewer = Uuid::new_v4();
        store
            .inner
            .insert(
                Table::Likes,
                serde_json::to_value(Like::pending(viewer, target().as_uuid().unwrap())).unwrap(),
            )
            .await
            .unwrap();

        let likes = LikeWorkflow::new(store.clone(), Some(viewer));
        assert_eq!(likes.like(&target()).await.unwrap(), LikeAction::Unliked);
        assert_eq!(store.inner.len(Table::Likes).await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back() {
        let store = Arc::new(CountingStore::failing());
        let likes = workflow(Arc::clone(&store));

        likes.check_existing_like(&target()).await.unwrap();
        let err = likes.like(&target()).await.unwrap_err();

        assert!(matches!(err, Error::Store(_)));
        assert_eq!(err.to_string(), "failed to process action");
        assert_eq!(likes.state(&target()), LikeState::NotLiked);
    }

    #[tokio::test]
    async fn test_ensure_liked_skips_existing_like() {
        let store = Arc::new(CountingStore::default());
        let likes = workflow(Arc::clone(&store));

        likes.ensure_liked(&target()).await.unwrap();
        let calls = store.calls();
        assert_eq!(likes.ensure_liked(&target()).await.unwrap(), LikeAction::Liked);
        assert_eq!(store.calls(), calls);
        assert!(likes.is_liked(&target()));
    }

    #[tokio::test]
    async fn test_local_only_targets_never_reach_store() {
        let store = Arc::new(CountingStore::default());
        let likes = workflow(Arc::clone(&store));
        let sample = ProfileId::parse("3").unwrap();

        assert!(!likes.check_existing_like(&sample).await.unwrap());
        assert_eq!(likes.like(&sample).await.unwrap(), LikeAction::Liked);
        assert!(likes.check_existing_like(&sample).await.unwrap());
        assert_eq!(likes.like(&sample).await.unwrap(), LikeAction::Unliked);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_requires_viewer() {
        let store = Arc::new(CountingStore::default());
        let likes = LikeWorkflow::new(store.clone(), None);

        assert!(matches!(likes.like(&target()).await, Err(Error::Unauthenticated)));
        assert!(matches!(likes.check_existing_like(&target()).await, Err(Error::Unauthenticated)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_closed_workflow_rejects_calls() {
        let store = Arc::new(CountingStore::default());
        let likes = workflow(Arc::clone(&store));

        likes.close();
        assert!(likes.is_closed());
        assert!(matches!(likes.like(&target()).await, Err(Error::Closed)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_started_before_like_does_not_overwrite_it() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(CountingStore::gated_selects(Arc::clone(&gate)));
        let likes = Arc::new(workflow(Arc::clone(&store)));

        assert!(!likes.check_existing_like(&target()).await.unwrap());

        // second lookup reads "no rows" and is parked before applying it
        store.hold_selects.store(true, Ordering::SeqCst);
        let lookup = {
            let likes = Arc::clone(&likes);
            tokio::spawn(async move { likes.check_existing_like(&target()).await })
        };
        while store.held_selects.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        store.hold_selects.store(false, Ordering::SeqCst);

        assert_eq!(likes.like(&target()).await.unwrap(), LikeAction::Liked);

        gate.notify_one();
        assert!(lookup.await.unwrap().unwrap());

        assert!(likes.is_liked(&target()));
        assert_eq!(likes.state(&target()), LikeState::Liked);
        assert_eq!(likes.like(&target()).await.unwrap(), LikeAction::Unliked);
        assert_eq!(store.inner.len(Table::Likes).await, 0);
    }

    #[tokio::test]
    async fn test_completion_after_close_is_ignored() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(CountingStore::gated_mutations(Arc::clone(&gate)));
        let likes = Arc::new(workflow(Arc::clone(&store)));

        let pending = {
            let likes = Arc::clone(&likes);
            tokio::spawn(async move { likes.like(&target()).await })
        };
        while store.held_mutations.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(likes.state(&target()).is_in_flight());

        likes.close();
        gate.notify_one();

        // the store call itself still completes
        assert_eq!(pending.await.unwrap().unwrap(), LikeAction::Liked);
        assert_eq!(store.inner.len(Table::Likes).await, 1);

        assert_eq!(likes.state(&target()), LikeState::Unknown);
        assert!(!likes.is_liked(&target()));
        assert!(matches!(likes.like(&target()).await, Err(Error::Closed)));
        assert!(matches!(likes.check_existing_like(&target()).await, Err(Error::Closed)));
    }

    #[test]
    fn test_in_flight_state_is_optimistic() {
        let state = LikeState::InFlight {
            from: Some(false),
            to: Some(true),
        };
        assert!(state.is_liked());
        assert!(state.is_in_flight());
        assert!(!LikeState::Unknown.is_liked());
    }
}
