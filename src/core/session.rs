use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::filters::apply_all_filters;
use crate::core::likes::LikeWorkflow;
use crate::error::{Error, Result};
use crate::models::{Gender, LikeQuota, Preferences, Profile, SwipeDirection};

/// Result of a swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeOutcome {
    /// Moved to the next candidate
    Advanced,
    /// No candidate left to show
    Exhausted,
    /// Offline; nothing changed
    Ignored,
}

/// One viewer's pass through the filtered candidate list.
///
/// Pure state: no store access happens here. [`Discovery`] pairs a session
/// with a [`LikeWorkflow`] for right-swipes.
#[derive(Debug, Clone)]
pub struct DiscoverySession {
    source: Vec<Profile>,
    candidates: Vec<Profile>,
    viewer_gender: Option<Gender>,
    preferences: Option<Preferences>,
    index: usize,
    direction: Option<SwipeDirection>,
    quota: LikeQuota,
    offline: bool,
}

impl DiscoverySession {
    pub fn new(
        profiles: Vec<Profile>,
        viewer_gender: Option<Gender>,
        preferences: Option<Preferences>,
        quota: LikeQuota,
    ) -> Self {
        let candidates = apply_all_filters(profiles.clone(), viewer_gender, preferences.as_ref());

        tracing::debug!(
            "Discovery session: {} of {} profiles eligible",
            candidates.len(),
            profiles.len()
        );

        Self {
            source: profiles,
            candidates,
            viewer_gender,
            preferences,
            index: 0,
            direction: None,
            quota,
            offline: false,
        }
    }

    /// Swap in a fresh candidate list and rewind. The quota is kept, so
    /// reloading the list never hands out extra likes.
    pub fn replace_profiles(
        &mut self,
        profiles: Vec<Profile>,
        viewer_gender: Option<Gender>,
        preferences: Option<Preferences>,
    ) {
        self.candidates = apply_all_filters(profiles.clone(), viewer_gender, preferences.as_ref());
        self.source = profiles;
        self.viewer_gender = viewer_gender;
        self.preferences = preferences;
        self.restart();
    }

    /// Re-run the filters with new preferences and rewind
    pub fn set_preferences(&mut self, preferences: Option<Preferences>) {
        self.candidates = apply_all_filters(self.source.clone(), self.viewer_gender, preferences.as_ref());
        self.preferences = preferences;
        self.restart();
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.preferences.as_ref()
    }

    pub fn candidates(&self) -> &[Profile] {
        &self.candidates
    }

    pub fn current(&self) -> Option<&Profile> {
        self.candidates.get(self.index)
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }

    /// Direction of the last recorded swipe
    pub fn direction(&self) -> Option<SwipeDirection> {
        self.direction
    }

    pub fn quota(&self) -> LikeQuota {
        self.quota
    }

    /// Reset the remaining like counter; premium viewers stay unlimited
    pub fn set_remaining_likes(&mut self, remaining: i64) {
        if let LikeQuota::Limited(_) = self.quota {
            self.quota = LikeQuota::Limited(remaining);
        }
    }

    /// Replace the quota outright, e.g. when the viewer's plan changes
    pub fn set_quota(&mut self, quota: LikeQuota) {
        self.quota = quota;
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Loop back to the first candidate
    pub fn restart(&mut self) {
        self.index = 0;
        self.direction = None;
    }

    /// Fails when a right-swipe is not allowed by the quota
    pub fn check_quota(&self, direction: SwipeDirection) -> Result<()> {
        if direction == SwipeDirection::Right && !self.quota.allows_like() {
            return Err(Error::QuotaExhausted);
        }
        Ok(())
    }

    /// Record a swipe on the current candidate and move on.
    ///
    /// A right-swipe uses one like from a limited quota.
    pub fn advance(&mut self, direction: SwipeDirection) -> Result<SwipeOutcome> {
        if self.offline {
            return Ok(SwipeOutcome::Ignored);
        }
        if self.is_exhausted() {
            return Ok(SwipeOutcome::Exhausted);
        }
        self.check_quota(direction)?;

        if direction == SwipeDirection::Right {
            if let LikeQuota::Limited(remaining) = &mut self.quota {
                *remaining -= 1;
            }
        }

        Ok(self.step(direction))
    }

    /// Premium-only like that does not touch the quota
    pub fn super_like(&mut self) -> Result<SwipeOutcome> {
        if self.offline {
            return Ok(SwipeOutcome::Ignored);
        }
        if !self.quota.is_premium() {
            return Err(Error::PremiumRequired);
        }
        if self.is_exhausted() {
            return Ok(SwipeOutcome::Exhausted);
        }

        Ok(self.step(SwipeDirection::Right))
    }

    fn step(&mut self, direction: SwipeDirection) -> SwipeOutcome {
        self.direction = Some(direction);
        self.index += 1;

        if self.is_exhausted() {
            SwipeOutcome::Exhausted
        } else {
            SwipeOutcome::Advanced
        }
    }
}

/// Drives a [`DiscoverySession`] and persists right-swipes as likes
#[derive(Clone)]
pub struct Discovery {
    likes: Arc<LikeWorkflow>,
}

impl Discovery {
    pub fn new(likes: Arc<LikeWorkflow>) -> Self {
        Self { likes }
    }

    pub fn likes(&self) -> &LikeWorkflow {
        &self.likes
    }

    /// Swipe on the current candidate.
    ///
    /// Right-swipes check the quota, then like the candidate; the session only
    /// moves on once the like is stored. Left-swipes stay local.
    pub async fn swipe(&self, session: &mut DiscoverySession, direction: SwipeDirection) -> Result<SwipeOutcome> {
        if session.is_offline() {
            return Ok(SwipeOutcome::Ignored);
        }

        if direction == SwipeDirection::Right {
            session.check_quota(direction)?;
            let Some(target) = session.current().map(|p| p.id.clone()) else {
                return Ok(SwipeOutcome::Exhausted);
            };
            self.likes.ensure_liked(&target).await?;
        }

        session.advance(direction)
    }

    pub async fn super_like(&self, session: &mut DiscoverySession) -> Result<SwipeOutcome> {
        if session.is_offline() {
            return Ok(SwipeOutcome::Ignored);
        }
        if !session.quota().is_premium() {
            return Err(Error::PremiumRequired);
        }

        let Some(target) = session.current().map(|p| p.id.clone()) else {
            return Ok(SwipeOutcome::Exhausted);
        };
        self.likes.ensure_liked(&target).await?;

        session.super_like()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::likes::LikeState;
    use crate::models::samples::discovery_profiles;
    use crate::models::ProfileId;
    use crate::services::memory::MemoryStore;
    use crate::services::store::Table;
    use uuid::Uuid;

    fn session(quota: LikeQuota) -> DiscoverySession {
        DiscoverySession::new(discovery_profiles(), Some(Gender::Male), None, quota)
    }

    #[test]
    fn test_session_filters_on_creation() {
        let session = session(LikeQuota::Limited(10));
        assert_eq!(session.candidates().len(), 3);
        assert!(session
            .candidates()
            .iter()
            .all(|p| p.gender == Some(Gender::Female)));
    }

    #[test]
    fn test_right_swipe_uses_quota() {
        let mut session = session(LikeQuota::Limited(2));

        assert_eq!(session.advance(SwipeDirection::Right).unwrap(), SwipeOutcome::Advanced);
        assert_eq!(session.quota(), LikeQuota::Limited(1));
        assert_eq!(session.direction(), Some(SwipeDirection::Right));

        assert_eq!(session.advance(SwipeDirection::Left).unwrap(), SwipeOutcome::Advanced);
        assert_eq!(session.quota(), LikeQuota::Limited(1));
    }

    #[test]
    fn test_exhausted_quota_rejects_right_swipe() {
        let mut session = session(LikeQuota::Limited(0));

        assert!(matches!(session.advance(SwipeDirection::Right), Err(Error::QuotaExhausted)));
        assert_eq!(session.quota(), LikeQuota::Limited(0));
        assert_eq!(session.position(), 0);

        // left swipes are always allowed
        assert_eq!(session.advance(SwipeDirection::Left).unwrap(), SwipeOutcome::Advanced);
    }

    #[test]
    fn test_end_of_list_and_restart() {
        let mut session = session(LikeQuota::Unlimited);

        assert_eq!(session.advance(SwipeDirection::Left).unwrap(), SwipeOutcome::Advanced);
        assert_eq!(session.advance(SwipeDirection::Left).unwrap(), SwipeOutcome::Advanced);
        assert_eq!(session.advance(SwipeDirection::Left).unwrap(), SwipeOutcome::Exhausted);
        assert!(session.current().is_none());
        assert_eq!(session.advance(SwipeDirection::Left).unwrap(), SwipeOutcome::Exhausted);

        session.restart();
        assert_eq!(session.current().map(|p| p.name.as_str()), Some("Anushka"));
        assert_eq!(session.direction(), None);
    }

    #[test]
    fn test_offline_ignores_swipes() {
        let mut session = session(LikeQuota::Limited(5));
        session.set_offline(true);

        assert_eq!(session.advance(SwipeDirection::Right).unwrap(), SwipeOutcome::Ignored);
        assert_eq!(session.position(), 0);
        assert_eq!(session.quota(), LikeQuota::Limited(5));
    }

    #[test]
    fn test_set_preferences_rewinds() {
        let mut session = session(LikeQuota::Unlimited);
        session.advance(SwipeDirection::Left).unwrap();

        session.set_preferences(Some(Preferences {
            religion: Some("buddhist".to_string()),
            ..Default::default()
        }));

        assert_eq!(session.position(), 0);
        assert_eq!(session.candidates().len(), 1);
        assert_eq!(session.current().map(|p| p.name.as_str()), Some("Divya"));
    }

    #[test]
    fn test_super_like_is_premium_only() {
        let mut limited = session(LikeQuota::Limited(3));
        assert!(matches!(limited.super_like(), Err(Error::PremiumRequired)));

        let mut premium = session(LikeQuota::Unlimited);
        assert_eq!(premium.super_like().unwrap(), SwipeOutcome::Advanced);
        assert_eq!(premium.quota(), LikeQuota::Unlimited);
    }

    #[test]
    fn test_set_remaining_likes_keeps_premium_unlimited() {
        let mut premium = session(LikeQuota::Unlimited);
        premium.set_remaining_likes(3);
        assert_eq!(premium.quota(), LikeQuota::Unlimited);

        let mut limited = session(LikeQuota::Limited(0));
        limited.set_remaining_likes(10);
        assert_eq!(limited.quota(), LikeQuota::Limited(10));
    }

    #[test]
    fn test_replace_profiles_keeps_quota() {
        let mut session = session(LikeQuota::Limited(2));
        session.advance(SwipeDirection::Right).unwrap();

        session.replace_profiles(discovery_profiles(), Some(Gender::Female), None);

        assert_eq!(session.position(), 0);
        assert_eq!(session.quota(), LikeQuota::Limited(1));
        assert_eq!(session.current().map(|p| p.name.as_str()), Some("Raj"));

        session.set_quota(LikeQuota::Unlimited);
        assert!(session.quota().is_premium());
    }

    #[test]
    fn test_outcome_wire_format() {
        assert_eq!(serde_json::to_value(SwipeOutcome::Exhausted).unwrap(), "exhausted");
    }

    #[tokio::test]
    async fn test_discovery_right_swipe_on_sample_profile() {
        let store = Arc::new(MemoryStore::new());
        let likes = Arc::new(LikeWorkflow::new(store.clone(), Some(Uuid::new_v4())));
        let discovery = Discovery::new(likes);
        let mut session = session(LikeQuota::Limited(1));

        let first = session.current().unwrap().id.clone();
        assert_eq!(
            discovery.swipe(&mut session, SwipeDirection::Right).await.unwrap(),
            SwipeOutcome::Advanced
        );
        assert!(discovery.likes().is_liked(&first));
        assert_eq!(session.quota(), LikeQuota::Limited(0));
        // sample profiles are local-only
        assert_eq!(store.len(Table::Likes).await, 0);

        let second = session.current().unwrap().id.clone();
        assert!(matches!(
            discovery.swipe(&mut session, SwipeDirection::Right).await,
            Err(Error::QuotaExhausted)
        ));
        assert_eq!(discovery.likes().state(&second), LikeState::Unknown);
        assert_eq!(session.current().map(|p| &p.id), Some(&second));
    }

    #[tokio::test]
    async fn test_failed_like_does_not_advance() {
        let store = Arc::new(MemoryStore::new());
        let discovery = Discovery::new(Arc::new(LikeWorkflow::new(store, None)));
        let mut session = DiscoverySession::new(
            vec![Profile {
                id: ProfileId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap(),
                ..discovery_profiles().remove(0)
            }],
            Some(Gender::Male),
            None,
            LikeQuota::Limited(3),
        );

        assert!(matches!(
            discovery.swipe(&mut session, SwipeDirection::Right).await,
            Err(Error::Unauthenticated)
        ));
        assert_eq!(session.position(), 0);
        assert_eq!(session.quota(), LikeQuota::Limited(3));
    }
}
