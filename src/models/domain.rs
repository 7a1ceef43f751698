use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::age::{calculate_age, DEFAULT_AGE};
use crate::error::Error;

/// Gender used for complementary matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse a stored gender value, case-insensitively.
    /// Anything other than male/female is treated as unspecified.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

fn deserialize_gender<'de, D>(deserializer: D) -> Result<Option<Gender>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Gender::parse))
}

/// Profile identifier, classified once when it enters the system.
///
/// Legacy numeric ids belong to sample/demo profiles that only live on the
/// client, so operations on them never reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProfileId {
    LocalOnly(String),
    Persisted(Uuid),
}

impl ProfileId {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(ProfileId::LocalOnly(raw.to_string()));
        }

        // Only the hyphenated 8-4-4-4-12 form is accepted; uuid parses
        // 36-character input exclusively in that layout.
        if raw.len() == 36 {
            if let Ok(id) = Uuid::try_parse(raw) {
                return Ok(ProfileId::Persisted(id));
            }
        }

        Err(Error::Validation(format!("invalid profile id: {raw:?}")))
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, ProfileId::Persisted(_))
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            ProfileId::Persisted(id) => Some(*id),
            ProfileId::LocalOnly(_) => None,
        }
    }
}

/// Whether `id` has a valid profile id shape: a hyphenated UUID or a legacy
/// numeric string.
pub fn is_valid_uuid(id: &str) -> bool {
    ProfileId::parse(id).is_ok()
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileId::LocalOnly(raw) => f.write_str(raw),
            ProfileId::Persisted(id) => write!(f, "{}", id.hyphenated()),
        }
    }
}

impl FromStr for ProfileId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileId::parse(s)
    }
}

impl From<Uuid> for ProfileId {
    fn from(id: Uuid) -> Self {
        ProfileId::Persisted(id)
    }
}

impl Serialize for ProfileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProfileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ProfileId::parse(&raw).map_err(de::Error::custom)
    }
}

/// A candidate profile as presented in discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub age: u32,
    #[serde(default, deserialize_with = "deserialize_gender")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub civil_status: Option<String>,
}

/// Discovery preferences supplied by the viewer for a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Inclusive `[min, max]` age bounds
    #[serde(default)]
    pub age_range: Option<(u32, u32)>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub civil_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Pending,
    Accepted,
}

/// Directed like relation, one per (liker, liked) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
    pub liked_profile_id: Uuid,
    pub status: LikeStatus,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn pending(user_id: Uuid, liked_profile_id: Uuid) -> Self {
        Self {
            user_id,
            liked_profile_id,
            status: LikeStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// One chat message. Rows are keyed by `id`; a conversation is the
/// unordered pair of participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: String,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: Uuid, receiver_id: Uuid, text: String, image_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id: conversation_id(sender_id, receiver_id),
            sender_id,
            receiver_id,
            text,
            image_url,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Conversation key shared by both participants, whichever side asks
pub fn conversation_id(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{}:{}", low.hyphenated(), high.hyphenated())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Left,
    Right,
}

/// Remaining likes for the current period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "remaining")]
pub enum LikeQuota {
    Unlimited,
    Limited(i64),
}

impl LikeQuota {
    pub fn for_viewer(is_premium: bool, remaining: i64) -> Self {
        if is_premium {
            LikeQuota::Unlimited
        } else {
            LikeQuota::Limited(remaining)
        }
    }

    pub fn allows_like(&self) -> bool {
        match self {
            LikeQuota::Unlimited => true,
            LikeQuota::Limited(n) => *n > 0,
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, LikeQuota::Unlimited)
    }
}

/// Raw `profiles` row as returned by the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub civil_status: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
}

impl ProfileRow {
    /// Convert a stored row into a discovery profile.
    ///
    /// Fails only when the id has neither a UUID nor a numeric shape.
    pub fn into_profile(self, today: NaiveDate) -> Result<Profile, Error> {
        let id = ProfileId::parse(&self.id)?;

        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();

        let age = self
            .date_of_birth
            .map(|dob| calculate_age(dob, today))
            .unwrap_or(DEFAULT_AGE);

        Ok(Profile {
            id,
            name: if name.is_empty() { "Anonymous".to_string() } else { name },
            age,
            gender: self.gender.as_deref().and_then(Gender::parse),
            occupation: non_empty_or(self.job, "Not specified"),
            location: non_empty_or(self.location, "Not specified"),
            interests: self.interests.unwrap_or_default(),
            bio: non_empty_or(self.bio, "No bio available"),
            image_url: non_empty_or(self.avatar_url, "/placeholder.svg"),
            is_online: self.is_online.unwrap_or(false),
            last_active: self.last_active,
            religion: self.religion.filter(|r| !r.is_empty()),
            civil_status: self.civil_status.filter(|c| !c.is_empty()),
        })
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Ordering used for curated matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPriority {
    #[default]
    Interests,
    Age,
    Location,
    Religion,
}

/// Filters for curated match suggestions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFilters {
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub civil_status: Option<String>,
    #[serde(default)]
    pub priority: MatchPriority,
}

/// Per-dimension scores (each 0-100) for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreComponents {
    pub interest_score: f64,
    pub location_score: f64,
    pub religion_score: f64,
    pub age_score: f64,
    pub shared_interests: Vec<String>,
}

/// Scored curated match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    pub profile: Profile,
    pub match_score: f64,
    pub shared_interests: Vec<String>,
}
