//! Track descriptors and ingress normalization
//!
//! Screens build tracks from several backend shapes (feed rows, profile
//! uploads, event line-ups). Everything is funnelled into one canonical
//! [`TrackDescriptor`] so the queue and controller never branch on
//! field-name variants.

use crate::error::TrackError;
use serde::{Deserialize, Deserializer, Serialize};

/// Creator attribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Creator {
    /// Profile identifier
    pub id: String,

    /// Handle, without the leading `@`
    pub username: Option<String>,

    /// Display name
    pub display_name: Option<String>,

    /// Avatar image locator
    pub avatar_url: Option<String>,
}

/// Playable item
///
/// Two descriptors with the same `id` are the same logical track, whatever
/// their other fields say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Stable track identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Audio locator (URI)
    pub media_url: String,

    /// Artwork locator, `None` means the placeholder is shown
    pub artwork_url: Option<String>,

    /// Duration hint in seconds; the loaded media is authoritative
    pub duration_hint: Option<f64>,

    /// Who uploaded the track
    pub creator: Option<Creator>,

    /// Mirrored play counter (backend owned)
    pub play_count: Option<u64>,

    /// Mirrored like counter (backend owned)
    pub like_count: Option<u64>,
}

impl TrackDescriptor {
    /// Create a descriptor with only the required fields
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            media_url: media_url.into(),
            artwork_url: None,
            duration_hint: None,
            creator: None,
            play_count: None,
            like_count: None,
        }
    }

    /// Whether `other` refers to the same logical track
    pub fn same_track(&self, other: &TrackDescriptor) -> bool {
        self.id == other.id
    }

    /// Artwork locator, falling back to `placeholder`
    pub fn artwork_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.artwork_url.as_deref().unwrap_or(placeholder)
    }

    /// Scrub a descriptor built in code
    ///
    /// Trims strings, turns blank optionals into `None`, drops unusable
    /// duration hints. Fails when `id` or `media_url` end up empty.
    pub fn normalized(mut self) -> Result<Self, TrackError> {
        self.id = self.id.trim().to_string();
        self.media_url = self.media_url.trim().to_string();
        self.title = self.title.trim().to_string();

        if self.id.is_empty() {
            return Err(TrackError::MissingField("id"));
        }
        if self.media_url.is_empty() {
            return Err(TrackError::MissingField("media_url"));
        }

        self.artwork_url = non_blank(self.artwork_url);
        self.duration_hint = self.duration_hint.filter(|d| d.is_finite() && *d >= 0.0);
        self.creator = self.creator.and_then(|creator| {
            let id = creator.id.trim().to_string();
            if id.is_empty() {
                return None;
            }
            Some(Creator {
                id,
                username: non_blank(creator.username),
                display_name: non_blank(creator.display_name),
                avatar_url: non_blank(creator.avatar_url),
            })
        });

        Ok(self)
    }

    /// Merge every field present in `patch`
    ///
    /// The caller is responsible for checking `patch.id` against `self.id`.
    pub fn apply(&mut self, patch: &TrackPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(artwork) = &patch.artwork_url {
            self.artwork_url = non_blank(Some(artwork.clone()));
        }
        if let Some(hint) = patch.duration_hint.filter(|d| d.is_finite() && *d >= 0.0) {
            self.duration_hint = Some(hint);
        }
        if let Some(creator) = &patch.creator {
            self.creator = Some(creator.clone());
        }
        if let Some(plays) = patch.play_count {
            self.play_count = Some(plays);
        }
        if let Some(likes) = patch.like_count {
            self.like_count = Some(likes);
        }
    }
}

/// Partial update for a track, keyed by id
///
/// Typically a freshly fetched counter landing after an optimistic update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPatch {
    /// Track the patch belongs to
    pub id: String,
    pub title: Option<String>,
    pub artwork_url: Option<String>,
    pub duration_hint: Option<f64>,
    pub creator: Option<Creator>,
    pub play_count: Option<u64>,
    pub like_count: Option<u64>,
}

impl TrackPatch {
    /// Empty patch for `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the like counter
    pub fn with_like_count(mut self, likes: u64) -> Self {
        self.like_count = Some(likes);
        self
    }

    /// Set the play counter
    pub fn with_play_count(mut self, plays: u64) -> Self {
        self.play_count = Some(plays);
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Creator as found in backend records
#[derive(Debug, Clone, Default, Deserialize)]
struct RawCreator {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default, alias = "handle")]
    username: Option<String>,
    #[serde(default, alias = "full_name", alias = "name")]
    display_name: Option<String>,
    #[serde(default, alias = "avatar", alias = "profile_image_url")]
    avatar_url: Option<String>,
}

/// Track record in any of the backend shapes
///
/// Deserializes feed rows, profile uploads and event line-ups alike through
/// field aliases. Use [`RawTrack::normalize`] to get a [`TrackDescriptor`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrack {
    #[serde(default, alias = "track_id", deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(
        default,
        alias = "audio_url",
        alias = "stream_url",
        alias = "file_url",
        alias = "url"
    )]
    media_url: Option<String>,
    #[serde(
        default,
        alias = "cover_url",
        alias = "image_url",
        alias = "artwork",
        alias = "cover_art_url"
    )]
    artwork_url: Option<String>,
    #[serde(default, alias = "duration", alias = "duration_seconds")]
    duration_hint: Option<f64>,
    #[serde(default, alias = "artist", alias = "profile", alias = "profiles")]
    creator: Option<RawCreator>,
    #[serde(default, alias = "plays_count", alias = "plays")]
    play_count: Option<u64>,
    #[serde(default, alias = "likes_count", alias = "likes")]
    like_count: Option<u64>,
}

impl RawTrack {
    /// Parse a single backend record
    pub fn from_value(value: serde_json::Value) -> Result<Self, TrackError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a JSON array of backend records
    pub fn list_from_str(json: &str) -> Result<Vec<Self>, TrackError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Turn the record into a canonical descriptor
    pub fn normalize(self) -> Result<TrackDescriptor, TrackError> {
        let id = non_blank(self.id).ok_or(TrackError::MissingField("id"))?;
        let media_url = non_blank(self.media_url).ok_or(TrackError::MissingField("media_url"))?;

        let creator = self.creator.and_then(|raw| {
            Some(Creator {
                id: non_blank(raw.id)?,
                username: raw.username,
                display_name: raw.display_name,
                avatar_url: raw.avatar_url,
            })
        });

        TrackDescriptor {
            id,
            title: self.title.unwrap_or_default(),
            media_url,
            artwork_url: self.artwork_url,
            duration_hint: self.duration_hint,
            creator,
            play_count: self.play_count,
            like_count: self.like_count,
        }
        .normalized()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accept ids stored as strings or as integers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
