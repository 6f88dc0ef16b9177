use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::ownership::Owned;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub owner: Uuid,
    pub video: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.owner
    }
}

/// A comment as shown under a video: author name, like count and whether
/// the viewer liked it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub username: Option<String>,
    pub content: String,
    pub likes: i64,
    pub is_liked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTargetKind {
    Video,
    Comment,
    Tweet,
}

impl LikeTargetKind {
    /// Maps the short route segment (`v`, `c`, `t`) to a kind.
    pub fn from_route(segment: &str) -> Option<Self> {
        match segment {
            "v" => Some(Self::Video),
            "c" => Some(Self::Comment),
            "t" => Some(Self::Tweet),
            _ => None,
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "video" => Some(Self::Video),
            "comment" => Some(Self::Comment),
            "tweet" => Some(Self::Tweet),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Comment => "Comment",
            Self::Tweet => "Tweet",
        }
    }
}

/// What a like points at. Serialized as a single key named after the kind,
/// e.g. `{"video": "<id>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    pub fn new(kind: LikeTargetKind, id: Uuid) -> Self {
        match kind {
            LikeTargetKind::Video => Self::Video(id),
            LikeTargetKind::Comment => Self::Comment(id),
            LikeTargetKind::Tweet => Self::Tweet(id),
        }
    }

    pub fn kind(&self) -> LikeTargetKind {
        match self {
            Self::Video(_) => LikeTargetKind::Video,
            Self::Comment(_) => LikeTargetKind::Comment,
            Self::Tweet(_) => LikeTargetKind::Tweet,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub liked_by: Uuid,
    #[serde(flatten)]
    pub target: LikeTarget,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
