use serde::{Deserialize, Serialize};

/// Dashboard counters for the channel owned by one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_video_views: i64,
    pub total_likes: i64,
    pub total_subscribers: i64,
    pub total_videos: i64,
}
