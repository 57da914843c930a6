use crate::client::UpstreamTrack;
use serde::Serialize;

/// Flat record handed back to the host for each liked song.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Track {
    pub video_id: String,
    pub duration_ms: u64,
    pub title: String,
    pub channel_id: String,
    pub channel_name: String,
    pub thumbnail_url: String,
    pub artists: Vec<String>,
}

impl From<&UpstreamTrack> for Track {
    fn from(t: &UpstreamTrack) -> Track {
        let artists = t.artists.as_deref().unwrap_or_default();
        let first = artists.first();
        Track {
            video_id: t.video_id.clone().unwrap_or_default(),
            duration_ms: t
                .duration_seconds
                .and_then(|secs| secs.checked_mul(1000))
                .unwrap_or(0),
            title: t.title.clone().unwrap_or_default(),
            channel_id: first.and_then(|a| a.id.clone()).unwrap_or_default(),
            channel_name: first.and_then(|a| a.name.clone()).unwrap_or_default(),
            // upstream lists thumbnails smallest first
            thumbnail_url: t
                .thumbnails
                .as_deref()
                .and_then(|th| th.last())
                .and_then(|th| th.url.clone())
                .unwrap_or_default(),
            artists: artists
                .iter()
                .map(|a| a.name.clone().unwrap_or_default())
                .collect(),
        }
    }
}
