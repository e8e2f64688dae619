use serde::{Deserialize, Serialize};

pub const NOW_PLAYING_EMOJI: &str = ":musical_note:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: String,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusPayload {
    pub emoji: String,
    pub message: Option<String>,
}

impl StatusPayload {
    pub fn now_playing(track: &Track) -> Self {
        Self {
            emoji: NOW_PLAYING_EMOJI.to_string(),
            message: Some(format!(
                "is listening to \"{}\" by {}",
                track.title, track.artist
            )),
        }
    }
}
