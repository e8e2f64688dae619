use anyhow::{bail, Result};
use async_trait::async_trait;
use nowplaying_status_core::{AppConfig, SourceKind, Track};
use std::sync::Arc;

pub use lastfm::LastFmSource;
#[cfg(target_os = "macos")]
pub use macos::JxaSource;

// `Ok(None)` means nothing is playing.
#[async_trait]
pub trait TrackSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_current_track(&self) -> Result<Option<Track>>;
}

pub fn build_track_source(cfg: &AppConfig) -> Result<Arc<dyn TrackSource>> {
    match cfg.source {
        SourceKind::LastFm => {
            if cfg.lastfm.api_key.trim().is_empty() || cfg.lastfm.user.trim().is_empty() {
                bail!("lastfm source requires `lastfm.api_key` and `lastfm.user`");
            }
            Ok(Arc::new(LastFmSource::new(
                cfg.lastfm.api_key.clone(),
                cfg.lastfm.user.clone(),
            )))
        }
        SourceKind::ITunes => platform::itunes_source(),
        SourceKind::Spotify => platform::spotify_source(),
    }
}

mod platform {
    use super::TrackSource;
    use anyhow::Result;
    use std::sync::Arc;

    #[cfg(target_os = "macos")]
    pub fn itunes_source() -> Result<Arc<dyn TrackSource>> {
        Ok(Arc::new(crate::macos::JxaSource::itunes()))
    }

    #[cfg(not(target_os = "macos"))]
    pub fn itunes_source() -> Result<Arc<dyn TrackSource>> {
        anyhow::bail!("the itunes source is only available on macOS")
    }

    #[cfg(target_os = "macos")]
    pub fn spotify_source() -> Result<Arc<dyn TrackSource>> {
        Ok(Arc::new(crate::macos::JxaSource::spotify()))
    }

    #[cfg(not(target_os = "macos"))]
    pub fn spotify_source() -> Result<Arc<dyn TrackSource>> {
        anyhow::bail!("the spotify source is only available on macOS")
    }
}

mod jxa;
mod lastfm;
#[cfg(target_os = "macos")]
mod macos;
