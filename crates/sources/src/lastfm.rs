use crate::TrackSource;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use nowplaying_status_core::Track;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const RECENT_TRACKS_ENDPOINT: &str = "http://ws.audioscrobbler.com/2.0";

pub struct LastFmSource {
    api_key: String,
    user: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RecentTracksResponse {
    recenttracks: Option<RecentTracks>,
    error: Option<u32>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentTracks {
    #[serde(default)]
    track: OneOrMany<RecentTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Many(items) => items.into_iter().next(),
            OneOrMany::One(item) => Some(item),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecentTrack {
    name: String,
    artist: ArtistRef,
    #[serde(rename = "@attr")]
    attr: Option<TrackAttr>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    #[serde(rename = "#text")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct TrackAttr {
    nowplaying: Option<String>,
}

impl LastFmSource {
    pub fn new(api_key: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user: user.into(),
            client: reqwest::Client::new(),
        }
    }

    fn recent_tracks_url(&self) -> Result<Url> {
        Url::parse_with_params(
            RECENT_TRACKS_ENDPOINT,
            &[
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("method", "user.getrecenttracks"),
                ("user", self.user.as_str()),
            ],
        )
        .context("invalid last.fm request url")
    }
}

#[async_trait]
impl TrackSource for LastFmSource {
    fn name(&self) -> &'static str {
        "lastfm"
    }

    async fn fetch_current_track(&self) -> Result<Option<Track>> {
        let response = self
            .client
            .get(self.recent_tracks_url()?)
            .send()
            .await
            .context("last.fm request failed")?;

        let status = response.status();
        debug!(%status, "api request to last.fm");

        let body = response
            .text()
            .await
            .context("failed to read last.fm response")?;
        let track =
            parse_recent_tracks(&body).with_context(|| format!("last.fm returned {status}"))?;
        if !status.is_success() {
            bail!("last.fm returned {status}");
        }
        Ok(track)
    }
}

fn parse_recent_tracks(body: &str) -> Result<Option<Track>> {
    let payload: RecentTracksResponse =
        serde_json::from_str(body).context("invalid JSON from last.fm")?;

    if let Some(code) = payload.error {
        bail!(
            "last.fm error {code}: {}",
            payload.message.unwrap_or_else(|| "unknown".to_string())
        );
    }

    let Some(latest) = payload
        .recenttracks
        .and_then(|recent| recent.track.into_first())
    else {
        return Ok(None);
    };

    let now_playing = latest
        .attr
        .and_then(|attr| attr.nowplaying)
        .is_some_and(|flag| flag == "true");

    if now_playing {
        Ok(Some(Track::new(latest.name, latest.artist.text)))
    } else {
        Ok(None)
    }
}
