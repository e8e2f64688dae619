#![cfg_attr(not(target_os = "macos"), allow(dead_code))]

use anyhow::{Context, Result};
use nowplaying_status_core::Track;
use serde::Deserialize;

pub(crate) const ITUNES_APP: &str = "iTunes";
pub(crate) const SPOTIFY_APP: &str = "Spotify";

#[derive(Debug, Deserialize)]
struct JxaTrack {
    title: Option<String>,
    artist: Option<String>,
}

pub(crate) fn player_script(app: &str) -> String {
    format!(
        r#"(() => {{
  const player = Application('{app}');
  if (!player.running() || player.playerState() !== 'playing') {{
    return JSON.stringify(null);
  }}
  return JSON.stringify({{
    artist: player.currentTrack.artist(),
    title: player.currentTrack.name(),
  }});
}})()"#
    )
}

pub(crate) fn parse_player_output(stdout: &str) -> Result<Option<Track>> {
    let parsed: Option<JxaTrack> =
        serde_json::from_str(stdout.trim()).context("invalid JSON from jxa script")?;

    Ok(parsed.map(|t| {
        Track::new(
            t.title.unwrap_or_default(),
            t.artist.unwrap_or_default(),
        )
    }))
}
