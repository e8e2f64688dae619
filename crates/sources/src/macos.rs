use crate::jxa::{parse_player_output, player_script, ITUNES_APP, SPOTIFY_APP};
use crate::TrackSource;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use nowplaying_status_core::Track;
use tokio::process::Command;

pub struct JxaSource {
    name: &'static str,
    script: String,
}

impl JxaSource {
    pub fn itunes() -> Self {
        Self {
            name: "itunes",
            script: player_script(ITUNES_APP),
        }
    }

    pub fn spotify() -> Self {
        Self {
            name: "spotify",
            script: player_script(SPOTIFY_APP),
        }
    }
}

#[async_trait]
impl TrackSource for JxaSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_current_track(&self) -> Result<Option<Track>> {
        let output = Command::new("osascript")
            .arg("-l")
            .arg("JavaScript")
            .arg("-e")
            .arg(&self.script)
            .output()
            .await
            .with_context(|| format!("failed to run osascript for {}", self.name))?;

        if !output.status.success() {
            return Err(anyhow!(
                "osascript failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let stdout = String::from_utf8(output.stdout).context("invalid UTF-8 from osascript")?;
        parse_player_output(&stdout)
    }
}
