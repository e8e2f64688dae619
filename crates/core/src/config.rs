use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const MIN_UPDATE_FREQUENCY_MS: u64 = 1_000;

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    LastFm,
    ITunes,
    Spotify,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::LastFm => "lastfm",
            SourceKind::ITunes => "itunes",
            SourceKind::Spotify => "spotify",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lastfm" => Ok(SourceKind::LastFm),
            "itunes" => Ok(SourceKind::ITunes),
            "spotify" => Ok(SourceKind::Spotify),
            other => Err(format!("unknown source `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub api_key: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub token: String,
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: GITHUB_GRAPHQL_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub source: SourceKind,
    pub update_frequency_ms: u64,
    pub log_level: String,
    #[serde(default)]
    pub lastfm: LastFmConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

impl AppConfig {
    pub fn update_frequency_ms(&self) -> u64 {
        self.update_frequency_ms.max(MIN_UPDATE_FREQUENCY_MS)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            source: SourceKind::LastFm,
            update_frequency_ms: 10_000,
            log_level: "info".to_string(),
            lastfm: LastFmConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}
