pub mod config;
pub mod error;
pub mod events;
pub mod model;

pub use config::{AppConfig, GitHubConfig, LastFmConfig, SourceKind};
pub use error::MonitorError;
pub use events::{MonitorEvent, SourceEvent};
pub use model::{StatusPayload, Track};
