use crate::{MonitorError, StatusPayload, Track};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    TrackChanged(Track),
    TrackStopped,
    Error(MonitorError),
}

impl SourceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SourceEvent::TrackChanged(_) => "track-changed",
            SourceEvent::TrackStopped => "track-stopped",
            SourceEvent::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    ListenStart,
    ListenStop,
    StatusUpdated(StatusPayload),
    StatusCleared,
    Error(MonitorError),
}

impl MonitorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::ListenStart => "listen-start",
            MonitorEvent::ListenStop => "listen-stop",
            MonitorEvent::StatusUpdated(_) => "status-updated",
            MonitorEvent::StatusCleared => "status-cleared",
            MonitorEvent::Error(_) => "error",
        }
    }
}
