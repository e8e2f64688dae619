use crate::schedule::RepeatingTask;
use nowplaying_status_core::{MonitorError, SourceEvent, Track};
use nowplaying_status_sources::TrackSource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Stopped,
    Listening,
}

// `Unknown` differs from `Observed(None)`: the first playing track is always a change.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LastObserved {
    Unknown,
    Observed(Option<Track>),
}

impl LastObserved {
    fn has_changed(&self, next: Option<&Track>) -> bool {
        match (self, next) {
            (LastObserved::Unknown, next) => next.is_some(),
            (LastObserved::Observed(prev), next) => prev.as_ref() != next,
        }
    }
}

struct DetectorShared {
    last: Mutex<LastObserved>,
    listener: Mutex<Option<mpsc::UnboundedSender<SourceEvent>>>,
}

impl DetectorShared {
    fn emit(&self, event: SourceEvent) {
        debug!(event = event.name(), "emitted source event");
        if let Some(tx) = self.listener.lock().as_ref() {
            let _ = tx.send(event);
        }
    }
}

pub struct PollingChangeDetector {
    source: Arc<dyn TrackSource>,
    update_frequency: Duration,
    shared: Arc<DetectorShared>,
    poller: Option<RepeatingTask>,
}

impl PollingChangeDetector {
    pub fn new(source: Arc<dyn TrackSource>, update_frequency: Duration) -> Self {
        Self {
            source,
            update_frequency,
            shared: Arc::new(DetectorShared {
                last: Mutex::new(LastObserved::Unknown),
                listener: Mutex::new(None),
            }),
            poller: None,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn update_frequency(&self) -> Duration {
        self.update_frequency
    }

    pub fn state(&self) -> DetectorState {
        if self.poller.is_some() {
            DetectorState::Listening
        } else {
            DetectorState::Stopped
        }
    }

    pub fn is_listening(&self) -> bool {
        self.state() == DetectorState::Listening
    }

    pub fn attach(&self, tx: mpsc::UnboundedSender<SourceEvent>) {
        *self.shared.listener.lock() = Some(tx);
    }

    pub fn detach(&self) {
        self.shared.listener.lock().take();
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SourceEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attach(tx);
        rx
    }

    pub fn listen(&mut self) {
        if self.is_listening() {
            return;
        }
        debug!(source = self.source.name(), "started listening");

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        self.poller = Some(RepeatingTask::spawn(self.update_frequency, move |token| {
            let source = Arc::clone(&source);
            let shared = Arc::clone(&shared);
            async move { check_now_playing(source.as_ref(), &shared, &token).await }
        }));
    }

    // A fetch already in flight is not awaited; its result is discarded.
    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
            debug!(source = self.source.name(), "stopped listening from source");
        }
    }
}

async fn check_now_playing(
    source: &dyn TrackSource,
    shared: &DetectorShared,
    token: &CancellationToken,
) {
    debug!(source = source.name(), "checking source for now playing track");
    let fetched = source.fetch_current_track().await;

    if token.is_cancelled() {
        debug!(source = source.name(), "detector stopped during pending check; discarding result");
        return;
    }

    let track = match fetched {
        Ok(track) => track,
        Err(err) => {
            let cause = format!("{err:#}");
            warn!(source = source.name(), error = %cause, "track source check failed");
            shared.emit(SourceEvent::Error(MonitorError::Source(cause)));
            return;
        }
    };

    let mut last = shared.last.lock();
    if last.has_changed(track.as_ref()) {
        match &track {
            Some(track) => shared.emit(SourceEvent::TrackChanged(track.clone())),
            None => shared.emit(SourceEvent::TrackStopped),
        }
    }
    *last = LastObserved::Observed(track);
}
