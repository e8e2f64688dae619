use crate::detector::PollingChangeDetector;
use crate::publisher::StatusPublisher;
use nowplaying_status_core::{MonitorError, MonitorEvent, SourceEvent, StatusPayload, Track};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Stopped,
    Listening,
    // A stop is clearing the status; further `stop()` calls are no-ops.
    Stopping,
}

#[derive(Clone)]
pub struct StatusLifecycleController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    publisher: Arc<dyn StatusPublisher>,
    events: broadcast::Sender<MonitorEvent>,
    state: Mutex<ControllerState>,
    status_dirty: AtomicBool,
    source: Mutex<Option<PollingChangeDetector>>,
    // Held while a source event is handled and while `stop` clears.
    handling: AsyncMutex<()>,
}

impl StatusLifecycleController {
    pub fn new(publisher: Arc<dyn StatusPublisher>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ControllerInner {
                publisher,
                events,
                state: Mutex::new(ControllerState::Stopped),
                status_dirty: AtomicBool::new(false),
                source: Mutex::new(None),
                handling: AsyncMutex::new(()),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        *self.inner.state.lock()
    }

    pub fn is_status_dirty(&self) -> bool {
        self.inner.status_dirty.load(Ordering::SeqCst)
    }

    pub fn source_name(&self) -> Option<&'static str> {
        self.inner.source.lock().as_ref().map(|d| d.source_name())
    }

    pub fn set_source(&self, mut detector: PollingChangeDetector) {
        let mut slot = self.inner.source.lock();

        let auto_start = match slot.take() {
            Some(mut previous) => {
                let was_listening = previous.is_listening();
                previous.stop();
                previous.detach();
                info!(
                    previous = previous.source_name(),
                    next = detector.source_name(),
                    "replacing track source"
                );
                was_listening
            }
            None => false,
        };

        let rx = detector.subscribe();
        tokio::spawn(forward_source_events(Arc::downgrade(&self.inner), rx));

        if auto_start {
            detector.listen();
        }
        *slot = Some(detector);
    }

    pub fn listen(&self) -> Result<(), MonitorError> {
        {
            let mut slot = self.inner.source.lock();
            let detector = slot.as_mut().ok_or(MonitorError::NoSource)?;

            let mut state = self.inner.state.lock();
            if *state != ControllerState::Stopped {
                return Ok(());
            }
            detector.listen();
            *state = ControllerState::Listening;
            info!(source = detector.source_name(), "listening for track changes");
        }

        self.inner.emit(MonitorEvent::ListenStart);
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), MonitorError> {
        {
            let mut slot = self.inner.source.lock();
            let detector = slot.as_mut().ok_or(MonitorError::NoSource)?;

            let mut state = self.inner.state.lock();
            if *state != ControllerState::Listening {
                return Ok(());
            }
            *state = ControllerState::Stopping;
            detector.stop();
        }

        let _handling = self.inner.handling.lock().await;
        if self.is_status_dirty() {
            self.inner.clear_status().await;
        }

        *self.inner.state.lock() = ControllerState::Stopped;
        info!("stopped listening for track changes");
        self.inner.emit(MonitorEvent::ListenStop);
        Ok(())
    }
}

impl ControllerInner {
    fn emit(&self, event: MonitorEvent) {
        debug!(event = event.name(), "emitted monitor event");
        let _ = self.events.send(event);
    }

    async fn update_status(&self, track: &Track) {
        let status = StatusPayload::now_playing(track);
        debug!(message = ?status.message, "publishing status");

        match self.publisher.publish(&status).await {
            Ok(stored) => {
                self.status_dirty.store(true, Ordering::SeqCst);
                self.emit(MonitorEvent::StatusUpdated(stored.unwrap_or(status)));
            }
            Err(err) => {
                let cause = format!("{err:#}");
                warn!(error = %cause, "failed to publish status");
                self.emit(MonitorEvent::Error(MonitorError::Publish(cause)));
            }
        }
    }

    async fn clear_status(&self) {
        debug!("clearing the profile status");

        match self.publisher.clear().await {
            Ok(cleared) => {
                if !cleared {
                    debug!("status publisher reported nothing to clear");
                }
                self.status_dirty.store(false, Ordering::SeqCst);
                self.emit(MonitorEvent::StatusCleared);
            }
            Err(err) => {
                let cause = format!("{err:#}");
                warn!(error = %cause, "failed to clear status");
                self.emit(MonitorEvent::Error(MonitorError::Clear(cause)));
            }
        }
    }
}

async fn forward_source_events(
    inner: Weak<ControllerInner>,
    mut rx: mpsc::UnboundedReceiver<SourceEvent>,
) {
    while let Some(event) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let _handling = inner.handling.lock().await;
        let listening = *inner.state.lock() == ControllerState::Listening;
        if !listening {
            debug!(event = event.name(), "dropped source event after stop");
            continue;
        }
        match event {
            SourceEvent::TrackChanged(track) => inner.update_status(&track).await,
            SourceEvent::TrackStopped => inner.clear_status().await,
            SourceEvent::Error(err) => inner.emit(MonitorEvent::Error(err)),
        }
    }
}
