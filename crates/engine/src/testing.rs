use crate::StatusPublisher;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use nowplaying_status_core::{StatusPayload, Track};
use nowplaying_status_sources::TrackSource;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub type Step = Result<Option<Track>, &'static str>;

pub fn playing(title: &str, artist: &str) -> Step {
    Ok(Some(Track::new(title, artist)))
}

pub fn nothing() -> Step {
    Ok(None)
}

pub struct ScriptedSource {
    name: &'static str,
    steps: Mutex<VecDeque<Step>>,
    delay: Duration,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: &'static str, steps: Vec<Step>) -> Self {
        Self {
            name,
            steps: Mutex::new(steps.into()),
            delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock();
        if steps.len() > 1 {
            steps.pop_front().unwrap_or(Ok(None))
        } else {
            steps.front().cloned().unwrap_or(Ok(None))
        }
    }
}

#[async_trait]
impl TrackSource for ScriptedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_current_track(&self) -> Result<Option<Track>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_step().map_err(|msg| anyhow!(msg))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<StatusPayload>>,
    clears: AtomicUsize,
    fail_publish: AtomicBool,
    fail_clear: AtomicBool,
    decline_clear: AtomicBool,
    publish_delay: Mutex<Duration>,
    clear_delay: Mutex<Duration>,
}

impl RecordingPublisher {
    pub fn failing_publish() -> Self {
        let publisher = Self::default();
        publisher.fail_publish.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn failing_clear() -> Self {
        let publisher = Self::default();
        publisher.fail_clear.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn declining_clear() -> Self {
        let publisher = Self::default();
        publisher.decline_clear.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn with_publish_delay(delay: Duration) -> Self {
        let publisher = Self::default();
        *publisher.publish_delay.lock() = delay;
        publisher
    }

    pub fn with_clear_delay(delay: Duration) -> Self {
        let publisher = Self::default();
        *publisher.clear_delay.lock() = delay;
        publisher
    }

    pub fn published(&self) -> Vec<StatusPayload> {
        self.published.lock().clone()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusPublisher for RecordingPublisher {
    async fn publish(&self, status: &StatusPayload) -> Result<Option<StatusPayload>> {
        let delay = *self.publish_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(anyhow!("publish rejected"));
        }
        self.published.lock().push(status.clone());
        Ok(Some(status.clone()))
    }

    async fn clear(&self) -> Result<bool> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        let delay = *self.clear_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(anyhow!("clear rejected"));
        }
        Ok(!self.decline_clear.load(Ordering::SeqCst))
    }
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
