//! Background tick source for the live dashboard loop.

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Sleep granularity so `stop()` is honoured promptly.
const POLL_STEP: Duration = Duration::from_millis(20);

/// A refresh tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Zero-based position in the run
    pub sequence: u64,
    pub at: DateTime<Utc>,
}

/// Feed settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub interval: Duration,
    /// Stop after this many ticks (unbounded when absent)
    pub max_ticks: Option<u64>,
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_ticks: None,
            channel_capacity: 64,
        }
    }
}

/// Errors raised by the tick feed.
#[derive(Debug)]
pub enum FeedError {
    AlreadyRunning,
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::AlreadyRunning => write!(f, "Tick feed is already running"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Emits ticks on a bounded channel from a background thread.
///
/// When the consumer falls behind and the channel is full, ticks are dropped
/// rather than queued.
pub struct TickFeed {
    config: FeedConfig,
    sender: Sender<Tick>,
    receiver: Receiver<Tick>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TickFeed {
    pub fn new(config: FeedConfig) -> Self {
        let (sender, receiver) = bounded(config.channel_capacity.max(1));
        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start emitting ticks in a background thread.
    pub fn start(&mut self) -> Result<(), FeedError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(FeedError::AlreadyRunning);
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            run_tick_loop(sender, running.clone(), config);
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop emitting ticks and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shared flag, e.g. for a Ctrl+C handler.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn receiver(&self) -> &Receiver<Tick> {
        &self.receiver
    }

    pub fn try_recv(&self) -> Option<Tick> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for TickFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_tick_loop(sender: Sender<Tick>, running: Arc<AtomicBool>, config: FeedConfig) {
    let mut sequence = 0u64;
    let mut next_at = Instant::now();

    while running.load(Ordering::SeqCst) {
        if config.max_ticks.is_some_and(|max| sequence >= max) {
            break;
        }

        let now = Instant::now();
        if now < next_at {
            thread::sleep((next_at - now).min(POLL_STEP));
            continue;
        }

        let tick = Tick {
            sequence,
            at: Utc::now(),
        };
        match sender.try_send(tick) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(sequence, "tick channel full, dropping tick");
            }
            Err(TrySendError::Disconnected(_)) => break,
        }

        sequence += 1;
        next_at += config.interval;
    }

    tracing::debug!(ticks = sequence, "tick feed stopped");
}
