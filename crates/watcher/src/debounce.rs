//! Event stage between the OS watcher and the event loop
//!
//! The default stage forwards every raw event untouched. A coalescing stage
//! can be swapped in to absorb editor save bursts; neither the translator nor
//! the sync loop notice the difference.

use crate::{WatchEvent, WatchMessage};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

/// A transformation applied to the merged watch stream
pub trait EventStage: Send {
    /// Consume the raw stream and return the stream the event loop reads
    fn attach(self: Box<Self>, input: UnboundedReceiver<WatchMessage>) -> UnboundedReceiver<WatchMessage>;
}

/// Identity stage: every raw event is applied individually
pub struct Passthrough;

impl EventStage for Passthrough {
    fn attach(self: Box<Self>, input: UnboundedReceiver<WatchMessage>) -> UnboundedReceiver<WatchMessage> {
        input
    }
}

/// Longest a buffered event may wait, in windows
const MAX_WAIT_WINDOWS: u32 = 10;

/// Time-window coalescing stage
///
/// Buffers events until `window` passes without a new one, then flushes the
/// last event seen for each path, ordered by last occurrence. A path that
/// keeps changing cannot hold the buffer back forever: once the oldest
/// buffered event has waited ten windows the buffer is flushed anyway. A
/// watch error flushes the buffer and is forwarded right behind it. Must be
/// attached from within a tokio runtime.
///
/// Buffering widens the race between a directory appearing and its watch
/// being installed, since registration only happens once the burst is flushed.
pub struct Coalescing {
    window: Duration,
    max_wait: Duration,
}

impl Coalescing {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            max_wait: window.saturating_mul(MAX_WAIT_WINDOWS),
        }
    }
}

impl EventStage for Coalescing {
    fn attach(self: Box<Self>, mut input: UnboundedReceiver<WatchMessage>) -> UnboundedReceiver<WatchMessage> {
        let (tx, rx) = unbounded_channel();
        let Coalescing { window, max_wait } = *self;

        tokio::spawn(async move {
            let mut pending: Vec<WatchEvent> = Vec::new();
            // Arrival of the oldest buffered event
            let mut oldest: Option<Instant> = None;

            loop {
                // None: input closed; Some(None): a deadline passed
                let next = match oldest {
                    None => input.recv().await.map(Some),
                    Some(first) => {
                        let deadline = (Instant::now() + window).min(first + max_wait);
                        match timeout_at(deadline, input.recv()).await {
                            Ok(message) => message.map(Some),
                            Err(_) => Some(None),
                        }
                    }
                };

                match next {
                    Some(Some(WatchMessage::Event(event))) => {
                        oldest.get_or_insert_with(Instant::now);
                        pending.retain(|p| p.path != event.path);
                        pending.push(event);
                    }
                    Some(Some(error @ WatchMessage::Error(_))) => {
                        oldest = None;
                        if !flush(&tx, &mut pending) || tx.send(error).is_err() {
                            return;
                        }
                    }
                    Some(None) => {
                        oldest = None;
                        if !flush(&tx, &mut pending) {
                            return;
                        }
                    }
                    None => {
                        flush(&tx, &mut pending);
                        return;
                    }
                }
            }
        });

        rx
    }
}

/// Send buffered events in order; false once the receiver is gone
fn flush(tx: &UnboundedSender<WatchMessage>, pending: &mut Vec<WatchEvent>) -> bool {
    if !pending.is_empty() {
        debug!("Flushing {} coalesced events", pending.len());
    }
    pending
        .drain(..)
        .all(|event| tx.send(WatchMessage::Event(event)).is_ok())
}

/// Pick the stage for a configured window (zero means passthrough)
pub fn stage_for(window: Duration) -> Box<dyn EventStage> {
    if window.is_zero() {
        Box::new(Passthrough)
    } else {
        Box::new(Coalescing::new(window))
    }
}
