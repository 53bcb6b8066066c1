//! Single-assignment resolution shared by racing tasks.
//!
//! Any number of tasks may call [`Resolver::resolve`]; the first call wins,
//! delivers its value to the one-shot receiver and raises the stop signal.
//! Every later call is a no-op that returns `false`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{oneshot, watch};

#[derive(Debug)]
pub struct Resolver<T> {
    done: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<T>>>,
    stop: watch::Sender<bool>,
}

impl<T> Resolver<T> {
    pub fn new() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let (stop, _) = watch::channel(false);
        let resolver = Arc::new(Self {
            done: AtomicBool::new(false),
            sender: Mutex::new(Some(tx)),
            stop,
        });
        (resolver, rx)
    }

    /// Resolve with `value`. Returns whether this call won.
    pub fn resolve(&self, value: T) -> bool {
        if self.done.swap(true, Ordering::AcqRel) {
            return false;
        }
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(value);
        }
        self.stop.send_replace(true);
        true
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(self.stop.subscribe())
    }
}

/// Observer side of a stop flag.
///
/// A dropped sender counts as stopped.
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow() || self.0.has_changed().is_err()
    }

    /// Wait until stopped.
    pub async fn wait(&mut self) {
        let _ = self.0.wait_for(|stopped| *stopped).await;
    }
}

/// A stop flag not tied to a resolver.
pub fn stop_channel() -> (watch::Sender<bool>, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (tx, StopSignal(rx))
}
