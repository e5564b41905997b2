//! Cycle scheduling and cooperative shutdown

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

/// Drives the delay between monitoring cycles
///
/// Abstracted so tests can run many cycles without real sleeps.
#[async_trait]
pub trait CycleScheduler: Send {
    async fn wait_until_next_tick(&mut self);
}

/// Fixed-delay scheduler backed by the tokio timer
pub struct IntervalScheduler {
    period: Duration,
}

impl IntervalScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

#[async_trait]
impl CycleScheduler for IntervalScheduler {
    async fn wait_until_next_tick(&mut self) {
        tokio::time::sleep(self.period).await;
    }
}

/// Receiving side of the shutdown signal
///
/// The monitor checks it between products and races it against the
/// inter-cycle sleep, so a cycle in progress still persists before the
/// loop stops.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

/// Triggering side, held by the Ctrl-C handler
pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

/// Create a linked shutdown handle/signal pair
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownHandle { sender }, ShutdownSignal { receiver })
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has been requested
    pub async fn triggered(&mut self) {
        // a dropped sender also counts as a shutdown request
        let _ = self.receiver.wait_for(|stop| *stop).await;
    }
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.sender.send(true);
    }
}
