//! Cooperative stop signal for the polling loop.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Requests a stop. Cheap to clone into a Ctrl+C handler.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    pub fn stop(&self) {
        // A full channel already holds a pending stop.
        let _ = self.tx.try_send(());
    }
}

/// Observed by the loop between ticks and during the inter-poll wait.
///
/// Once a stop is seen it stays latched. Dropping every [`StopHandle`]
/// also counts as a stop.
#[derive(Debug)]
pub struct StopSignal {
    rx: Receiver<()>,
    stopped: AtomicBool,
}

impl StopSignal {
    /// Check without blocking.
    pub fn is_stopped(&self) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return true;
        }
        match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => self.latch(),
            Err(TryRecvError::Empty) => false,
        }
    }

    /// Wait up to `timeout` for a stop. Returns `true` if one arrived.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => self.latch(),
            Err(RecvTimeoutError::Timeout) => false,
        }
    }

    fn latch(&self) -> bool {
        self.stopped.store(true, Ordering::SeqCst);
        true
    }
}

/// Create a connected handle and signal.
pub fn stop_pair() -> (StopHandle, StopSignal) {
    let (tx, rx) = bounded(1);
    (
        StopHandle { tx },
        StopSignal {
            rx,
            stopped: AtomicBool::new(false),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_stop_latches() {
        let (handle, signal) = stop_pair();
        assert!(!signal.is_stopped());

        handle.stop();
        handle.stop();
        assert!(signal.is_stopped());
        assert!(signal.is_stopped());
        assert!(signal.wait(Duration::from_secs(5)));
    }

    #[test]
    fn test_wait_times_out_without_stop() {
        let (_handle, signal) = stop_pair();
        let started = Instant::now();
        assert!(!signal.wait(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_stop_from_another_thread_wakes_wait() {
        let (handle, signal) = stop_pair();
        let worker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.stop();
        });

        assert!(signal.wait(Duration::from_secs(5)));
        worker.join().unwrap();
    }

    #[test]
    fn test_dropped_handle_counts_as_stop() {
        let (handle, signal) = stop_pair();
        drop(handle);
        assert!(signal.is_stopped());
    }
}
