// src/engine/completion.rs

//! Single-delivery completion signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::RunOutcome;

/// Once-only completion channel shared by every branch of a run.
///
/// The sender lives behind a mutex as an `Option`; whoever takes it first
/// delivers, every later attempt finds `None` and does nothing. That covers
/// the end marker racing a cancellation path, or several cancellation paths
/// racing each other.
#[derive(Debug)]
pub(crate) struct CompletionSignal {
    sender: Mutex<Option<oneshot::Sender<RunOutcome>>>,
    cancelled: AtomicBool,
}

impl CompletionSignal {
    pub(crate) fn new() -> (Self, oneshot::Receiver<RunOutcome>) {
        let (tx, rx) = oneshot::channel();
        let signal = Self {
            sender: Mutex::new(Some(tx)),
            cancelled: AtomicBool::new(false),
        };
        (signal, rx)
    }

    /// Deliver `outcome` unless something was already delivered.
    ///
    /// Returns `true` only for the call that actually delivered.
    pub(crate) fn deliver(&self, outcome: RunOutcome) -> bool {
        let mut slot = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        send_once(&mut slot, outcome)
    }

    /// Mark the run as cancelled and deliver `outcome` if nothing was
    /// delivered yet.
    pub(crate) fn cancel_and_signal_done(&self, outcome: RunOutcome) -> bool {
        self.cancelled.store(true, Ordering::Release);
        self.deliver(outcome)
    }

    /// Cancel `token` and deliver `outcome` as one step.
    ///
    /// The token is cancelled while the slot is locked, so a branch that sees
    /// the cancellation cannot deliver ahead of `outcome`, and a waiter
    /// receiving `outcome` always finds the token cancelled.
    pub(crate) fn cancel_token_and_signal_done(
        &self,
        token: &CancellationToken,
        outcome: RunOutcome,
    ) -> bool {
        self.cancelled.store(true, Ordering::Release);
        let mut slot = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        send_once(&mut slot, outcome)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn is_delivered(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

fn send_once(slot: &mut Option<oneshot::Sender<RunOutcome>>, outcome: RunOutcome) -> bool {
    match slot.take() {
        Some(tx) => {
            if tx.send(outcome).is_err() {
                debug!("completion receiver already dropped; outcome discarded");
            }
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[tokio::test]
    async fn first_delivery_wins() {
        let (signal, rx) = CompletionSignal::new();

        assert!(signal.deliver(RunOutcome::Succeeded));
        assert!(!signal.cancel_and_signal_done(RunOutcome::Cancelled));

        assert_eq!(rx.await.unwrap(), RunOutcome::Succeeded);
        assert!(signal.is_delivered());
        // The flag still records that a cancellation path fired.
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn failure_cancels_token_before_waiter_sees_it() {
        let (signal, rx) = CompletionSignal::new();
        let token = CancellationToken::new();

        let failed = RunOutcome::Failed {
            node: "a".to_string(),
            error: "boom".to_string(),
        };
        assert!(signal.cancel_token_and_signal_done(&token, failed.clone()));
        assert!(!signal.cancel_and_signal_done(RunOutcome::Cancelled));

        assert_eq!(rx.await.unwrap(), failed);
        assert!(token.is_cancelled());
        assert!(signal.is_cancelled());
    }

    #[test]
    fn normal_delivery_leaves_cancelled_flag_clear() {
        let (signal, _rx) = CompletionSignal::new();
        assert!(!signal.is_delivered());
        signal.deliver(RunOutcome::Succeeded);
        assert!(!signal.is_cancelled());
    }

    #[test]
    fn concurrent_deliveries_are_observed_once() {
        for _ in 0..50 {
            let (signal, mut rx) = CompletionSignal::new();
            let signal = Arc::new(signal);
            let winners = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let signal = Arc::clone(&signal);
                    let winners = Arc::clone(&winners);
                    thread::spawn(move || {
                        let delivered = if i % 2 == 0 {
                            signal.deliver(RunOutcome::Succeeded)
                        } else {
                            signal.cancel_and_signal_done(RunOutcome::Cancelled)
                        };
                        if delivered {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }

            assert_eq!(winners.load(Ordering::SeqCst), 1);
            assert!(rx.try_recv().is_ok());
            assert!(rx.try_recv().is_err());
        }
    }
}
