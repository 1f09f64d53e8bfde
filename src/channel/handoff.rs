//! Single-slot handoff channel.
//!
//! The channel holds at most one pending value. Each [`send`](HandoffChannel::send)
//! replaces whatever is pending, so a receiver only ever observes the most
//! recent value and never a backlog. Each send wakes exactly one blocked
//! receiver; a value is consumed by exactly one receive.
//!
//! Delivery is not guaranteed: a value that is overwritten before anyone
//! receives it is lost.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::ChannelError;

/// Slot contents guarded by the channel mutex.
#[derive(Debug)]
struct Slot<T> {
    pending: Option<T>,
    closed: bool,
}

/// Thread-safe single-slot channel where only the newest value matters.
///
/// `send` never blocks. `receive` blocks until a value is pending or the
/// channel is closed. Share it between threads behind an `Arc`.
#[derive(Debug)]
pub struct HandoffChannel<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Default for HandoffChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandoffChannel<T> {
    /// Creates an empty, open channel.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    // A panic while holding the lock cannot leave the slot half-updated:
    // every mutation is a single field assignment.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `value`, discarding any unconsumed pending value, and wakes
    /// one waiting receiver.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the channel has been closed; the
    /// value is dropped.
    pub fn send(&self, value: T) -> Result<(), ChannelError> {
        let mut slot = self.lock();
        if slot.closed {
            return Err(ChannelError::Closed);
        }
        slot.pending = Some(value);
        drop(slot);
        self.ready.notify_one();
        Ok(())
    }

    /// Blocks until a value is pending, then removes and returns it.
    ///
    /// Waits indefinitely while the channel is open and empty.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] once the channel is closed and no
    /// value is pending.
    pub fn receive(&self) -> Result<T, ChannelError> {
        let slot = self.lock();
        let mut slot = self
            .ready
            .wait_while(slot, |s| s.pending.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        slot.pending.take().ok_or(ChannelError::Closed)
    }

    /// Like [`receive`](Self::receive) but gives up after `timeout`.
    ///
    /// Returns `Ok(None)` if no value arrived in time.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] once the channel is closed and no
    /// value is pending.
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<T>, ChannelError> {
        let slot = self.lock();
        let (mut slot, _) = self
            .ready
            .wait_timeout_while(slot, timeout, |s| s.pending.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        match slot.pending.take() {
            Some(value) => Ok(Some(value)),
            None if slot.closed => Err(ChannelError::Closed),
            None => Ok(None),
        }
    }

    /// Takes the pending value without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] once the channel is closed and no
    /// value is pending.
    pub fn try_receive(&self) -> Result<Option<T>, ChannelError> {
        let mut slot = self.lock();
        match slot.pending.take() {
            Some(value) => Ok(Some(value)),
            None if slot.closed => Err(ChannelError::Closed),
            None => Ok(None),
        }
    }

    /// Closes the channel and wakes every blocked receiver.
    ///
    /// A value still pending at close time is delivered to the next receive.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        drop(slot);
        self.ready.notify_all();
    }

    /// Returns `true` if a value is waiting to be received.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_new_channel_is_empty_and_open() {
        let channel: HandoffChannel<u32> = HandoffChannel::new();
        assert!(!channel.has_pending());
        assert!(!channel.is_closed());
        assert_eq!(channel.try_receive(), Ok(None));
    }

    #[test]
    fn test_send_then_receive() {
        let channel = HandoffChannel::new();
        channel.send(7).unwrap();
        assert!(channel.has_pending());
        assert_eq!(channel.receive(), Ok(7));
        assert!(!channel.has_pending());
    }

    #[test]
    fn test_latest_send_wins() {
        let channel = HandoffChannel::new();
        channel.send("first").unwrap();
        channel.send("second").unwrap();
        assert_eq!(channel.receive(), Ok("second"));
        assert_eq!(channel.try_receive(), Ok(None));
    }

    #[test]
    fn test_receive_timeout_on_empty_channel() {
        let channel: HandoffChannel<u8> = HandoffChannel::new();
        let result = channel.receive_timeout(Duration::from_millis(20));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_receive_blocks_until_send() {
        let channel = Arc::new(HandoffChannel::new());
        let receiver = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.receive())
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!receiver.is_finished());

        channel.send(42).unwrap();
        assert_eq!(receiver.join().unwrap(), Ok(42));
    }

    #[test]
    fn test_close_wakes_all_receivers() {
        let channel: Arc<HandoffChannel<u32>> = Arc::new(HandoffChannel::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || channel.receive())
            })
            .collect();

        thread::sleep(Duration::from_millis(30));
        channel.close();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Err(ChannelError::Closed));
        }
    }

    #[test]
    fn test_send_after_close_fails() {
        let channel = HandoffChannel::new();
        channel.close();
        assert_eq!(channel.send(1), Err(ChannelError::Closed));
        assert!(!channel.has_pending());
    }

    #[test]
    fn test_pending_value_survives_close() {
        let channel = HandoffChannel::new();
        channel.send(5).unwrap();
        channel.close();
        assert_eq!(channel.receive(), Ok(5));
        assert_eq!(channel.receive(), Err(ChannelError::Closed));
        assert_eq!(
            channel.receive_timeout(Duration::from_millis(1)),
            Err(ChannelError::Closed)
        );
    }

    #[test]
    fn test_one_send_feeds_exactly_one_receiver() {
        let channel = Arc::new(HandoffChannel::new());
        let (done_tx, done_rx) = mpsc::channel();

        for _ in 0..2 {
            let channel = Arc::clone(&channel);
            let done_tx = done_tx.clone();
            thread::spawn(move || {
                let _ = done_tx.send(channel.receive());
            });
        }

        thread::sleep(Duration::from_millis(30));
        channel.send(9).unwrap();

        assert_eq!(
            done_rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            Ok(9)
        );
        assert!(
            done_rx.recv_timeout(Duration::from_millis(100)).is_err(),
            "second receiver must stay blocked"
        );

        // Release the remaining receiver.
        channel.close();
        assert_eq!(
            done_rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            Err(ChannelError::Closed)
        );
    }
}
