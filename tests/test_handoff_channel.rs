use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use phaselight::channel::HandoffChannel;
use phaselight::error::ChannelError;
use proptest::prelude::*;

proptest! {
    #[test]
    fn last_send_wins(values in proptest::collection::vec(any::<u32>(), 1..32)) {
        let channel = HandoffChannel::new();
        for v in &values {
            channel.send(*v).unwrap();
        }
        prop_assert_eq!(channel.receive().unwrap(), *values.last().unwrap());
        prop_assert_eq!(channel.try_receive().unwrap(), None);
    }
}

#[test]
fn receive_after_overwrite_returns_latest() {
    let channel = HandoffChannel::new();
    channel.send("red").unwrap();
    channel.send("green").unwrap();
    channel.send("red").unwrap();
    assert_eq!(channel.receive().unwrap(), "red");
    assert!(!channel.has_pending());
}

#[test]
fn blocked_receiver_gets_value_sent_later() {
    let channel = Arc::new(HandoffChannel::new());
    let rx = Arc::clone(&channel);
    let handle = thread::spawn(move || rx.receive());

    thread::sleep(Duration::from_millis(50));
    channel.send(7_u8).unwrap();

    assert_eq!(handle.join().unwrap(), Ok(7));
}

#[test]
fn one_send_releases_exactly_one_of_many_receivers() {
    let channel = Arc::new(HandoffChannel::<u8>::new());
    let delivered = Arc::new(AtomicUsize::new(0));

    let receivers: Vec<_> = (0..4)
        .map(|_| {
            let channel = Arc::clone(&channel);
            let delivered = Arc::clone(&delivered);
            thread::spawn(move || {
                if channel.receive().is_ok() {
                    delivered.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    channel.send(1).unwrap();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(delivered.load(Ordering::SeqCst), 1);

    channel.close();
    for r in receivers {
        r.join().unwrap();
    }
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[test]
fn close_releases_blocked_receivers() {
    let channel = Arc::new(HandoffChannel::<u8>::new());
    let receivers: Vec<_> = (0..3)
        .map(|_| {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.receive())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    channel.close();

    for r in receivers {
        assert_eq!(r.join().unwrap(), Err(ChannelError::Closed));
    }
    assert_eq!(channel.send(1), Err(ChannelError::Closed));
}

#[test]
fn receive_timeout_expires_without_sender() {
    let channel = HandoffChannel::<u8>::new();
    let got = channel.receive_timeout(Duration::from_millis(20)).unwrap();
    assert_eq!(got, None);
}
