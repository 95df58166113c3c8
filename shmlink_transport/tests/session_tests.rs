//! End-to-end sessions over real System V objects, one thread per role.

mod common;

use common::{ChunkRecorder, GENEROUS, TestKeys, payload};
use proptest::prelude::*;
use shmlink_common::keys::SemaphoreKind;
use shmlink_transport::{Semaphore, TransferStats, run_consumer, run_producer};
use std::thread;
use std::time::Duration;

fn transfer(keys: &TestKeys, input: &[u8]) -> (TransferStats, TransferStats, ChunkRecorder) {
    let consumer_config = keys.config(GENEROUS);
    let consumer = thread::spawn(move || {
        let mut sink = ChunkRecorder::default();
        let stats = run_consumer(&consumer_config, &mut sink).expect("consumer session");
        (stats, sink)
    });

    let mut source = input;
    let sent = run_producer(&keys.config(GENEROUS), &mut source).expect("producer session");
    let (received, sink) = consumer.join().expect("consumer thread");
    (sent, received, sink)
}

#[test]
fn empty_source_finishes_cleanly() {
    let keys = TestKeys::new();
    let (sent, received, sink) = transfer(&keys, &[]);

    assert_eq!(sent, TransferStats::default());
    assert_eq!(received, TransferStats::default());
    assert!(sink.data.is_empty());
    assert!(sink.writes.is_empty());
    assert!(sink.flushed);
}

#[test]
fn hundred_forty_bytes_arrive_as_56_56_28() {
    let keys = TestKeys::new();
    let input = payload(140, 7);
    let (sent, received, sink) = transfer(&keys, &input);

    assert_eq!(sink.writes, vec![56, 56, 28]);
    assert_eq!(sink.data, input);
    assert_eq!(sent, TransferStats { chunks: 3, bytes: 140 });
    assert_eq!(received, sent);
}

#[test]
fn exact_multiple_of_payload_capacity() {
    let keys = TestKeys::new();
    let input = payload(56 * 4, 11);
    let (sent, _, sink) = transfer(&keys, &input);

    assert_eq!(sink.writes, vec![56; 4]);
    assert_eq!(sink.data, input);
    assert_eq!(sent.chunks, 4);
}

#[test]
fn large_stream_keeps_order() {
    let keys = TestKeys::new();
    let input = payload(10_000, 3);
    let (sent, received, sink) = transfer(&keys, &input);

    assert_eq!(sink.data, input);
    assert_eq!(sent.chunks, 10_000u64.div_ceil(56));
    assert_eq!(received.chunks, sent.chunks);
    assert!(sink.writes.iter().all(|&n| n > 0 && n <= 56));
}

#[test]
fn producer_may_start_before_consumer() {
    let keys = TestKeys::new();
    let input = payload(300, 5);

    let producer_config = keys.config(GENEROUS);
    let producer_input = input.clone();
    let producer = thread::spawn(move || {
        let mut source = producer_input.as_slice();
        run_producer(&producer_config, &mut source)
    });

    thread::sleep(Duration::from_millis(200));
    let mut sink = ChunkRecorder::default();
    run_consumer(&keys.config(GENEROUS), &mut sink).expect("consumer session");
    producer.join().expect("producer thread").expect("producer session");

    assert_eq!(sink.data, input);
}

#[test]
fn consumer_may_start_before_producer() {
    let keys = TestKeys::new();
    let input = payload(300, 9);

    let consumer_config = keys.config(GENEROUS);
    let consumer = thread::spawn(move || {
        let mut sink = ChunkRecorder::default();
        run_consumer(&consumer_config, &mut sink).map(|_| sink.data)
    });

    thread::sleep(Duration::from_millis(200));
    let mut source = input.as_slice();
    run_producer(&keys.config(GENEROUS), &mut source).expect("producer session");
    let output = consumer.join().expect("consumer thread").expect("consumer session");

    assert_eq!(output, input);
}

#[test]
fn stale_finished_signals_are_cleared_at_session_start() {
    let keys = TestKeys::new();
    let finished = Semaphore::open(&keys.keys(), SemaphoreKind::Finished).unwrap();
    for _ in 0..3 {
        finished.post().unwrap();
    }
    assert_eq!(finished.value().unwrap(), 3);

    let input = payload(60, 1);
    let (_, _, sink) = transfer(&keys, &input);

    assert_eq!(sink.data, input);
    assert_eq!(finished.value().unwrap(), 0);
}

#[test]
fn consecutive_sessions_reuse_the_same_objects() {
    let keys = TestKeys::new();
    for seed in 0..3 {
        let input = payload(100 + seed as usize, seed);
        let (_, _, sink) = transfer(&keys, &input);
        assert_eq!(sink.data, input);
    }

    let slot_has_data = Semaphore::open(&keys.keys(), SemaphoreKind::SlotHasData).unwrap();
    let slot_is_free = Semaphore::open(&keys.keys(), SemaphoreKind::SlotIsFree).unwrap();
    assert_eq!(slot_has_data.value().unwrap(), 0);
    assert_eq!(slot_is_free.value().unwrap(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn output_equals_input(input in proptest::collection::vec(any::<u8>(), 0..600)) {
        let keys = TestKeys::new();
        let (sent, received, sink) = transfer(&keys, &input);

        prop_assert_eq!(&sink.data, &input);
        prop_assert_eq!(sent, received);
        prop_assert_eq!(sent.bytes, input.len() as u64);
        prop_assert!(sink.writes.iter().all(|&n| n > 0 && n <= 56));
    }
}
