//! Ordering, retention and budget properties of the per-core event log,
//! exercised with real worker threads.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Barrier,
    },
    thread,
};

use veridian_klog::{
    device::dev_read,
    query::sys_getklog,
    worker::{self, ThreadWorker},
    Arg, FixedCore, KlogConfig, KlogDevice, KlogEngine, KlogEntry, Severity, RECORD_SIZE,
};

fn engine(cores: usize, capacity: usize) -> KlogEngine {
    KlogEngine::new(KlogConfig::new(cores).with_ring_capacity(capacity)).unwrap()
}

fn seqs(entries: &[KlogEntry]) -> Vec<u32> {
    entries.iter().map(|e| e.seq).collect()
}

/// Index parsed back out of a "n=<i>" message.
fn index_of(entry: &KlogEntry) -> u32 {
    entry.message().trim_start_matches("n=").parse().unwrap()
}

#[test]
fn sequences_are_unique_and_monotonic_per_core() {
    const CORES: usize = 4;
    const PER_CORE: i32 = 50;
    let engine = engine(CORES, 64);

    thread::scope(|s| {
        for core in 0..CORES {
            let engine = &engine;
            s.spawn(move || {
                worker::bind_current_thread(core);
                for i in 0..PER_CORE {
                    engine.record(&ThreadWorker, Severity::Debug, "n=%d", &[Arg::Int(i)]);
                }
            });
        }
    });

    let snapshot = engine.collect(1024);
    assert_eq!(snapshot.len(), CORES * PER_CORE as usize);

    let distinct: HashSet<u32> = snapshot.iter().map(|e| e.seq).collect();
    assert_eq!(distinct.len(), snapshot.len());

    let mut per_core: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for entry in &snapshot {
        per_core.entry(entry.cpu).or_default().push(index_of(entry));
    }
    // Snapshot is in sequence order, so each core's indices must come out in
    // call order.
    for (core, indices) in per_core {
        assert_eq!(indices, (0..PER_CORE as u32).collect::<Vec<_>>(), "core {}", core);
    }
}

#[test]
fn wraparound_keeps_only_the_last_ring_full() {
    let engine = engine(1, 256);
    let cpu0 = FixedCore::new(0);
    for i in 0..300 {
        engine.record(&cpu0, Severity::Info, "n=%d", &[Arg::Int(i)]);
    }

    let snapshot = engine.collect(256);
    assert_eq!(seqs(&snapshot), (44..300).collect::<Vec<_>>());
    assert_eq!(engine.collect(1000), snapshot);
    assert_eq!(engine.dropped(), 44);
}

#[test]
fn budget_is_spent_in_core_order() {
    let engine = engine(2, 16);
    for i in 0..10 {
        engine.record(&FixedCore::new(1), Severity::Info, "n=%d", &[Arg::Int(i)]);
        engine.record(&FixedCore::new(0), Severity::Info, "n=%d", &[Arg::Int(i)]);
    }

    let snapshot = engine.collect(12);
    let core0: Vec<&KlogEntry> = snapshot.iter().filter(|e| e.cpu == 0).collect();
    let core1: Vec<u32> = snapshot
        .iter()
        .filter(|e| e.cpu == 1)
        .map(index_of)
        .collect();

    assert_eq!(core0.len(), 10);
    assert_eq!(core1, [0, 1]);
    assert!(snapshot.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[test]
fn consecutive_reads_are_identical() {
    let engine = engine(3, 8);
    for i in 0..20 {
        engine.record(&FixedCore::new(i % 3), Severity::Warn, "x", &[]);
    }
    let first = engine.collect(10);
    let second = engine.collect(10);
    assert_eq!(seqs(&first), seqs(&second));
    assert_eq!(first, second);
}

#[test]
fn long_messages_keep_the_first_63_bytes() {
    let engine = engine(1, 4);
    let text: String = "0123456789".repeat(8);
    assert_eq!(text.len(), 80);

    engine.record(&FixedCore::new(0), Severity::Error, "%s", &[Arg::Str(&text)]);
    let entry = engine.collect(1)[0];
    assert_eq!(entry.message(), &text[..63]);
    assert_eq!(entry.message_bytes().len(), 63);
}

#[test]
fn contended_cores_produce_a_gapless_range() {
    let engine = engine(2, 16);
    let start = Barrier::new(2);

    thread::scope(|s| {
        for core in 0..2 {
            let (engine, start) = (&engine, &start);
            s.spawn(move || {
                worker::bind_current_thread(core);
                start.wait();
                for i in 0..5 {
                    engine.record(&ThreadWorker, Severity::Info, "n=%d", &[Arg::Int(i)]);
                }
            });
        }
    });

    let snapshot = engine.collect(16);
    assert_eq!(seqs(&snapshot), (0..10).collect::<Vec<_>>());
    assert_eq!(snapshot.iter().filter(|e| e.cpu == 0).count(), 5);
    assert_eq!(snapshot.iter().filter(|e| e.cpu == 1).count(), 5);
}

#[test]
fn snapshots_taken_during_writes_stay_sorted() {
    let engine = engine(3, 32);
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        let writers: Vec<_> = (0..3)
            .map(|core| {
                let engine = &engine;
                s.spawn(move || {
                    worker::bind_current_thread(core);
                    for i in 0..2000 {
                        engine.record(&ThreadWorker, Severity::Debug, "n=%d", &[Arg::Int(i)]);
                    }
                })
            })
            .collect();

        let reader = s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                let snapshot = engine.collect(64);
                assert!(snapshot.len() <= 64);
                assert!(snapshot.windows(2).all(|w| w[0].seq < w[1].seq));
            }
        });

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        reader.join().unwrap();
    });

    assert_eq!(engine.next_sequence(), 6000);
}

#[test]
fn subjects_follow_the_worker() {
    let engine = engine(2, 8);
    thread::scope(|s| {
        s.spawn(|| {
            worker::bind_current_thread(1);
            engine.record(&ThreadWorker, Severity::Info, "kernel", &[]);
            worker::set_subject(42);
            engine.record(&ThreadWorker, Severity::Info, "task", &[]);
            worker::unbind_current_thread();
            engine.record(&ThreadWorker, Severity::Info, "lost", &[]);
        });
    });

    let snapshot = engine.collect(8);
    let seen: Vec<(&str, u32, u32)> = snapshot
        .iter()
        .map(|e| (e.message(), e.cpu, e.pid))
        .collect();
    assert_eq!(seen, [("kernel", 1, 0), ("task", 1, 42)]);
}

#[test]
fn query_and_device_agree_with_collect() {
    let engine = engine(2, 16);
    for i in 0..7 {
        engine.record(&FixedCore::new(i % 2), Severity::Info, "n=%d", &[Arg::Int(i as i32)]);
    }
    let expected = engine.collect(7);

    let mut mem = vec![0u8; 7 * RECORD_SIZE];
    assert_eq!(sys_getklog(&engine, &mut mem, 0, 7), 7);
    let via_query: Vec<KlogEntry> = KlogEntry::decode_all(&mem).collect();
    assert_eq!(via_query, expected);

    let dev = KlogDevice::new(&engine);
    let mut buf = vec![0u8; 3 * RECORD_SIZE + 5];
    assert_eq!(dev_read(&dev, 0, &mut buf), (3 * RECORD_SIZE) as isize);
    let via_device: Vec<KlogEntry> = KlogEntry::decode_all(&buf).collect();
    assert_eq!(via_device, expected[..3]);
}
