use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use schedsim::completion::completion_channel;
use schedsim::level::LevelTable;
use schedsim::process::ProcessRecord;
use schedsim::scheduler::{CpuSlot, Mlfq, RoundRobin, SchedulerPolicy, Sjf};

const TICK_MS: u64 = 10;

/// Records that never complete, so steady-state tick benchmarks keep a full
/// queue.
fn endless_records(
    count: u64,
    tx: &crossbeam_channel::Sender<schedsim::completion::CompletionEvent>,
) -> Vec<ProcessRecord> {
    (1..=count)
        .map(|pid| ProcessRecord::new(pid, u64::MAX, 0, tx.clone()))
        .collect()
}

fn bench_round_robin(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_robin");

    group.bench_function("tick_under_load", |b| {
        let (tx, _rx) = completion_channel(1024);
        let mut policy = RoundRobin::new(TICK_MS, 2);
        let mut slot = CpuSlot::new();
        policy.on_tick(0, endless_records(64, &tx), &mut slot);
        let mut now_ms = TICK_MS;

        b.iter(|| {
            policy.on_tick(black_box(now_ms), Vec::new(), &mut slot);
            now_ms += TICK_MS;
        });
    });

    group.finish();
}

fn bench_sjf(c: &mut Criterion) {
    let mut group = c.benchmark_group("sjf");

    group.bench_function("dispatch_scan_256", |b| {
        b.iter_batched(
            || {
                let (tx, rx) = completion_channel(1024);
                let arrivals: Vec<ProcessRecord> = (1..=256)
                    .map(|pid| ProcessRecord::new(pid, 1_000 + (pid * 37) % 500, 0, tx.clone()))
                    .collect();
                (Sjf::new(TICK_MS), CpuSlot::new(), arrivals, tx, rx)
            },
            |(mut policy, mut slot, arrivals, _tx, _rx)| {
                policy.on_tick(0, arrivals, &mut slot);
                black_box(slot.running_pid());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_mlfq(c: &mut Criterion) {
    let mut group = c.benchmark_group("mlfq");

    group.bench_function("tick_under_load", |b| {
        let (tx, _rx) = completion_channel(1024);
        let quanta = LevelTable::from_vec(vec![1, 2, 4]);
        let mut policy = Mlfq::new(TICK_MS, quanta, 100);
        let mut slot = CpuSlot::new();
        policy.on_tick(0, endless_records(64, &tx), &mut slot);
        let mut now_ms = TICK_MS;

        b.iter(|| {
            policy.on_tick(black_box(now_ms), Vec::new(), &mut slot);
            now_ms += TICK_MS;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_round_robin, bench_sjf, bench_mlfq);
criterion_main!(benches);
