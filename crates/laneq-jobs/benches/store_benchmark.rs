//! Priority store benchmarks.
//!
//! ```bash
//! cargo bench --package laneq-jobs
//! cargo bench --package laneq-jobs -- dequeue
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use laneq_jobs::{Job, Priority, PriorityStore};

fn sample_job(i: usize) -> Job {
    Job::new("email", Priority::ALL[i % 3])
        .with_id(format!("job-{}", i))
        .with_payload("to", "user@example.com")
}

fn bench_enqueue_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_dequeue");

    for size in [100usize, 1_000, 10_000] {
        let jobs: Vec<Job> = (0..size).map(sample_job).collect();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &jobs, |b, jobs| {
            b.iter(|| {
                let store = PriorityStore::new();
                for job in jobs {
                    store.enqueue(job.clone());
                }
                while let Some(job) = store.dequeue() {
                    black_box(job);
                }
            });
        });
    }

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");

    for size in [100usize, 1_000] {
        let jobs: Vec<Job> = (0..size).map(sample_job).collect();

        group.bench_with_input(BenchmarkId::new("tail", size), &jobs, |b, jobs| {
            b.iter_batched(
                || {
                    let store = PriorityStore::new();
                    for job in jobs {
                        store.enqueue(job.clone());
                    }
                    store
                },
                |store| black_box(store.remove(&jobs[jobs.len() - 1])),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let store = PriorityStore::new();
    for i in 0..1_000 {
        store.enqueue(sample_job(i));
    }

    c.bench_function("list_all_1000", |b| b.iter(|| black_box(store.list_all())));
}

criterion_group!(benches, bench_enqueue_dequeue, bench_remove, bench_snapshot);
criterion_main!(benches);
