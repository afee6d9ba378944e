use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use coupled::LockCoupledList;
use std::sync::Mutex;
use std::thread;

const SEED_LEN: u64 = 256;
const INSERTS_PER_THREAD: u64 = 512;

/// Same landing rule as `LockCoupledList::insert`, behind one global lock.
fn locked_vec_insert(vec: &Mutex<Vec<u64>>, value: u64, pos: usize) {
    let mut guard = vec.lock().unwrap();
    let idx = pos.max(1).min(guard.len());
    guard.insert(idx, value);
}

fn position(thread: u64, i: u64) -> usize {
    // Spread writers over the whole seeded prefix.
    ((thread * 61 + i * 17) % SEED_LEN) as usize
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_single_thread");
    group.throughput(Throughput::Elements(INSERTS_PER_THREAD));

    group.bench_function("lock_coupled_list", |b| {
        b.iter(|| {
            let list: LockCoupledList<u64> = (0..SEED_LEN).collect();
            for i in 0..INSERTS_PER_THREAD {
                list.insert(i, position(0, i));
            }
            black_box(list.len());
        });
    });

    group.bench_function("mutex_vec", |b| {
        b.iter(|| {
            let vec = Mutex::new((0..SEED_LEN).collect::<Vec<_>>());
            for i in 0..INSERTS_PER_THREAD {
                locked_vec_insert(&vec, i, position(0, i));
            }
            black_box(vec.lock().unwrap().len());
        });
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_contended");
    group.sample_size(20);

    for threads in [2_u64, 4, 8] {
        group.throughput(Throughput::Elements(threads * INSERTS_PER_THREAD));

        group.bench_with_input(BenchmarkId::new("lock_coupled_list", threads), &threads, |b, &threads| {
            b.iter(|| {
                let list: LockCoupledList<u64> = (0..SEED_LEN).collect();
                thread::scope(|s| {
                    for t in 0..threads {
                        let list = &list;
                        s.spawn(move || {
                            for i in 0..INSERTS_PER_THREAD {
                                list.insert(i, position(t, i));
                            }
                        });
                    }
                });
                black_box(list.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("mutex_vec", threads), &threads, |b, &threads| {
            b.iter(|| {
                let vec = Mutex::new((0..SEED_LEN).collect::<Vec<_>>());
                thread::scope(|s| {
                    for t in 0..threads {
                        let vec = &vec;
                        s.spawn(move || {
                            for i in 0..INSERTS_PER_THREAD {
                                locked_vec_insert(vec, i, position(t, i));
                            }
                        });
                    }
                });
                black_box(vec.lock().unwrap().len());
            });
        });
    }

    group.finish();
}

fn bench_read_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_walk");
    let list: LockCoupledList<u64> = (0..1_000).collect();

    group.bench_function("to_vec_1000", |b| {
        b.iter(|| black_box(list.to_vec()));
    });

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_contended, bench_read_walk);
criterion_main!(benches);
