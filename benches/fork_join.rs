use criterion::{criterion_group, criterion_main, Criterion};
use crevs::{fork, Versioned};
use rand::Rng;
use std::time::Duration;

fn cell_read_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("** crevs::versioned::Versioned **");
    group
        .measurement_time(Duration::from_secs(3))
        .sample_size(10);

    let v = Versioned::initialized(0_u64);
    let mut i = 0_u64;
    group.bench_function(" write ", |b| {
        b.iter(|| {
            i += 1;
            v.set(i).unwrap();
        })
    });

    group.bench_function(" read ", |b| b.iter(|| v.get()));

    let mut rng = rand::thread_rng();
    let cells = (0..64)
        .map(|n| Versioned::initialized(n as u64))
        .collect::<Vec<_>>();
    group.bench_function(" random read/write ", |b| {
        b.iter(|| {
            let n: usize = rng.gen_range(0..cells.len());
            cells[n].set(rng.gen::<u64>()).unwrap();
            cells[n].get()
        })
    });
    group.finish();
}

fn fork_join_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("** crevs::revision **");
    group
        .measurement_time(Duration::from_secs(3))
        .sample_size(10);

    let v = Versioned::initialized(0_u64);
    group.bench_function(" fork + join ", |b| {
        b.iter(|| {
            let vr = v.clone();
            let r = fork(move || {
                vr.set(1).unwrap();
            })
            .unwrap();
            r.join().unwrap();
        })
    });
    group.finish();
}

criterion_group!(benches, cell_read_write, fork_join_cycle);
criterion_main!(benches);
