use cellar_lexicon::{FrequencyMap, StringPool};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> Vec<u8> {
    format!("k{:016x}", n).into_bytes()
}

// Token-like stream: 100k draws over a 5k vocabulary, so most interns hit.
fn token_stream(seed: u64) -> Vec<Vec<u8>> {
    let vocabulary: Vec<Vec<u8>> = lcg(seed).take(5_000).map(key).collect();
    let n = vocabulary.len();
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..100_000)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            vocabulary[(s as usize) % n].clone()
        })
        .collect()
}

fn bench_intern_fresh_100k(c: &mut Criterion) {
    let keys: Vec<_> = lcg(1).take(100_000).map(key).collect();
    c.bench_function("pool::intern_fresh_100k", |b| {
        b.iter_batched(
            StringPool::new,
            |mut pool| {
                for k in &keys {
                    black_box(pool.intern(k));
                }
                black_box(pool)
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("hashbrown::intern_fresh_100k", |b| {
        b.iter_batched(
            hashbrown::HashSet::<Box<[u8]>>::new,
            |mut set| {
                for k in &keys {
                    black_box(set.get_or_insert_with(&k[..], |k| k.into()));
                }
                black_box(set)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_intern_stream_100k(c: &mut Criterion) {
    let stream = token_stream(2);
    c.bench_function("pool::intern_stream_100k_of_5k", |b| {
        b.iter_batched(
            StringPool::new,
            |mut pool| {
                for t in &stream {
                    black_box(pool.intern(t));
                }
                black_box(pool)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_count_stream_100k(c: &mut Criterion) {
    let stream = token_stream(3);
    let mut pool = StringPool::new();
    for t in &stream {
        pool.intern(t);
    }
    let handles: Vec<&[u8]> = stream.iter().filter_map(|t| pool.get(t)).collect();
    c.bench_function("map::count_stream_100k_of_5k", |b| {
        b.iter(|| {
            let mut counts = FrequencyMap::new();
            for &h in &handles {
                let prev = counts.get(h);
                counts.put(h, prev + 1);
            }
            black_box(counts.len())
        })
    });
    c.bench_function("hashbrown::count_stream_100k_of_5k", |b| {
        b.iter(|| {
            let mut counts: hashbrown::HashMap<&[u8], u32> = hashbrown::HashMap::new();
            for &h in &handles {
                *counts.entry(h).or_insert(0) += 1;
            }
            black_box(counts.len())
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("pool::find_miss_10k_on_100k", |b| {
        let mut pool = StringPool::new();
        for x in lcg(11).take(100_000) {
            pool.intern(&key(x));
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(pool.get(&k));
            }
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_intern;
    config = bench_config();
    targets = bench_intern_fresh_100k, bench_intern_stream_100k
}
criterion_group! {
    name = benches_lookup;
    config = bench_config();
    targets = bench_count_stream_100k, bench_find_miss_10k
}
criterion_main!(benches_intern, benches_lookup);
