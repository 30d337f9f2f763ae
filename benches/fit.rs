use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use medoids::{Algorithm, KMedoids};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::hint::black_box;

/// Four well-separated Gaussian blobs, `n / 4` points each.
fn blobs(n: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(1234);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let centers = [[0.0, 0.0], [12.0, 0.0], [0.0, 12.0], [12.0, 12.0]];
    let mut data = Array2::zeros((n, 2));
    for i in 0..n {
        let c = centers[i % 4];
        data[[i, 0]] = c[0] + noise.sample(&mut rng);
        data[[i, 1]] = c[1] + noise.sample(&mut rng);
    }
    data
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);

    for &n in &[200usize, 800usize] {
        let data = blobs(n);
        for (name, algorithm) in [
            ("banditpam", Algorithm::BanditPam),
            ("fastpam1", Algorithm::FastPam1),
            ("naive", Algorithm::Pam),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, n),
                &data,
                |b, data| {
                    b.iter(|| {
                        let mut model = KMedoids::new(4).with_algorithm(algorithm);
                        model.fit(black_box(data.view())).unwrap();
                        black_box(model.loss());
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_fit);
criterion_main!(benches);
