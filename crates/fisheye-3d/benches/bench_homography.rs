use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use std::hint::black_box;

use fisheye_3d::pose;

fn bench_find_homography(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_homography");
    let mut rng = rand::rng();

    let homo = [[0.9, 0.05, 10.0], [-0.02, 1.1, -4.0], [1e-4, -2e-4, 1.0]];

    for num_points in [4, 48, 512].iter() {
        let src = (0..*num_points)
            .map(|_| [rng.random_range(0.0..1280.0), rng.random_range(0.0..960.0)])
            .collect::<Vec<[f64; 2]>>();
        let dst = src
            .iter()
            .filter_map(|p| pose::apply_homography(&homo, p))
            .collect::<Vec<_>>();

        group.bench_with_input(
            BenchmarkId::new("dlt", num_points),
            &(src, dst),
            |b, (src, dst)| b.iter(|| black_box(pose::find_homography(src, dst))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_find_homography);
criterion_main!(benches);
