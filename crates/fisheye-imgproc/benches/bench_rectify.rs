use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use std::hint::black_box;

use fisheye_3d::linalg::IDENTITY_MAT33;
use fisheye_image::ImageSize;
use fisheye_imgproc::calibration::{
    fisheye::{undistort_points, FisheyeDistortion, TermCriteria},
    rectify::{estimate_new_camera_matrix_for_undistort_rectify, init_undistort_rectify_map},
    CameraIntrinsic,
};

fn lens() -> (CameraIntrinsic, FisheyeDistortion) {
    (
        CameraIntrinsic {
            fx: 355.67876243,
            fy: 354.84207135,
            cx: 638.84520097,
            cy: 480.89256853,
        },
        FisheyeDistortion {
            k1: 0.0517522,
            k2: -0.0267777,
            k3: 0.01933738,
            k4: -0.0052901,
        },
    )
}

fn bench_rectify_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("init_undistort_rectify_map");
    let (k, d) = lens();
    let image_size = ImageSize {
        width: 1280,
        height: 960,
    };

    for scale in [0.5, 1.0, 2.0].iter() {
        let new_size = image_size.scaled(*scale);
        let new_k = estimate_new_camera_matrix_for_undistort_rectify(
            &k,
            &d,
            image_size,
            &IDENTITY_MAT33,
            1.0,
            new_size,
            1.0,
        )
        .unwrap();

        let parameter_string = format!("{}x{}", new_size.width, new_size.height);
        group.bench_with_input(
            BenchmarkId::new("fisheye", &parameter_string),
            &new_k,
            |b, new_k| {
                b.iter(|| {
                    black_box(init_undistort_rectify_map(
                        &k,
                        &d,
                        &IDENTITY_MAT33,
                        new_k,
                        new_size,
                    ))
                })
            },
        );
    }
    group.finish();
}

fn bench_undistort_points(c: &mut Criterion) {
    let (k, d) = lens();
    let mut rng = rand::rng();
    let points = (0..10_000)
        .map(|_| [rng.random_range(200.0..1080.0), rng.random_range(150.0..810.0)])
        .collect::<Vec<[f64; 2]>>();

    c.bench_function("undistort_points_10k", |b| {
        b.iter(|| {
            black_box(undistort_points(
                black_box(&points),
                &k,
                &d,
                None,
                None,
                TermCriteria::default(),
            ))
        })
    });
}

criterion_group!(benches, bench_rectify_map, bench_undistort_points);
criterion_main!(benches);
