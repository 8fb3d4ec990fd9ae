use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use fisheye_3d::linalg::IDENTITY_MAT33;
use fisheye_image::Image;
use fisheye_imgproc::{
    calibration::{fisheye::FisheyeDistortion, rectify::init_undistort_rectify_map, CameraIntrinsic},
    interpolation::{remap, BorderMode, InterpolationMode},
};

fn bench_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("Remap");

    let distortion = FisheyeDistortion {
        k1: 0.0517522,
        k2: -0.0267777,
        k3: 0.01933738,
        k4: -0.0052901,
    };

    for (width, height) in [(320, 240), (640, 480), (1280, 960)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image = Image::<u8, 3>::new(image_size, vec![0u8; width * height * 3]).unwrap();
        let image_f32 = image.cast::<f32>().unwrap();
        let output = Image::<f32, 3>::from_size_val(image_size, 0.0).unwrap();

        let intrinsic = CameraIntrinsic {
            fx: *width as f64 * 0.28,
            fy: *width as f64 * 0.28,
            cx: *width as f64 / 2.0,
            cy: *height as f64 / 2.0,
        };
        let (map_x, map_y) = init_undistort_rectify_map(
            &intrinsic,
            &distortion,
            &IDENTITY_MAT33,
            &CameraIntrinsic {
                fx: intrinsic.fx * 0.5,
                fy: intrinsic.fy * 0.5,
                ..intrinsic
            },
            image_size,
        )
        .unwrap();

        for (name, mode) in [
            ("bilinear", InterpolationMode::Bilinear),
            ("nearest", InterpolationMode::Nearest),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, &parameter_string),
                &(&image_f32, &output),
                |b, i| {
                    let (src, mut dst) = (i.0.clone(), i.1.clone());
                    b.iter(|| {
                        remap(
                            black_box(&src),
                            black_box(&mut dst),
                            black_box(&map_x),
                            black_box(&map_y),
                            mode,
                            BorderMode::Constant(0.0),
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_remap);
criterion_main!(benches);
