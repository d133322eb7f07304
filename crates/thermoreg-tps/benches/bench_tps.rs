use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use thermoreg_image::Image;
use thermoreg_imgproc::parallel::ExecutionStrategy;
use thermoreg_tps::{Correspondences, GaussianSolver, Point2d, SvdSolver, TpsWarper, WarpConfig};

fn random_landmarks(n: usize, width: f64, height: f64, seed: u64) -> (Vec<Point2d>, Vec<Point2d>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let target: Vec<Point2d> = (0..n)
        .map(|_| Point2d::new(rng.random_range(0.0..width), rng.random_range(0.0..height)))
        .collect();
    let source = target
        .iter()
        .map(|p| Point2d::new(p.x + rng.random_range(-8.0..8.0), p.y + rng.random_range(-8.0..8.0)))
        .collect();
    (source, target)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("TpsFit");

    for n in [4, 16, 64] {
        let (source, target) = random_landmarks(n, 800.0, 600.0, 42);
        let correspondences = Correspondences::new(source, target).unwrap();

        let svd = TpsWarper::with_solver(WarpConfig::default(), SvdSolver::default());
        let gauss = TpsWarper::with_solver(WarpConfig::default(), GaussianSolver::default());

        group.bench_with_input(BenchmarkId::new("svd", n), &correspondences, |b, c| {
            b.iter(|| black_box(svd.fit(black_box(c))))
        });
        group.bench_with_input(BenchmarkId::new("gaussian", n), &correspondences, |b, c| {
            b.iter(|| black_box(gauss.fit(black_box(c))))
        });
    }
    group.finish();
}

fn bench_warp(c: &mut Criterion) {
    let mut group = c.benchmark_group("TpsWarp");
    group.sample_size(20);

    for (width, height) in [(320, 240), (800, 600)] {
        group.throughput(criterion::Throughput::Elements((width * height) as u64));
        let parameter_string = format!("{}x{}", width, height);

        let image = Image::<u8, 4>::from_size_val([width, height].into(), 128).unwrap();
        let (source, target) = random_landmarks(12, width as f64, height as f64, 7);

        for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::ParallelRows] {
            let warper = TpsWarper::new(WarpConfig {
                strategy,
                ..Default::default()
            });
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), &parameter_string),
                &image,
                |b, img| {
                    b.iter(|| {
                        black_box(warper.warp(img, &source, &target, img.size()).unwrap())
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_fit, bench_warp);
criterion_main!(benches);
