use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use varflow_image::Image;
use varflow_imgproc::parallel::ExecutionStrategy;
use varflow_imgproc::warp::{WarpBorder, WarpedImage};
use varflow_optflow::linearize::LinearSystem;
use varflow_optflow::{
    coarse2fine_flow, ConjugateGradient, FlowField, FlowParams, FlowSolver, SolverKind,
    SuccessiveOverRelaxation,
};

fn frame(size: [usize; 2], shift: f64) -> Image<f64, 1> {
    Image::<f64, 1>::from_size_fn(size.into(), |x, y, _| {
        let (x, y) = (x as f64 - shift, y as f64);
        0.5 + 0.2 * (x * 0.11).sin() * (y * 0.07).cos() + 0.1 * ((x + y) * 0.05).cos()
    })
    .unwrap()
}

fn bench_coarse2fine(c: &mut Criterion) {
    let mut group = c.benchmark_group("Coarse2FineFlow");
    group.sample_size(10);

    for (width, height) in [(128, 96), (256, 192)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);
        let image1 = frame([*width, *height], 0.0);
        let image2 = frame([*width, *height], 1.5);

        for solver in [
            SolverKind::ConjugateGradient,
            SolverKind::SuccessiveOverRelaxation,
        ] {
            let params = FlowParams::for_solver(solver);
            group.bench_with_input(
                BenchmarkId::new(solver.to_string(), &parameter_string),
                &(&image1, &image2),
                |b, i| {
                    let (image1, image2) = *i;
                    b.iter(|| {
                        black_box(coarse2fine_flow(image1.view(), image2.view(), &params))
                            .unwrap();
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("FlowSolver");

    for (width, height) in [(128, 96), (256, 192)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);
        let image1 = frame([*width, *height], 0.0);
        let image2 = frame([*width, *height], 0.5);
        let flow = FlowField::zeros(image1.size()).unwrap();
        let derivatives = WarpedImage::compute(
            &image1,
            &image2,
            flow.u(),
            flow.v(),
            WarpBorder::Replicate,
            ExecutionStrategy::Serial,
        )
        .unwrap();
        let zero = Image::<f64, 1>::from_size_val(image1.size(), 0.0).unwrap();
        let system =
            LinearSystem::build(&derivatives, &flow, &zero, &zero, &FlowParams::default())
                .unwrap();

        let solvers: [&dyn FlowSolver; 2] = [
            &ConjugateGradient::default(),
            &SuccessiveOverRelaxation::default(),
        ];
        for solver in solvers {
            group.bench_with_input(
                BenchmarkId::new(solver.name(), &parameter_string),
                &system,
                |b, system| {
                    let mut du = vec![0.0; system.len()];
                    let mut dv = vec![0.0; system.len()];
                    b.iter(|| {
                        du.fill(0.0);
                        dv.fill(0.0);
                        black_box(solver.solve(system, 20, &mut du, &mut dv)).unwrap();
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_coarse2fine, bench_solvers);
criterion_main!(benches);
