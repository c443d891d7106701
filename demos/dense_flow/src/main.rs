use argh::FromArgs;
use std::path::{Path, PathBuf};

use varflow::image::{ops, Image, ImageSize};
use varflow::imgproc::color::gray_from_rgb;
use varflow::optflow::flo::write_flo;
use varflow::optflow::metrics::flow_statistics;
use varflow::optflow::{coarse2fine_flow, FlowParams, SolverKind};

#[derive(FromArgs)]
/// Estimate dense optical flow between consecutive frames of a sequence
struct Args {
    /// the linear solver, `cg` or `sor` (defaults to `cg`)
    #[argh(option)]
    method: Option<SolverKind>,

    /// the smoothness weight
    #[argh(option, short = 'a')]
    alpha: Option<f64>,

    /// the pyramid downsampling ratio
    #[argh(option, short = 'r')]
    ratio: Option<f64>,

    /// the width of the coarsest pyramid level
    #[argh(option, short = 'm')]
    min_width: Option<usize>,

    /// the number of outer fixed point iterations
    #[argh(option, short = 'o')]
    outer_iterations: Option<usize>,

    /// the number of inner fixed point iterations
    #[argh(option, short = 'i')]
    inner_iterations: Option<usize>,

    /// the number of linear solver iterations
    #[argh(option, short = 's')]
    solver_iterations: Option<usize>,

    /// convert the frames to grayscale first
    #[argh(switch)]
    gray: bool,

    /// a JSON file with the estimator parameters
    #[argh(option)]
    config: Option<PathBuf>,

    /// the prefix of the output files
    #[argh(option, default = "String::from(\"flow\")")]
    output: String,

    /// also write the warped second frame of every pair as PNG
    #[argh(switch)]
    save_warped: bool,

    /// the frames, at least two
    #[argh(positional)]
    images: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    if args.images.len() < 2 {
        return Err("at least two images are required".into());
    }

    let params = build_params(&args)?;
    params.validate()?;
    log::info!("parameters: {params:?}");

    let frames = args
        .images
        .iter()
        .map(|path| load_frame(path))
        .collect::<Result<Vec<_>, _>>()?;

    if args.gray {
        let gray = frames
            .iter()
            .map(|rgb| -> Result<Image<f64, 1>, Box<dyn std::error::Error>> {
                let mut gray = Image::<f64, 1>::from_size_val(rgb.size(), 0.0)?;
                gray_from_rgb(rgb, &mut gray, params.execution)?;
                Ok(gray)
            })
            .collect::<Result<Vec<_>, _>>()?;
        process(&gray, &params, &args)
    } else {
        process(&frames, &params, &args)
    }
}

fn build_params(args: &Args) -> Result<FlowParams, Box<dyn std::error::Error>> {
    let mut params = match &args.config {
        Some(path) => {
            let params: FlowParams = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            match args.method {
                Some(method) => params.with_solver(method),
                None => params,
            }
        }
        None => FlowParams::for_solver(args.method.unwrap_or_default()),
    };

    if let Some(alpha) = args.alpha {
        params = params.with_alpha(alpha);
    }
    if let Some(ratio) = args.ratio {
        params = params.with_ratio(ratio);
    }
    if let Some(min_width) = args.min_width {
        params = params.with_min_width(min_width);
    }
    if let Some(n) = args.outer_iterations {
        params = params.with_outer_iterations(n);
    }
    if let Some(n) = args.inner_iterations {
        params = params.with_inner_iterations(n);
    }
    if let Some(n) = args.solver_iterations {
        params = params.with_solver_iterations(n);
    }

    Ok(params)
}

fn load_frame(path: &Path) -> Result<Image<f64, 3>, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let size = ImageSize {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
    };
    let frame = Image::<u8, 3>::new(size, rgb.into_raw())?;
    Ok(ops::cast_and_scale::<u8, f64, 3>(&frame, 1.0 / 255.0)?)
}

fn process<const C: usize>(
    frames: &[Image<f64, C>],
    params: &FlowParams,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    for (k, pair) in frames.windows(2).enumerate() {
        let output = coarse2fine_flow(pair[0].view(), pair[1].view(), params)?;

        let stats = flow_statistics(&output.flow);
        log::info!(
            "pair {k}: mean ({:.3}, {:.3}), variance ({:.4}, {:.4}), max magnitude {:.3}",
            stats.mean_u,
            stats.mean_v,
            stats.variance_u,
            stats.variance_v,
            stats.max_magnitude
        );

        let flo_path = format!("{}_{k}.flo", args.output);
        write_flo(&flo_path, &output.flow)?;
        println!("Wrote {flo_path}");

        if args.save_warped {
            let png_path = format!("{}_{k}_warped.png", args.output);
            save_png(&output.warped, &png_path)?;
            println!("Wrote {png_path}");
        }
    }

    Ok(())
}

fn save_png<const C: usize>(
    frame: &Image<f64, C>,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let color = match C {
        1 => image::ColorType::L8,
        3 => image::ColorType::Rgb8,
        _ => return Err(format!("cannot save a {C} channel image as PNG").into()),
    };
    let bytes = frame
        .as_slice()
        .iter()
        .map(|&p| (p * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect::<Vec<_>>();
    image::save_buffer(
        path,
        &bytes,
        frame.width() as u32,
        frame.height() as u32,
        color,
    )?;
    Ok(())
}
