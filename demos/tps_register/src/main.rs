use argh::FromArgs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use thermoreg::image::{Image, ImageSize};
use thermoreg::imgproc::{
    blend::overlay,
    interpolation::InterpolationMode,
    resize::{fit_within, resize, DEFAULT_CANVAS_SIZE},
};
use thermoreg::tps::{landmarks::denormalize, Point2d, TpsWarper, WarpConfig, WarpRequest};

#[derive(FromArgs)]
/// Register a moving image onto a reference image from landmark pairs
struct Args {
    /// path to the moving (e.g. thermal) image
    #[argh(option, short = 's')]
    source: PathBuf,

    /// path to the reference (e.g. rgb) image
    #[argh(option, short = 'r')]
    reference: PathBuf,

    /// path to the JSON file with the normalized landmark pairs
    #[argh(option, short = 'l')]
    landmarks: PathBuf,

    /// path of the warped output PNG
    #[argh(option, short = 'o', default = "PathBuf::from(\"registered.png\")")]
    output: PathBuf,

    /// optional path of an overlay PNG of the warped image over the reference
    #[argh(option)]
    overlay: Option<PathBuf>,

    /// opacity of the warped image in the overlay
    #[argh(option, default = "0.5")]
    opacity: f64,

    /// optional JSON warp configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

/// Landmarks as fractions of their image width and height.
#[derive(Deserialize, Debug)]
struct LandmarkFile {
    source_points: Vec<Point2d>,
    reference_points: Vec<Point2d>,
}

fn read_rgba(path: &Path) -> Result<Image<u8, 4>, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgba8();
    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };
    Ok(Image::new(size, img.into_raw())?)
}

fn write_rgba(path: &Path, img: Image<u8, 4>) -> Result<(), Box<dyn std::error::Error>> {
    let [width, height]: [u32; 2] = img.size().into();
    let buffer = image::RgbaImage::from_raw(width, height, img.into_vec())
        .ok_or("image buffer does not match its size")?;
    buffer.save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => WarpConfig::from_file(path)?,
        None => WarpConfig::default(),
    };

    let landmarks: LandmarkFile = serde_json::from_reader(std::fs::File::open(&args.landmarks)?)?;

    let source = read_rgba(&args.source)?;
    let reference = read_rgba(&args.reference)?;

    // the reference defines the working canvas, the moving image is stretched onto it
    let (canvas_size, scale) = fit_within(reference.size(), DEFAULT_CANVAS_SIZE);
    log::info!(
        "reference {} fitted to {} (scale {:.3})",
        reference.size(),
        canvas_size,
        scale
    );

    let mut moving = Image::<u8, 4>::from_size_val(canvas_size, 0)?;
    resize(&source, &mut moving, InterpolationMode::Bilinear)?;

    let source_points = denormalize(&landmarks.source_points, canvas_size);
    let reference_points = denormalize(&landmarks.reference_points, canvas_size);

    let cancel = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let cancel = cancel.clone();
        move || {
            println!("Received Ctrl-C signal. Cancelling the warp.");
            cancel.store(true, Ordering::SeqCst);
        }
    })?;

    let warper = TpsWarper::new(config);
    let request = WarpRequest::new(&moving, &source_points, &reference_points, canvas_size)?;
    let output = warper.warp_cancellable(&request, &cancel)?;

    // the individual warnings are already logged by the fit
    log::info!(
        "fit residual {:e}, {} warning(s)",
        output.quality.residual,
        output.quality.warnings.len()
    );

    if let Some(overlay_path) = &args.overlay {
        let mut base = Image::<u8, 4>::from_size_val(canvas_size, 0)?;
        resize(&reference, &mut base, InterpolationMode::Bilinear)?;

        let mut blended = Image::<u8, 4>::from_size_val(canvas_size, 0)?;
        overlay(&base, &output.image, args.opacity, &mut blended)?;
        write_rgba(overlay_path, blended)?;
        println!("Wrote overlay to {}", overlay_path.display());
    }

    write_rgba(&args.output, output.image)?;
    println!("Wrote registered image to {}", args.output.display());

    Ok(())
}
