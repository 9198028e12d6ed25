use std::{
    env,
    path::{Path, PathBuf},
    time::Instant,
};

use image::ImageReader;
use tagquad::{GrayImageView, QuadDetectConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let config_path = parse_config_path()?;
    let cfg = QuadDetectConfig::load_json(&config_path)?;

    let img = load_image(Path::new(&cfg.image_path))?;
    let view = make_view(&img);

    let start = Instant::now();
    let report = cfg.run(&view);
    log::info!(
        target: "tagquad::detect_quads",
        "{} segments -> {} quads ({} decoded) in {} ms",
        cfg.segments.len(),
        report.quads.len(),
        report.quads.iter().filter(|q| q.code.is_some()).count(),
        start.elapsed().as_millis()
    );

    let output_path = cfg.output_path();
    report.write_json(&output_path)?;
    println!("wrote report JSON to {}", output_path.display());

    Ok(())
}

/// With the `tracing` feature, spans go to a `tracing` subscriber; set
/// `TAGQUAD_LOG_JSON` for JSON lines.
#[cfg(feature = "tracing")]
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    tagquad_core::init_tracing(env::var_os("TAGQUAD_LOG_JSON").is_some());
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    tagquad_core::init_with_level(tagquad_core::level_from_env(log::LevelFilter::Info))?;
    Ok(())
}

fn parse_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| "usage: detect_quads <config.json>".into())
}

fn load_image(path: &Path) -> Result<image::GrayImage, Box<dyn std::error::Error>> {
    Ok(ImageReader::open(path)?.decode()?.to_luma8())
}

fn make_view(img: &image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}
