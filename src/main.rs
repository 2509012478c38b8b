use std::f64::consts::FRAC_PI_2;
use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;
use thiserror::Error;

use wirecam::renderer;
use wirecam::scn::*;
use wirecam::space::*;
use wirecam::{Camera, CameraConfig, CameraError, RenderError};

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("can't write {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("png encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}

/// Renders a wireframe scene through a synthetic pinhole camera.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Output image path.
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,
    #[arg(long, default_value_t = 512)]
    width: u32,
    #[arg(long, default_value_t = 512)]
    height: u32,
    /// Eye position as `x,y,z`.
    #[arg(long, value_parser = parse_vec3, default_value = "0,0,10")]
    eye: Vec3,
    /// Look-at point as `x,y,z`.
    #[arg(long, value_parser = parse_vec3, default_value = "0,0,0")]
    target: Vec3,
    /// Up vector as `x,y,z`.
    #[arg(long, value_parser = parse_vec3, default_value = "0,1,0")]
    up: Vec3,
    #[arg(long, default_value_t = 10.0)]
    near: f64,
    #[arg(long, default_value_t = 50.0)]
    far: f64,
    /// Field of view in degrees.
    #[arg(long, default_value_t = 90.0)]
    fov: f64,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts = s.split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("{:?}: {}", p, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected three comma separated numbers, got {:?}", s)),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn demo_scene() -> Scene {
    let stand_up = Mat4::rotation_x(-FRAC_PI_2);
    Scene {
        objects: vec![
            ParametricObject::plane(16.0, 16.0)
                .with_transform(Mat4::translation(-8.0, -8.0, -20.0)),
            ParametricObject::cone(6.0, 3.0)
                .with_transform(Mat4::translation(-4.0, -2.0, -5.0) * stand_up),
            ParametricObject::cylinder(6.0, 2.0)
                .with_transform(Mat4::translation(4.0, -3.0, -5.0) * stand_up),
            ParametricObject::circle(3.0)
                .with_transform(Mat4::translation(0.0, 4.0, -8.0)),
        ],
        background: Color::BLACK,
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let t0 = Instant::now();
    let camera = Camera::new(CameraConfig {
        up: args.up,
        eye: args.eye,
        target: args.target,
        near_plane: args.near,
        far_plane: args.far,
        fov_degrees: args.fov,
        window_width: args.width as f64,
        window_height: args.height as f64,
        ..CameraConfig::default()
    })?;
    let raster = renderer::render(&demo_scene(), &camera)?;

    let io_err = |source| AppError::Io { path: args.output.clone(), source };
    let file = fs::File::create(&args.output).map_err(io_err)?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, raster.width() as u32, raster.height() as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(raster.data())?;
    writer.finish()?;

    info!("wrote {} in {}s", args.output.display(), t0.elapsed().as_secs_f32());
    Ok(())
}
