use std::time::Instant;

use log::{info, trace};

use crate::camera::Camera;
use crate::error::RenderError;
use crate::scn::*;
use crate::space::*;

/// Largest raster, in pixels, that `Raster::new` will allocate.
pub const MAX_RASTER_PIXELS: usize = 1 << 26;

/// An RGB8 pixel buffer, row 0 at the top.
#[derive(Clone,Debug,PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize, background: Color) -> Result<Raster, RenderError> {
        let pixels = width.checked_mul(height)
            .filter(|&n| n <= MAX_RASTER_PIXELS)
            .ok_or(RenderError::RasterTooLarge { width: width as f64, height: height as f64 })?;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&[background.r, background.g, background.b]);
        }
        Ok(Raster { width, height, data })
    }
    /// Sized to the camera window, rounded to whole pixels the same way
    /// projected points are.
    pub fn for_camera(camera: &Camera, background: Color) -> Result<Raster, RenderError> {
        let (width, height) = (camera.width().round(), camera.height().round());
        if width * height > MAX_RASTER_PIXELS as f64 {
            return Err(RenderError::RasterTooLarge { width: camera.width(), height: camera.height() });
        }
        Raster::new(width as usize, height as usize, background)
    }
    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn data(&self) -> &[u8] { &self.data }
    pub fn into_data(self) -> Vec<u8> { self.data }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some((y as usize * self.width + x as usize) * 3)
    }
    /// Pixels outside the raster are ignored.
    pub fn put(&mut self, x: i64, y: i64, color: Color) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 3].copy_from_slice(&[color.r, color.g, color.b]);
        }
    }
    pub fn get(&self, x: i64, y: i64) -> Option<Color> {
        self.offset(x, y).map(|i| Color::new(self.data[i], self.data[i + 1], self.data[i + 2]))
    }
    /// Whether `p` lies within one raster size of the raster. Segments to points
    /// further out are not drawn.
    pub fn reaches(&self, p: (i64,i64)) -> bool {
        let (w, h) = (self.width as i64, self.height as i64);
        p.0 >= -w && p.0 < 2 * w && p.1 >= -h && p.1 < 2 * h
    }
    /// Bresenham line, both endpoints included.
    pub fn line(&mut self, from: (i64,i64), to: (i64,i64), color: Color) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, color);
            if (x, y) == to { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }
}

pub type PixelGrid = Vec<Vec<Option<(i64,i64)>>>;

/// Samples `obj` and maps every point to a pixel. Points the camera can't
/// divide are `None`.
pub fn project(obj: &ParametricObject, camera: &Camera) -> Result<PixelGrid, RenderError> {
    let grid = obj.sample()?;
    Ok(grid.into_iter()
        .map(|row| row.into_iter()
            .map(|p| match camera.world_to_pixel(p) {
                Ok(px) => Some((px.x.round() as i64, px.y.round() as i64)),
                Err(e) => {
                    trace!("skipping {:?}: {}", p, e);
                    None
                }
            })
            .collect())
        .collect())
}

fn reachable(raster: &Raster, px: Option<&Option<(i64,i64)>>) -> Option<(i64,i64)> {
    px.copied().flatten().filter(|&p| raster.reaches(p))
}

fn draw_grid(raster: &mut Raster, grid: &PixelGrid, color: Color) {
    for (i, row) in grid.iter().enumerate() {
        for j in 0..row.len() {
            let Some(px) = reachable(raster, row.get(j)) else { continue };
            if let Some(right) = reachable(raster, row.get(j + 1)) {
                raster.line(px, right, color);
            }
            if let Some(below) = reachable(raster, grid.get(i + 1).and_then(|r| r.get(j))) {
                raster.line(px, below, color);
            }
        }
    }
}

/// Draws every object of `scene` as a wireframe seen through `camera`.
pub fn render(scene: &Scene, camera: &Camera) -> Result<Raster, RenderError> {
    let t0 = Instant::now();
    let grids = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = scene.objects.iter()
            .map(|obj| s.spawn(move |_| project(obj, camera)))
            .collect();
        handles.into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(RenderError::WorkerPanicked)))
            .collect::<Result<Vec<_>, _>>()
    }).map_err(|_| RenderError::WorkerPanicked)??;
    info!("projected {} objects in {}s", grids.len(), t0.elapsed().as_secs_f32());

    let mut raster = Raster::for_camera(camera, scene.background)?;
    for (obj, grid) in scene.objects.iter().zip(&grids) {
        draw_grid(&mut raster, grid, obj.color);
    }
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraConfig;

    #[test]
    fn lines_cover_both_endpoints() {
        let mut r = Raster::new(8, 8, Color::BLACK).unwrap();
        r.line((1, 1), (6, 3), Color::WHITE);
        assert_eq!(r.get(1, 1), Some(Color::WHITE));
        assert_eq!(r.get(6, 3), Some(Color::WHITE));
        assert_eq!(r.get(0, 7), Some(Color::BLACK));
        r.line((5, 7), (5, 0), Color::WHITE);
        assert!((0..8).all(|y| r.get(5, y) == Some(Color::WHITE)));
    }

    #[test]
    fn out_of_bounds_pixels_are_skipped() {
        let mut r = Raster::new(4, 4, Color::BLACK).unwrap();
        r.line((-10, 2), (10, 2), Color::WHITE);
        assert!((0..4).all(|x| r.get(x, 2) == Some(Color::WHITE)));
        assert_eq!(r.get(4, 2), None);
        assert_eq!(r.data().len(), 4 * 4 * 3);
    }

    #[test]
    fn far_off_segments_are_dropped() {
        let mut r = Raster::new(4, 4, Color::BLACK).unwrap();
        let grid: PixelGrid = vec![vec![Some((1, 1)), Some((1_000_000_000, 1))]];
        draw_grid(&mut r, &grid, Color::WHITE);
        assert_eq!(r.get(2, 1), Some(Color::BLACK));
        assert!(r.reaches((-4, 7)));
        assert!(!r.reaches((8, 0)));
    }

    #[test]
    fn oversized_windows_are_refused() {
        let camera = Camera::new(CameraConfig { window_width: 1e10, window_height: 1e10, ..CameraConfig::default() }).unwrap();
        let scene = Scene { objects: vec![], background: Color::BLACK };
        assert!(matches!(render(&scene, &camera), Err(RenderError::RasterTooLarge { .. })));
        assert!(matches!(
            Raster::new(usize::MAX, 2, Color::BLACK),
            Err(RenderError::RasterTooLarge { .. })
        ));
    }

    #[test]
    fn fractional_windows_round_like_pixels() {
        let camera = Camera::new(CameraConfig { window_width: 512.7, window_height: 100.2, ..CameraConfig::default() }).unwrap();
        let raster = Raster::for_camera(&camera, Color::BLACK).unwrap();
        assert_eq!((raster.width(), raster.height()), (513, 100));
        let scene = Scene { objects: vec![], background: Color::BLACK };
        assert_eq!(render(&scene, &camera).unwrap().width(), 513);
    }

    #[test]
    fn renders_a_plane_facing_the_camera() {
        let camera = Camera::new(CameraConfig::default()).unwrap();
        let plane = ParametricObject::plane(10.0, 10.0)
            .with_transform(Mat4::translation(-5.0, -5.0, 0.0))
            .with_color(Color::WHITE);
        let scene = Scene { objects: vec![plane], background: Color::BLACK };
        let raster = render(&scene, &camera).unwrap();
        assert_eq!((raster.width(), raster.height()), (512, 512));
        // the plane spans pixels 128..=384 both ways; its center is a grid vertex
        assert_eq!(raster.get(256, 256), Some(Color::WHITE));
        assert_eq!(raster.get(128, 128), Some(Color::WHITE));
        assert_eq!(raster.get(384, 384), Some(Color::WHITE));
        assert_eq!(raster.get(10, 10), Some(Color::BLACK));
    }

    #[test]
    fn points_on_the_eye_plane_are_skipped() {
        let camera = Camera::new(CameraConfig::default()).unwrap();
        let plane = ParametricObject::plane(2.0, 2.0).with_transform(Mat4::translation(0.0, 0.0, 10.0));
        let grid = project(&plane, &camera).unwrap();
        assert!(grid.iter().flatten().all(|px| px.is_none()));
    }

    #[test]
    fn sampling_errors_surface() {
        let camera = Camera::new(CameraConfig::default()).unwrap();
        let bad = ParametricObject::plane(1.0, 1.0).with_sampling((0.0, 1.0), (0.0, 1.0), (0.0, 0.1));
        let scene = Scene { objects: vec![bad], background: Color::BLACK };
        assert!(matches!(render(&scene, &camera), Err(RenderError::Scene(_))));
    }
}
