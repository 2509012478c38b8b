/*
 * space has the vector and matrix types everything else is written in
 * camera turns world points into pixels
 * scn has the parametric shapes that make up a scene
 * renderer draws them as wireframes
 *
*/
pub mod space;
pub mod error;
pub mod camera;
pub mod scn;
pub mod renderer;

pub use crate::camera::{Camera, CameraBasis, CameraConfig, FrustumBounds, TransformMatrices};
pub use crate::error::{CameraError, RenderError, SceneError};
