use thiserror::Error;

/// Failures of the camera pipeline.
#[derive(Debug,Clone,PartialEq,Error)]
pub enum CameraError {
    /// The eye/target/up triple doesn't define a camera frame.
    #[error("invalid camera pose: {0}")]
    InvalidPose(String),
    /// Near/far planes, field of view or window size out of range.
    #[error("invalid frustum: {0}")]
    InvalidFrustum(String),
    /// The homogeneous divisor was zero, or close enough to it.
    #[error("degenerate projection: w = {w} is too close to zero for a perspective divide")]
    DegenerateProjection { w: f64 },
}

#[derive(Debug,Clone,PartialEq,Error)]
pub enum SceneError {
    #[error("invalid sampling: {0}")]
    InvalidSampling(String),
}

#[derive(Debug,Clone,PartialEq,Error)]
pub enum RenderError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("a projection worker panicked")]
    WorkerPanicked,
    #[error("a {width}x{height} raster is too large to allocate")]
    RasterTooLarge { width: f64, height: f64 },
}
