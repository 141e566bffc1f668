//! Depth frames, the pinhole projection that turns them into world points, and the
//! `DepthSource` seam the frame loop polls.

use crate::error::FrameError;
use glam::Vec3;

/// A single camera pixel. `depth` is in millimetres, 0 means no return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepthSample {
    pub depth: u16,
    pub color: [u8; 3],
}

impl DepthSample {
    pub fn is_valid(&self) -> bool {
        self.depth > 0
    }
}

/// One full raster of depth readings with a registered color per pixel.
///
/// Samples are stored row-major: index = `row * width + col`.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    depth: Vec<u16>,
    color: Vec<[u8; 3]>,
}

impl DepthFrame {
    /// An all-invalid frame (every depth 0, every color black).
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            depth: vec![0; width * height],
            color: vec![[0; 3]; width * height],
        }
    }

    /// Wraps raw sensor buffers, checking both match the raster size.
    pub fn from_parts(
        width: usize,
        height: usize,
        depth: Vec<u16>,
        color: Vec<[u8; 3]>,
    ) -> Result<Self, FrameError> {
        let expected = width * height;
        if depth.len() != expected {
            return Err(FrameError::DepthLength {
                expected,
                actual: depth.len(),
            });
        }
        if color.len() != expected {
            return Err(FrameError::ColorLength {
                expected,
                actual: color.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            color,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reads the sample at (`col`, `row`). Panics when out of bounds, like slice indexing.
    pub fn sample(&self, col: usize, row: usize) -> DepthSample {
        let i = row * self.width + col;
        DepthSample {
            depth: self.depth[i],
            color: self.color[i],
        }
    }

    pub fn set(&mut self, col: usize, row: usize, sample: DepthSample) {
        let i = row * self.width + col;
        self.depth[i] = sample.depth;
        self.color[i] = sample.color;
    }

    /// Invalidates every pixel without reallocating.
    pub fn clear(&mut self) {
        self.depth.fill(0);
        self.color.fill([0; 3]);
    }

    pub fn depth_buffer(&self) -> &[u16] {
        &self.depth
    }
}

/// Pinhole intrinsics used to unproject depth pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    /// Kinect v1 depth camera at its native 640x480 resolution.
    pub const KINECT_V1: Self = Self {
        fx: 594.21,
        fy: 591.04,
        cx: 339.5,
        cy: 242.7,
    };

    const KINECT_BASE_WIDTH: f32 = 640.0;
    const KINECT_BASE_HEIGHT: f32 = 480.0;

    /// Kinect intrinsics rescaled for a raster of `width` x `height`.
    pub fn kinect_for(width: usize, height: usize) -> Self {
        let sx = width as f32 / Self::KINECT_BASE_WIDTH;
        let sy = height as f32 / Self::KINECT_BASE_HEIGHT;
        Self {
            fx: Self::KINECT_V1.fx * sx,
            fy: Self::KINECT_V1.fy * sy,
            cx: Self::KINECT_V1.cx * sx,
            cy: Self::KINECT_V1.cy * sy,
        }
    }

    /// World coordinate (millimetres, camera at the origin looking down +Z).
    pub fn unproject(&self, col: usize, row: usize, depth_mm: u16) -> Vec3 {
        let z = depth_mm as f32;
        Vec3::new(
            (col as f32 - self.cx) * z / self.fx,
            (row as f32 - self.cy) * z / self.fy,
            z,
        )
    }
}

/// Anything that can hand the frame loop depth rasters.
///
/// Driver-specific code (libfreenect, recordings, simulators) lives behind this.
pub trait DepthSource: Send {
    /// Whether a sensor is attached at all. When false the frame loop skips scanning.
    fn is_connected(&self) -> bool;

    /// Advances the sensor and returns a frame only if a new one arrived since the
    /// previous call.
    fn poll_frame(&mut self) -> Option<&DepthFrame>;

    fn intrinsics(&self) -> Intrinsics;
}

/// The absent sensor: never connected, never produces frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSensor;

impl DepthSource for NoSensor {
    fn is_connected(&self) -> bool {
        false
    }

    fn poll_frame(&mut self) -> Option<&DepthFrame> {
        None
    }

    fn intrinsics(&self) -> Intrinsics {
        Intrinsics::KINECT_V1
    }
}
