//! Per-frame point-cloud rebuild and in-hoop point counting.

use crate::depth::{DepthFrame, Intrinsics};
use crate::error::ParseSettingError;
use crate::region::HoopRegion;
use glam::Vec3;
use std::fmt;
use std::str::FromStr;

/// Defines the per-point data handed to the renderer's vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct PointVertex {
    /// World position in millimetres.
    pub position: [f32; 3],
    /// RGBA, alpha always 255.
    pub color: [u8; 4],
}

/// The vertex buffer for the current frame. Rebuilt from scratch on every new
/// depth frame.
#[derive(Debug, Default, Clone)]
pub struct PointCloud {
    vertices: Vec<PointVertex>,
}

impl PointCloud {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn push(&mut self, position: Vec3, color: [u8; 3]) {
        self.vertices.push(PointVertex {
            position: position.to_array(),
            color: [color[0], color[1], color[2], 255],
        });
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    /// Raw bytes ready for a GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Open axis-aligned box. Points lying exactly on a face are outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn around(center: Vec3, half_extent: f32) -> Self {
        Self {
            min: center - Vec3::splat(half_extent),
            max: center + Vec3::splat(half_extent),
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpgt(self.min).all() && p.cmplt(self.max).all()
    }
}

/// Coordinate space the hoop box is tested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitSpace {
    /// (column, row, raw depth): matches hoops placed in window pixels.
    #[default]
    Pixel,
    /// Unprojected world coordinates.
    World,
}

impl FromStr for HitSpace {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pixel" => Ok(Self::Pixel),
            "world" => Ok(Self::World),
            _ => Err(ParseSettingError {
                kind: "hit space",
                value: s.to_owned(),
                expected: "pixel, world",
            }),
        }
    }
}

impl fmt::Display for HitSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pixel => "pixel",
            Self::World => "world",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    /// Valid-depth pixels turned into points.
    pub points: usize,
    /// Points that fell inside the hoop box.
    pub hit_count: usize,
}

/// Owns the frame's point buffer and performs the scan.
#[derive(Debug, Clone)]
pub struct PointCloudBuilder {
    space: HitSpace,
    cloud: PointCloud,
}

impl PointCloudBuilder {
    pub fn new(space: HitSpace) -> Self {
        Self {
            space,
            cloud: PointCloud::default(),
        }
    }

    pub fn space(&self) -> HitSpace {
        self.space
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Rebuilds the cloud from `frame` and counts points inside `region`.
    ///
    /// Pixels with zero depth produce no point and never count as hits. With no
    /// region (or an unplaced one) the cloud is still rebuilt but the count is 0.
    pub fn scan(
        &mut self,
        frame: &DepthFrame,
        intrinsics: &Intrinsics,
        region: Option<&HoopRegion>,
    ) -> ScanStats {
        self.cloud.clear();
        let bounds = region
            .filter(|r| r.is_placed())
            .map(|r| Aabb::around(r.center(), r.half_extent()));

        let mut hit_count = 0;
        for row in 0..frame.height() {
            for col in 0..frame.width() {
                let sample = frame.sample(col, row);
                if !sample.is_valid() {
                    continue;
                }
                let world = intrinsics.unproject(col, row, sample.depth);
                self.cloud.push(world, sample.color);

                if let Some(bounds) = &bounds {
                    let probe = match self.space {
                        HitSpace::Pixel => Vec3::new(col as f32, row as f32, sample.depth as f32),
                        HitSpace::World => world,
                    };
                    if bounds.contains(probe) {
                        hit_count += 1;
                    }
                }
            }
        }

        tracing::trace!(points = self.cloud.len(), hit_count, "Depth frame scanned");
        ScanStats {
            points: self.cloud.len(),
            hit_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::DepthSample;

    const RED: [u8; 3] = [255, 0, 0];

    fn sample(depth: u16) -> DepthSample {
        DepthSample { depth, color: RED }
    }

    fn region(center: Vec3, size: f32) -> HoopRegion {
        HoopRegion {
            center_x: center.x,
            center_y: center.y,
            depth_z: center.z,
            size,
        }
    }

    #[test]
    fn all_invalid_frame_yields_nothing() {
        let frame = DepthFrame::empty(32, 24);
        let mut b = PointCloudBuilder::new(HitSpace::Pixel);
        let r = region(Vec3::new(10.0, 10.0, 0.0), 1000.0);
        let stats = b.scan(&frame, &Intrinsics::KINECT_V1, Some(&r));
        assert_eq!(stats, ScanStats::default());
        assert!(b.cloud().is_empty());
    }

    #[test]
    fn unset_region_never_counts() {
        let mut frame = DepthFrame::empty(16, 16);
        for row in 0..16 {
            for col in 0..16 {
                frame.set(col, row, sample(1));
            }
        }
        let mut b = PointCloudBuilder::new(HitSpace::Pixel);
        let stats = b.scan(&frame, &Intrinsics::KINECT_V1, Some(&HoopRegion::UNSET));
        assert_eq!(stats.points, 256);
        assert_eq!(stats.hit_count, 0);

        let stats = b.scan(&frame, &Intrinsics::KINECT_V1, None);
        assert_eq!(stats.hit_count, 0);
    }

    #[test]
    fn single_pixel_inside_world_region_counts_once() {
        let k = Intrinsics::KINECT_V1;
        let mut frame = DepthFrame::empty(64, 48);
        frame.set(10, 10, sample(500));

        let center = k.unproject(10, 10, 500);
        let mut b = PointCloudBuilder::new(HitSpace::World);
        let stats = b.scan(&frame, &k, Some(&region(center, 20.0)));
        assert_eq!(stats.points, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(b.cloud().vertices()[0].position, center.to_array());
        assert_eq!(b.cloud().vertices()[0].color, [255, 0, 0, 255]);
    }

    #[test]
    fn pixel_space_tests_column_row_and_raw_depth() {
        let mut frame = DepthFrame::empty(64, 48);
        frame.set(20, 30, sample(900));
        frame.set(21, 30, sample(2000));

        let mut b = PointCloudBuilder::new(HitSpace::Pixel);
        let r = region(Vec3::new(20.0, 30.0, 900.0), 10.0);
        let stats = b.scan(&frame, &Intrinsics::KINECT_V1, Some(&r));
        assert_eq!(stats.points, 2);
        assert_eq!(stats.hit_count, 1);
    }

    #[test]
    fn points_on_a_face_are_outside() {
        let bounds = Aabb::around(Vec3::new(10.0, 10.0, 10.0), 5.0);
        assert!(bounds.contains(Vec3::new(10.0, 10.0, 10.0)));
        assert!(!bounds.contains(Vec3::new(15.0, 10.0, 10.0)));
        assert!(!bounds.contains(Vec3::new(10.0, 5.0, 10.0)));
        assert!(bounds.contains(Vec3::new(14.999, 10.0, 5.001)));

        let mut frame = DepthFrame::empty(32, 32);
        frame.set(15, 10, sample(10));
        let mut b = PointCloudBuilder::new(HitSpace::Pixel);
        let r = region(Vec3::new(10.0, 10.0, 10.0), 10.0);
        for _ in 0..3 {
            assert_eq!(b.scan(&frame, &Intrinsics::KINECT_V1, Some(&r)).hit_count, 0);
        }
    }

    #[test]
    fn negative_size_is_an_empty_box() {
        let mut frame = DepthFrame::empty(8, 8);
        frame.set(4, 4, sample(4));
        let mut b = PointCloudBuilder::new(HitSpace::Pixel);
        let r = region(Vec3::new(4.0, 4.0, 4.0), -10.0);
        assert_eq!(b.scan(&frame, &Intrinsics::KINECT_V1, Some(&r)).hit_count, 0);
    }

    #[test]
    fn rescan_replaces_the_previous_cloud() {
        let mut frame = DepthFrame::empty(8, 8);
        frame.set(1, 1, sample(100));
        frame.set(2, 2, sample(100));
        let mut b = PointCloudBuilder::new(HitSpace::World);
        b.scan(&frame, &Intrinsics::KINECT_V1, None);
        assert_eq!(b.cloud().len(), 2);

        frame.clear();
        frame.set(3, 3, sample(100));
        b.scan(&frame, &Intrinsics::KINECT_V1, None);
        assert_eq!(b.cloud().len(), 1);
        assert_eq!(b.cloud().as_bytes().len(), std::mem::size_of::<PointVertex>());
    }

    #[test]
    fn hit_space_parses_case_insensitively() {
        assert_eq!("World".parse::<HitSpace>().unwrap(), HitSpace::World);
        assert_eq!("pixel".parse::<HitSpace>().unwrap(), HitSpace::Pixel);
        assert!("screen".parse::<HitSpace>().is_err());
        assert_eq!(HitSpace::World.to_string(), "world");
    }
}
