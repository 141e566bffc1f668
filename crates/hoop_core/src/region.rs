//! The hoop's pose, as last placed by the remote controller.

use crate::error::RegionError;
use crate::protocol::Placement;
use glam::Vec3;

/// An axis-aligned cube of side `size`, centered at (`center_x`, `center_y`, `depth_z`).
///
/// `size` is already the scaled side length (`scale * multiplier`) in hit-test units.
/// All-zero is the unset sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoopRegion {
    pub center_x: f32,
    pub center_y: f32,
    pub depth_z: f32,
    pub size: f32,
}

impl HoopRegion {
    pub const UNSET: Self = Self {
        center_x: 0.0,
        center_y: 0.0,
        depth_z: 0.0,
        size: 0.0,
    };

    /// A region with a zero center coordinate or zero size is never drawn or
    /// hit-tested. Depth is exempt since it may come from a local setting that
    /// defaults to 0.
    pub fn is_placed(&self) -> bool {
        self.center_x != 0.0 && self.center_y != 0.0 && self.size != 0.0
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.center_x, self.center_y, self.depth_z)
    }

    pub fn half_extent(&self) -> f32 {
        self.size / 2.0
    }
}

/// What the renderer needs to draw the hoop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoopPose {
    pub center: Vec3,
    pub radius: f32,
}

impl From<HoopRegion> for HoopPose {
    fn from(region: HoopRegion) -> Self {
        Self {
            center: region.center(),
            radius: region.size,
        }
    }
}

/// Local settings the controller combines with each inbound placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSettings {
    /// Used to turn relative (0..1) placements into pixels.
    pub window_width: f32,
    pub window_height: f32,
    /// Side length of the hoop box per unit of received scale.
    pub scale_multiplier: f32,
    /// Depth used for placements that do not carry one.
    pub hoop_depth: f32,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            window_width: 640.0,
            window_height: 480.0,
            scale_multiplier: 100.0,
            hoop_depth: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Unset,
    Set,
}

/// Holds the current hoop region. Only inbound placements move it out of `Unset`,
/// and nothing moves it back.
#[derive(Debug, Clone)]
pub struct RegionController {
    settings: RegionSettings,
    region: HoopRegion,
    state: RegionState,
    depth_from_settings: bool,
    updates: u64,
}

impl RegionController {
    pub fn new(settings: RegionSettings) -> Self {
        Self {
            settings,
            region: HoopRegion::UNSET,
            state: RegionState::Unset,
            depth_from_settings: false,
            updates: 0,
        }
    }

    pub fn settings(&self) -> &RegionSettings {
        &self.settings
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    /// Number of placements applied so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Replaces the region with the one described by `placement`.
    ///
    /// Non-finite fields are rejected and leave the previous region in force.
    /// Everything else passes through, so a negative scale yields an empty box.
    pub fn set_region(&mut self, placement: &Placement) -> Result<HoopRegion, RegionError> {
        let s = &self.settings;
        let (region, depth_from_settings) = match *placement {
            Placement::Absolute {
                page_x,
                page_y,
                scale,
            } => {
                tracing::info!(page_x, page_y, scale, "Received absolute hoop placement");
                check_finite("pageX", page_x)?;
                check_finite("pageY", page_y)?;
                check_finite("scale", scale)?;
                (
                    HoopRegion {
                        // Page coordinates are whole pixels.
                        center_x: page_x.trunc(),
                        center_y: page_y.trunc(),
                        depth_z: s.hoop_depth,
                        size: scale * s.scale_multiplier,
                    },
                    true,
                )
            }
            Placement::Relative {
                rel_x,
                rel_y,
                scale,
                depth,
            } => {
                tracing::info!(rel_x, rel_y, scale, ?depth, "Received relative hoop placement");
                check_finite("relX", rel_x)?;
                check_finite("relY", rel_y)?;
                check_finite("scale", scale)?;
                if let Some(d) = depth {
                    check_finite("depth", d)?;
                }
                (
                    HoopRegion {
                        center_x: rel_x * s.window_width,
                        center_y: rel_y * s.window_height,
                        depth_z: depth.unwrap_or(s.hoop_depth),
                        size: scale * s.scale_multiplier,
                    },
                    depth.is_none(),
                )
            }
        };

        self.region = region;
        self.depth_from_settings = depth_from_settings;
        self.state = RegionState::Set;
        self.updates += 1;
        Ok(region)
    }

    /// Moves the locally configured hoop depth. Regions whose depth came from the
    /// setting follow it immediately.
    pub fn set_hoop_depth(&mut self, depth: f32) -> Result<(), RegionError> {
        check_finite("hoopDepth", depth)?;
        self.settings.hoop_depth = depth;
        if self.depth_from_settings {
            self.region.depth_z = depth;
        }
        Ok(())
    }

    pub fn current_region(&self) -> HoopRegion {
        self.region
    }

    /// The region, if it may be drawn and hit-tested.
    pub fn placed_region(&self) -> Option<HoopRegion> {
        Some(self.region).filter(HoopRegion::is_placed)
    }
}

fn check_finite(field: &'static str, value: f32) -> Result<(), RegionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RegionError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relative(rel_x: f32, rel_y: f32, scale: f32) -> Placement {
        Placement::Relative {
            rel_x,
            rel_y,
            scale,
            depth: None,
        }
    }

    #[test]
    fn starts_unset_and_unplaced() {
        let rc = RegionController::new(RegionSettings::default());
        assert_eq!(rc.state(), RegionState::Unset);
        assert_eq!(rc.current_region(), HoopRegion::UNSET);
        assert!(rc.placed_region().is_none());
    }

    #[test]
    fn relative_placement_maps_onto_the_window() {
        let mut rc = RegionController::new(RegionSettings {
            scale_multiplier: 200.0,
            ..RegionSettings::default()
        });
        let region = rc.set_region(&relative(0.5, 0.5, 1.0)).unwrap();
        assert_eq!(region.center_x, 320.0);
        assert_eq!(region.center_y, 240.0);
        assert_eq!(region.size, 200.0);
        assert_eq!(rc.state(), RegionState::Set);
    }

    #[test]
    fn absolute_placement_uses_configured_depth_and_truncates() {
        let mut rc = RegionController::new(RegionSettings {
            hoop_depth: 800.0,
            ..RegionSettings::default()
        });
        let region = rc
            .set_region(&Placement::Absolute {
                page_x: 100.7,
                page_y: 50.2,
                scale: 0.5,
            })
            .unwrap();
        assert_eq!(region.center(), Vec3::new(100.0, 50.0, 800.0));
        assert_eq!(region.size, 50.0);
        assert_eq!(region.half_extent(), 25.0);
    }

    #[test]
    fn same_payload_twice_gives_the_same_region() {
        let mut rc = RegionController::new(RegionSettings::default());
        let p = relative(0.25, 0.75, 2.0);
        let first = rc.set_region(&p).unwrap();
        let second = rc.set_region(&p).unwrap();
        assert_eq!(first, second);
        assert_eq!(rc.updates(), 2);
    }

    #[test]
    fn non_finite_values_keep_the_previous_region() {
        let mut rc = RegionController::new(RegionSettings::default());
        let good = rc.set_region(&relative(0.5, 0.5, 1.0)).unwrap();

        let err = rc.set_region(&relative(f32::NAN, 0.5, 1.0)).unwrap_err();
        assert!(matches!(err, RegionError::NonFinite { field: "relX", .. }));
        let err = rc
            .set_region(&Placement::Relative {
                rel_x: 0.5,
                rel_y: 0.5,
                scale: 1.0,
                depth: Some(f32::INFINITY),
            })
            .unwrap_err();
        assert!(matches!(err, RegionError::NonFinite { field: "depth", .. }));

        assert_eq!(rc.current_region(), good);
        assert_eq!(rc.updates(), 1);
    }

    #[test]
    fn zero_coordinate_or_scale_is_not_placed() {
        let mut rc = RegionController::new(RegionSettings::default());
        rc.set_region(&relative(0.0, 0.5, 1.0)).unwrap();
        assert_eq!(rc.state(), RegionState::Set);
        assert!(rc.placed_region().is_none());

        rc.set_region(&relative(0.5, 0.5, 0.0)).unwrap();
        assert!(rc.placed_region().is_none());

        rc.set_region(&relative(0.5, 0.5, 1.0)).unwrap();
        assert!(rc.placed_region().is_some());
    }

    #[test]
    fn hoop_depth_setting_follows_only_settings_driven_regions() {
        let mut rc = RegionController::new(RegionSettings::default());
        rc.set_region(&relative(0.5, 0.5, 1.0)).unwrap();
        rc.set_hoop_depth(1200.0).unwrap();
        assert_eq!(rc.current_region().depth_z, 1200.0);
        assert!(rc.set_hoop_depth(f32::NAN).is_err());
        assert_eq!(rc.settings().hoop_depth, 1200.0);

        rc.set_region(&Placement::Relative {
            rel_x: 0.5,
            rel_y: 0.5,
            scale: 1.0,
            depth: Some(700.0),
        })
        .unwrap();
        rc.set_hoop_depth(300.0).unwrap();
        assert_eq!(rc.current_region().depth_z, 700.0);
    }

    #[test]
    fn pose_radius_is_the_scaled_size() {
        let region = HoopRegion {
            center_x: 1.0,
            center_y: 2.0,
            depth_z: 3.0,
            size: 40.0,
        };
        let pose = HoopPose::from(region);
        assert_eq!(pose.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.radius, 40.0);
    }
}
