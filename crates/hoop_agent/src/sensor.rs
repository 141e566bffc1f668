//! Depth sources the agent can run against.

use hoop_core::{DepthFrame, DepthSample, DepthSource, Intrinsics};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::PI;
use std::time::{Duration, Instant};

const WALL_DEPTH_MM: f32 = 2500.0;
const WALL_NOISE_MM: f32 = 4.0;
const DROPOUT_CHANCE: f64 = 0.02;
const BALL_RADIUS_MM: f32 = 110.0;
pub(crate) const THROW_PERIOD_S: f32 = 4.0;

/// A simulated installation: a flat back wall and a ball thrown across the view
/// on a parabola, closest to the camera at the top of its arc.
pub struct SyntheticDepthSource {
    frame: DepthFrame,
    intrinsics: Intrinsics,
    rng: StdRng,
    started: Instant,
    period: Duration,
    last_frame: Option<Instant>,
}

impl SyntheticDepthSource {
    pub fn new(width: usize, height: usize, rate_hz: u64, seed: u64) -> Self {
        Self {
            frame: DepthFrame::empty(width, height),
            intrinsics: Intrinsics::kinect_for(width, height),
            rng: StdRng::seed_from_u64(seed),
            started: Instant::now(),
            period: Duration::from_micros(1_000_000 / rate_hz.max(1)),
            last_frame: None,
        }
    }

    /// Ball center in (column, row, depth mm) at `t` seconds into the show.
    pub fn ball_at(&self, t: f32) -> (f32, f32, f32) {
        let w = self.frame.width() as f32;
        let h = self.frame.height() as f32;
        let p = (t / THROW_PERIOD_S).fract();
        let col = p * w;
        let row = h * (0.25 + 2.0 * (p - 0.5).powi(2));
        let depth = 1900.0 - 900.0 * (PI * p).sin();
        (col, row, depth)
    }

    /// Renders the scene at `t` seconds into the internal frame.
    pub fn render_at(&mut self, t: f32) -> &DepthFrame {
        let (bx, by, bz) = self.ball_at(t);
        let radius_px = BALL_RADIUS_MM * self.intrinsics.fx / bz;

        for row in 0..self.frame.height() {
            for col in 0..self.frame.width() {
                let dx = col as f32 - bx;
                let dy = row as f32 - by;
                let d2 = dx * dx + dy * dy;

                let sample = if d2 < radius_px * radius_px {
                    // Front surface of the sphere.
                    let bulge = (1.0 - d2 / (radius_px * radius_px)).sqrt() * BALL_RADIUS_MM;
                    DepthSample {
                        depth: (bz - bulge) as u16,
                        color: [255, 140, 0],
                    }
                } else if self.rng.gen_bool(DROPOUT_CHANCE) {
                    DepthSample::default()
                } else {
                    let noise = self.rng.gen_range(-WALL_NOISE_MM..=WALL_NOISE_MM);
                    let shade = (row * 200 / self.frame.height()) as u8 + 30;
                    DepthSample {
                        depth: (WALL_DEPTH_MM + noise) as u16,
                        color: [shade, shade, shade],
                    }
                };
                self.frame.set(col, row, sample);
            }
        }
        &self.frame
    }
}

impl DepthSource for SyntheticDepthSource {
    fn is_connected(&self) -> bool {
        true
    }

    fn poll_frame(&mut self) -> Option<&DepthFrame> {
        let now = Instant::now();
        if let Some(last) = self.last_frame {
            if now.duration_since(last) < self.period {
                return None;
            }
        }
        self.last_frame = Some(now);
        let t = now.duration_since(self.started).as_secs_f32();
        Some(self.render_at(t))
    }

    fn intrinsics(&self) -> Intrinsics {
        self.intrinsics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_is_nearest_at_mid_throw() {
        let src = SyntheticDepthSource::new(640, 480, 30, 1);
        let (col, row, depth) = src.ball_at(THROW_PERIOD_S / 2.0);
        assert!((col - 320.0).abs() < 1e-3);
        assert!((row - 120.0).abs() < 1e-3);
        assert!((depth - 1000.0).abs() < 1e-2);
        let (_, _, far) = src.ball_at(0.0);
        assert!(far > depth);
    }

    #[test]
    fn render_places_ball_in_front_of_the_wall() {
        let mut src = SyntheticDepthSource::new(160, 120, 30, 7);
        let t = THROW_PERIOD_S / 2.0;
        let (bx, by, bz) = src.ball_at(t);
        let frame = src.render_at(t);

        let center = frame.sample(bx as usize, by as usize);
        assert!(center.is_valid());
        assert!((center.depth as f32) < bz);
        assert_eq!(center.color, [255, 140, 0]);

        let corner = frame.sample(0, frame.height() - 1);
        let off_wall = (corner.depth as f32 - WALL_DEPTH_MM).abs();
        assert!(corner.depth == 0 || off_wall <= WALL_NOISE_MM + 1.0);
    }

    #[test]
    fn frames_are_rate_limited() {
        let mut src = SyntheticDepthSource::new(32, 24, 1, 3);
        assert!(src.poll_frame().is_some());
        assert!(src.poll_frame().is_none());
    }
}
