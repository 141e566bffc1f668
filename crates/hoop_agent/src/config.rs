use clap::{Parser, ValueEnum};
use hoop_core::{HitPolicy, HitSpace, RegionSettings, SessionConfig};
use std::time::Duration;

/// `hoop_agent` - Depth-camera hoop hit detector.
///
/// Scans depth frames against a hoop placed by the remote controller and reports
/// `detectHit` events back over the socket while enough points are inside it.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Address of the hoop controller's event socket.
    #[arg(long, env = "HOOP_SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Listen address for the Prometheus metrics server. Disabled when unset.
    #[arg(long, env = "HOOP_METRICS_LISTEN_ADDR")]
    pub metrics_listen_addr: Option<String>,

    /// Delay before reconnecting after the socket drops.
    #[arg(long, env = "HOOP_RECONNECT_DELAY_MS", default_value_t = 2000)]
    pub reconnect_delay_ms: u64,

    /// Frame loop rate.
    #[arg(long, env = "HOOP_FRAME_RATE_HZ", default_value_t = 60)]
    pub frame_rate_hz: u64,

    /// Points that must be inside the hoop (strictly more) for a hit.
    #[arg(long, env = "HOOP_HIT_THRESHOLD", default_value_t = hoop_core::DEFAULT_HIT_THRESHOLD)]
    pub hit_threshold: usize,

    /// When to emit `detectHit`: `level` (every qualifying frame), `edge`, or
    /// `cooldown=<millis>`.
    #[arg(long, env = "HOOP_HIT_POLICY", default_value = "level")]
    pub hit_policy: HitPolicy,

    /// Coordinate space of the hoop test: `pixel` (column, row, raw depth) or `world`.
    #[arg(long, env = "HOOP_HIT_SPACE", default_value = "pixel")]
    pub hit_space: HitSpace,

    /// Hoop side length per unit of received scale.
    #[arg(long, env = "HOOP_SCALE_MULTIPLIER", default_value_t = 100.0)]
    pub scale_multiplier: f32,

    /// Hoop depth for placements that do not carry one (`abs` placements always
    /// use it). In pixel space this is raw sensor depth in millimetres and must
    /// sit at the target's distance from the camera, or those hoops never fire.
    /// The default matches the synthetic ball at the top of its arc.
    #[arg(long, env = "HOOP_DEPTH", default_value_t = 900.0, allow_negative_numbers = true)]
    pub hoop_depth: f32,

    /// Window size used to resolve relative placements.
    #[arg(long, env = "HOOP_WINDOW_WIDTH", default_value_t = 640.0)]
    pub window_width: f32,

    #[arg(long, env = "HOOP_WINDOW_HEIGHT", default_value_t = 480.0)]
    pub window_height: f32,

    /// Where depth frames come from.
    #[arg(long, env = "HOOP_DEPTH_SOURCE", value_enum, default_value_t = SourceKind::Synthetic)]
    pub depth_source: SourceKind,

    /// Depth raster size for the synthetic source.
    #[arg(long, env = "HOOP_SENSOR_WIDTH", default_value_t = 640)]
    pub sensor_width: usize,

    #[arg(long, env = "HOOP_SENSOR_HEIGHT", default_value_t = 480)]
    pub sensor_height: usize,

    /// Synthetic sensor frame rate; a real Kinect delivers 30.
    #[arg(long, env = "HOOP_SENSOR_RATE_HZ", default_value_t = 30)]
    pub sensor_rate_hz: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Simulated wall with a ball thrown across it.
    Synthetic,
    /// No sensor attached; frames are never scanned.
    #[value(name = "none")]
    Absent,
}

impl Config {
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            region: RegionSettings {
                window_width: self.window_width,
                window_height: self.window_height,
                scale_multiplier: self.scale_multiplier,
                hoop_depth: self.hoop_depth,
            },
            hit_space: self.hit_space,
            hit_threshold: self.hit_threshold,
            hit_policy: self.hit_policy,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.frame_rate_hz.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
