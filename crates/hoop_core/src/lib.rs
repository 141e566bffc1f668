// src/lib.rs
//! Depth-camera hoop hit detection.
//!
//! A remote controller places a virtual "hoop" in front of a depth sensor. Every
//! frame the depth raster is turned into a colored point cloud, points inside the
//! hoop's box are counted, and a `detectHit` event is produced while the count
//! stays above a threshold. Everything here is synchronous and I/O free; the
//! `hoop_agent` binary owns the sockets, the sensor and the frame clock.

pub mod cloud;
pub mod depth;
pub mod error;
pub mod hit;
pub mod protocol;
pub mod region;
pub mod session;

pub use cloud::{Aabb, HitSpace, PointCloud, PointCloudBuilder, PointVertex, ScanStats};
pub use depth::{DepthFrame, DepthSample, DepthSource, Intrinsics, NoSensor};
pub use error::{FrameError, ParseSettingError, ProtocolError, RegionError};
pub use hit::{HitDecision, HitPolicy, HitReporter, HoopStyle, DEFAULT_HIT_THRESHOLD};
pub use protocol::{DetectHitPayload, Envelope, InboundEvent, Placement, DETECT_HIT, DRAW_HOOP};
pub use region::{HoopPose, HoopRegion, RegionController, RegionSettings, RegionState};
pub use session::{
    ConnectionState, FrameReport, HitOutcome, Session, SessionConfig, TransportEvent,
    TransportOutcome,
};
