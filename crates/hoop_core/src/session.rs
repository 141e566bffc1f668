//! The state one installation process carries between frames and network events.

use crate::cloud::{HitSpace, PointCloud, PointCloudBuilder};
use crate::depth::DepthSource;
use crate::error::{ProtocolError, RegionError};
use crate::hit::{HitPolicy, HitReporter, HoopStyle, DEFAULT_HIT_THRESHOLD};
use crate::protocol::{DetectHitPayload, InboundEvent};
use crate::region::{HoopPose, HoopRegion, RegionController, RegionSettings};
use std::time::Instant;

/// Socket lifecycle. Placements are only applied once `Bound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Connected and listening for `drawHoop`.
    Bound,
}

/// What the transport reports to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// One raw inbound line.
    Message(String),
}

/// Result of feeding a transport event to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    StateChanged(ConnectionState),
    RegionApplied(HoopRegion),
    RegionRejected(RegionError),
    /// A message that arrived while not bound, or a non-placement event.
    Ignored { event: String },
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HitOutcome {
    None,
    Emit(DetectHitPayload),
    /// A hit was due but there is no bound connection to send it on.
    Suppressed,
}

/// Everything the renderer and the network side need from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Whether a new depth frame was scanned this tick.
    pub scanned: bool,
    pub hit_count: usize,
    pub points: usize,
    pub hoop: Option<HoopPose>,
    pub style: HoopStyle,
    pub hit: HitOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub region: RegionSettings,
    pub hit_space: HitSpace,
    pub hit_threshold: usize,
    pub hit_policy: HitPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            region: RegionSettings::default(),
            hit_space: HitSpace::default(),
            hit_threshold: DEFAULT_HIT_THRESHOLD,
            hit_policy: HitPolicy::default(),
        }
    }
}

pub struct Session {
    id: String,
    connection: ConnectionState,
    status: String,
    region: RegionController,
    builder: PointCloudBuilder,
    reporter: HitReporter,
    frame: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            connection: ConnectionState::Disconnected,
            status: "not connected".to_owned(),
            region: RegionController::new(config.region),
            builder: PointCloudBuilder::new(config.hit_space),
            reporter: HitReporter::new(config.hit_threshold, config.hit_policy),
            frame: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Name of the last transport event seen, for on-screen diagnostics.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn region(&self) -> &RegionController {
        &self.region
    }

    /// Operator adjustment of the hoop depth; takes effect on the next frame.
    pub fn set_hoop_depth(&mut self, depth: f32) -> Result<(), RegionError> {
        self.region.set_hoop_depth(depth)?;
        tracing::info!(
            session_id = %self.id,
            hoop_depth = depth,
            region = ?self.region.current_region(),
            "Hoop depth changed"
        );
        Ok(())
    }

    pub fn cloud(&self) -> &PointCloud {
        self.builder.cloud()
    }

    pub fn handle_transport(&mut self, event: TransportEvent) -> TransportOutcome {
        match event {
            TransportEvent::Connected => {
                self.connection = ConnectionState::Connected;
                tracing::info!(session_id = %self.id, "Socket connected");
                self.bind();
                TransportOutcome::StateChanged(self.connection)
            }
            TransportEvent::Disconnected => {
                self.connection = ConnectionState::Disconnected;
                self.status = "not connected".to_owned();
                tracing::warn!(session_id = %self.id, "Socket disconnected; keeping last hoop");
                TransportOutcome::StateChanged(self.connection)
            }
            TransportEvent::Message(line) => self.handle_message(&line),
        }
    }

    fn bind(&mut self) {
        if self.connection == ConnectionState::Connected {
            self.connection = ConnectionState::Bound;
            self.status = "connected".to_owned();
            tracing::debug!("Bound drawHoop listener");
        }
    }

    fn handle_message(&mut self, line: &str) -> TransportOutcome {
        let event = match InboundEvent::decode(line) {
            Ok(ev) => ev,
            Err(e) => return self.malformed(e),
        };
        tracing::debug!(event = event.name(), "Received event");
        self.status = event.name().to_owned();

        match event {
            InboundEvent::DrawHoop(placement) if self.connection == ConnectionState::Bound => {
                match self.region.set_region(&placement) {
                    Ok(region) => TransportOutcome::RegionApplied(region),
                    Err(e) => {
                        tracing::warn!(error = %e, "Rejected hoop placement");
                        TransportOutcome::RegionRejected(e)
                    }
                }
            }
            other => {
                let event = other.name().to_owned();
                if matches!(other, InboundEvent::DrawHoop(_)) {
                    tracing::warn!(
                        state = ?self.connection,
                        "Ignoring drawHoop before listener is bound"
                    );
                }
                TransportOutcome::Ignored { event }
            }
        }
    }

    fn malformed(&self, error: ProtocolError) -> TransportOutcome {
        tracing::warn!(error = %error, "Dropping malformed event");
        TransportOutcome::Malformed(error.to_string())
    }

    /// One tick of the frame loop: scan a new depth frame if there is one and
    /// decide whether to report a hit.
    ///
    /// The hit count starts at 0 every tick, so ticks without a new depth frame
    /// never count as hits.
    pub fn update(&mut self, source: &mut dyn DepthSource, now: Instant) -> FrameReport {
        self.frame += 1;
        let placed = self.region.placed_region();

        let mut scanned = false;
        let mut hit_count = 0;
        if source.is_connected() {
            let intrinsics = source.intrinsics();
            if let Some(frame) = source.poll_frame() {
                let stats = self.builder.scan(frame, &intrinsics, placed.as_ref());
                hit_count = stats.hit_count;
                scanned = true;
            }
        }

        let decision = self.reporter.evaluate(hit_count, now);
        let hit = if !decision.emit {
            HitOutcome::None
        } else if self.connection == ConnectionState::Bound {
            tracing::debug!(frame = self.frame, hit_count, "Hit detected");
            HitOutcome::Emit(DetectHitPayload {
                session_id: self.id.clone(),
                frame: self.frame,
                points: hit_count,
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
            })
        } else {
            tracing::debug!(frame = self.frame, hit_count, "Hit detected while unbound");
            HitOutcome::Suppressed
        };

        FrameReport {
            frame: self.frame,
            scanned,
            hit_count,
            points: self.builder.cloud().len(),
            hoop: placed.map(HoopPose::from),
            style: decision.style,
            hit,
        }
    }
}
