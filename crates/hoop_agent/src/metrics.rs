use axum::{response::IntoResponse, routing::get, Router};
use hoop_core::ConnectionState;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

pub struct AgentMetrics {
    pub registry: Registry,
    pub frames_total: IntCounter,
    pub frames_scanned_total: IntCounter,
    pub cloud_points: IntGauge,
    pub hoop_points: IntGauge,
    pub hits_emitted_total: IntCounter,
    pub hits_dropped_total: IntCounter,
    pub region_updates_total: IntCounter,
    pub region_rejections_total: IntCounter,
    pub malformed_events_total: IntCounter,
    pub reconnects_total: IntCounter,
    /// 0 = disconnected, 1 = connected, 2 = bound.
    pub connection_state: IntGauge,
}

impl AgentMetrics {
    pub fn new(session_id: &str) -> Self {
        let registry = Registry::new_custom(Some("hoop_agent".into()), None).unwrap();

        macro_rules! reg {
            ($m:expr) => {{
                registry.register(Box::new($m.clone())).unwrap();
                $m
            }};
        }

        let opts = |name: &str, help: &str| {
            prometheus::Opts::new(name, help).const_label("session_id", session_id)
        };

        Self {
            frames_total: reg!(IntCounter::with_opts(opts(
                "frames_total",
                "Frame loop ticks"
            ))
            .unwrap()),
            frames_scanned_total: reg!(IntCounter::with_opts(opts(
                "frames_scanned_total",
                "Ticks that scanned a new depth frame"
            ))
            .unwrap()),
            cloud_points: reg!(IntGauge::with_opts(opts(
                "cloud_points",
                "Points in the current point cloud"
            ))
            .unwrap()),
            hoop_points: reg!(IntGauge::with_opts(opts(
                "hoop_points",
                "Points inside the hoop on the last tick"
            ))
            .unwrap()),
            hits_emitted_total: reg!(IntCounter::with_opts(opts(
                "hits_emitted_total",
                "detectHit events handed to the socket"
            ))
            .unwrap()),
            hits_dropped_total: reg!(IntCounter::with_opts(opts(
                "hits_dropped_total",
                "Hits detected while unbound or with a full outbound queue"
            ))
            .unwrap()),
            region_updates_total: reg!(IntCounter::with_opts(opts(
                "region_updates_total",
                "drawHoop placements applied"
            ))
            .unwrap()),
            region_rejections_total: reg!(IntCounter::with_opts(opts(
                "region_rejections_total",
                "drawHoop placements rejected"
            ))
            .unwrap()),
            malformed_events_total: reg!(IntCounter::with_opts(opts(
                "malformed_events_total",
                "Inbound lines that failed to decode"
            ))
            .unwrap()),
            reconnects_total: reg!(IntCounter::with_opts(opts(
                "reconnects_total",
                "Socket connections established after the first"
            ))
            .unwrap()),
            connection_state: reg!(IntGauge::with_opts(opts(
                "connection_state",
                "Socket state: 0 disconnected, 1 connected, 2 bound"
            ))
            .unwrap()),
            registry,
        }
    }

    pub fn router(&self) -> Router {
        let reg = self.registry.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let reg = reg.clone();
                async move {
                    let mf = reg.gather();
                    let mut buf = Vec::new();
                    TextEncoder::new().encode(&mf, &mut buf).unwrap();
                    String::from_utf8(buf).unwrap().into_response()
                }
            }),
        )
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        self.connection_state.set(match state {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Bound => 2,
        });
    }
}
