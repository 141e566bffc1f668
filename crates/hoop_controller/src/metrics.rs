use axum::{response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

pub struct ControllerMetrics {
    pub registry: Registry,
    pub agents_connected_total: IntCounter,
    pub active_agents: IntGauge,
    pub placements_total: IntCounter,
    pub hits_received_total: IntCounter,
    pub malformed_events_total: IntCounter,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("hoop_controller".into()), None).unwrap();

        macro_rules! reg {
            ($m:expr) => {{
                registry.register(Box::new($m.clone())).unwrap();
                $m
            }};
        }

        Self {
            agents_connected_total: reg!(IntCounter::new(
                "agents_connected_total",
                "Total agent connections accepted"
            )
            .unwrap()),
            active_agents: reg!(IntGauge::new(
                "active_agents",
                "Number of currently connected agents"
            )
            .unwrap()),
            placements_total: reg!(IntCounter::new(
                "placements_total",
                "Hoop placements published to agents"
            )
            .unwrap()),
            hits_received_total: reg!(IntCounter::new(
                "hits_received_total",
                "detectHit events received from agents"
            )
            .unwrap()),
            malformed_events_total: reg!(IntCounter::new(
                "malformed_events_total",
                "Inbound lines that failed to decode"
            )
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
}
