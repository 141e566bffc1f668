//! Socket events exchanged with the hoop controller.
//!
//! Each event is one line of JSON: `{"event": "<name>", "data": <payload>}`.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// Controller → agent: place or move the hoop.
pub const DRAW_HOOP: &str = "drawHoop";
/// Agent → controller: enough points were inside the hoop this frame.
pub const DETECT_HIT: &str = "detectHit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn new<T: Serialize>(event: &str, data: &T) -> Result<Self, ProtocolError> {
        let data = serde_json::to_value(data).map_err(|source| ProtocolError::Encode {
            event: event.to_owned(),
            source,
        })?;
        Ok(Self {
            event: event.to_owned(),
            data,
        })
    }

    pub fn from_line(line: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(line.trim()).map_err(ProtocolError::Envelope)
    }

    /// Serialized form, newline-terminated.
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        let mut line = serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            event: self.event.clone(),
            source,
        })?;
        line.push('\n');
        Ok(line)
    }

    /// Decodes `data` as the payload type for this event.
    pub fn payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, ProtocolError> {
        T::deserialize(&self.data).map_err(|source| ProtocolError::Payload {
            event: self.event.clone(),
            source,
        })
    }
}

/// A `drawHoop` payload. Either absolute window pixels, or fractions of the
/// window with an optional depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Placement {
    #[serde(rename_all = "camelCase")]
    Relative {
        rel_x: f32,
        rel_y: f32,
        scale: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth: Option<f32>,
    },
    #[serde(rename_all = "camelCase")]
    Absolute { page_x: f32, page_y: f32, scale: f32 },
}

/// The `detectHit` payload. Controllers only care that the event arrived; the
/// fields are informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectHitPayload {
    pub session_id: String,
    pub frame: u64,
    pub points: usize,
    pub timestamp_ms: i64,
}

/// An inbound event the session knows how to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    DrawHoop(Placement),
    /// Any other event; only its name is kept.
    Other(String),
}

impl InboundEvent {
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::from_line(line)?;
        if envelope.event == DRAW_HOOP {
            Ok(Self::DrawHoop(envelope.payload()?))
        } else {
            Ok(Self::Other(envelope.event))
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::DrawHoop(_) => DRAW_HOOP,
            Self::Other(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_absolute_placement() {
        let line = r#"{"event":"drawHoop","data":{"pageX":320,"pageY":200,"scale":1.5}}"#;
        let ev = InboundEvent::decode(line).unwrap();
        assert_eq!(
            ev,
            InboundEvent::DrawHoop(Placement::Absolute {
                page_x: 320.0,
                page_y: 200.0,
                scale: 1.5
            })
        );
        assert_eq!(ev.name(), DRAW_HOOP);
    }

    #[test]
    fn decodes_relative_placement_with_and_without_depth() {
        let ev = InboundEvent::decode(
            r#"{"event":"drawHoop","data":{"relX":0.5,"relY":0.25,"scale":1.0,"depth":900}}"#,
        )
        .unwrap();
        assert_eq!(
            ev,
            InboundEvent::DrawHoop(Placement::Relative {
                rel_x: 0.5,
                rel_y: 0.25,
                scale: 1.0,
                depth: Some(900.0)
            })
        );

        let line = r#"{"event":"drawHoop","data":{"relX":0.5,"relY":0.25,"scale":1.0}}"#;
        let ev = InboundEvent::decode(line).unwrap();
        assert!(matches!(
            ev,
            InboundEvent::DrawHoop(Placement::Relative { depth: None, .. })
        ));
    }

    #[test]
    fn other_events_keep_their_name() {
        let ev = InboundEvent::decode(r#"{"event":"ping"}"#).unwrap();
        assert_eq!(ev, InboundEvent::Other("ping".into()));
        assert_eq!(ev.name(), "ping");
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            InboundEvent::decode("not json"),
            Err(ProtocolError::Envelope(_))
        ));
        assert!(matches!(
            InboundEvent::decode(r#"{"event":"drawHoop","data":{"pageX":1}}"#),
            Err(ProtocolError::Payload { .. })
        ));
    }

    #[test]
    fn detect_hit_line_is_camel_case_and_newline_terminated() {
        let payload = DetectHitPayload {
            session_id: "abc".into(),
            frame: 7,
            points: 150,
            timestamp_ms: 1,
        };
        let line = Envelope::new(DETECT_HIT, &payload).unwrap().to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert!(line.contains(r#""event":"detectHit""#));
        assert!(line.contains(r#""sessionId":"abc""#));

        let back = Envelope::from_line(&line).unwrap();
        assert_eq!(back.payload::<DetectHitPayload>().unwrap(), payload);
    }

    #[test]
    fn placement_serializes_without_absent_depth() {
        let line = Envelope::new(
            DRAW_HOOP,
            &Placement::Relative {
                rel_x: 0.5,
                rel_y: 0.5,
                scale: 1.0,
                depth: None,
            },
        )
        .unwrap()
        .to_line()
        .unwrap();
        assert!(line.contains(r#""relX":0.5"#));
        assert!(!line.contains("depth"));
    }
}
