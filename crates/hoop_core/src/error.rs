use thiserror::Error;

/// Errors raised while decoding or encoding socket events.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed '{event}' payload: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode '{event}': {source}")]
    Encode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected hoop placements.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegionError {
    #[error("placement field '{field}' is not finite ({value})")]
    NonFinite { field: &'static str, value: f32 },
}

/// Errors building a depth frame from raw buffers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("depth buffer has {actual} samples, expected {expected}")]
    DepthLength { expected: usize, actual: usize },

    #[error("color buffer has {actual} samples, expected {expected}")]
    ColorLength { expected: usize, actual: usize },
}

/// Errors parsing a textual setting such as a hit space or hit policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseSettingError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}
