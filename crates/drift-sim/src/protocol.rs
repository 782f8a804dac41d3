//! Simulator session protocol.
//!
//! The controller sends a [`SimRequest`] and the simulator bridge replies with
//! exactly one [`SimResponse`]. One request is in flight at a time.
//!
//! ```
//! use drift_sim::protocol::SimRequest;
//!
//! let json = r#"{"type":"advance","control":[0.1,0.5,0.0]}"#;
//! let req: SimRequest = serde_json::from_str(json).unwrap();
//! assert!(matches!(req, SimRequest::Advance { .. }));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use drift_core::error::SimError;
use drift_core::types::CONTROL_LEN;

/// Largest accepted frame payload (1 MiB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// SimRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimRequest {
    /// Load a scenario file into the session.
    Load { scenario: String },
    /// Advance one physics tick with `[steer, throttle, brake]`.
    Advance { control: [f64; CONTROL_LEN] },
    /// Re-spawn the vehicle with a zero control input and report its initial
    /// state.
    Reset,
    /// Stop the current run.
    Stop,
}

impl SimRequest {
    /// Operation name used in timeout errors and logs.
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Advance { .. } => "advance",
            Self::Reset => "reset",
            Self::Stop => "stop",
        }
    }
}

// ---------------------------------------------------------------------------
// SimResponse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimResponse {
    /// `[s, l, vx, vy, yaw, yaw_rate, t, terminal]`.
    State { values: Vec<f64> },
    Ack,
    Error { message: String },
}

// ---------------------------------------------------------------------------
// ProtocolError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload of {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Peer closed the connection")]
    Disconnected,
}

impl ProtocolError {
    /// Map to a [`SimError`], turning socket deadline expiry into
    /// [`SimError::Timeout`].
    pub fn into_sim_error(self, op: &'static str, after: Duration) -> SimError {
        match self {
            Self::Io(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                SimError::Timeout { op, after }
            }
            Self::Io(e) => SimError::Unavailable(e.to_string()),
            Self::Disconnected => SimError::Unavailable("simulator closed the connection".into()),
            other @ (Self::Json(_) | Self::PayloadTooLarge { .. }) => {
                SimError::Protocol(other.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_tags_are_snake_case() {
        let json = serde_json::to_string(&SimRequest::Load {
            scenario: "Shanghai_center.mat".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"load","scenario":"Shanghai_center.mat"}"#);
        assert_eq!(serde_json::to_string(&SimRequest::Stop).unwrap(), r#"{"type":"stop"}"#);
    }

    #[test]
    fn advance_carries_three_controls() {
        let req: SimRequest =
            serde_json::from_str(r#"{"type":"advance","control":[0.5,-1.0,0.0]}"#).unwrap();
        assert_eq!(
            req,
            SimRequest::Advance {
                control: [0.5, -1.0, 0.0]
            }
        );
        assert_eq!(req.op(), "advance");
    }

    #[test]
    fn advance_rejects_wrong_arity() {
        let res: Result<SimRequest, _> =
            serde_json::from_str(r#"{"type":"advance","control":[0.5,-1.0]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn response_parses_state_and_error() {
        let resp: SimResponse =
            serde_json::from_str(r#"{"type":"state","values":[1,2,3,4,5,6,7,0]}"#).unwrap();
        assert!(matches!(resp, SimResponse::State { ref values } if values.len() == 8));

        let resp: SimResponse =
            serde_json::from_str(r#"{"type":"error","message":"no vehicle"}"#).unwrap();
        assert_eq!(
            resp,
            SimResponse::Error {
                message: "no vehicle".into()
            }
        );
    }

    #[test]
    fn unknown_response_type_fails() {
        let res: Result<SimResponse, _> = serde_json::from_str(r#"{"type":"pong"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn timeouts_map_to_sim_timeout() {
        let after = Duration::from_millis(50);
        for kind in [std::io::ErrorKind::WouldBlock, std::io::ErrorKind::TimedOut] {
            let err = ProtocolError::Io(std::io::Error::new(kind, "deadline")).into_sim_error("reset", after);
            assert!(matches!(err, SimError::Timeout { op: "reset", .. }));
        }
    }

    #[test]
    fn other_errors_map_by_kind() {
        let after = Duration::from_millis(50);
        let refused = ProtocolError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        assert!(matches!(
            refused.into_sim_error("advance", after),
            SimError::Unavailable(_)
        ));
        assert!(matches!(
            ProtocolError::Disconnected.into_sim_error("advance", after),
            SimError::Unavailable(_)
        ));
        let too_large = ProtocolError::PayloadTooLarge {
            size: MAX_MESSAGE_SIZE + 1,
            max: MAX_MESSAGE_SIZE,
        };
        assert!(matches!(
            too_large.into_sim_error("advance", after),
            SimError::Protocol(_)
        ));
    }
}
