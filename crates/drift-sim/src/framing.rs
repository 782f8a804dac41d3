//! Length-prefixed JSON framing.
//!
//! ```text
//! +----------------+------------------+
//! | Length (4B LE) | JSON Payload     |
//! +----------------+------------------+
//! ```
//!
//! Socket deadlines surface as `Io` errors with kind `WouldBlock` or
//! `TimedOut`; they are never treated as a clean disconnect.

use std::io::{Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::protocol::{MAX_MESSAGE_SIZE, ProtocolError};

/// Read one length-prefixed JSON message.
///
/// Returns `Ok(None)` on EOF before any byte of the length prefix (clean
/// disconnect).
pub fn read_message<T: DeserializeOwned>(
    reader: &mut impl Read,
) -> Result<Option<T>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(ProtocolError::Io(e)),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut payload = vec![0u8; len];
    match reader.read_exact(&mut payload) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::Disconnected);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }

    let msg: T = serde_json::from_slice(&payload)?;
    Ok(Some(msg))
}

/// Write one length-prefixed JSON message and flush.
pub fn write_message<T: Serialize>(writer: &mut impl Write, msg: &T) -> Result<(), ProtocolError> {
    let payload = serde_json::to_vec(msg)?;

    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        })?
        .to_le_bytes();
    writer.write_all(&len)?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
