//! Request body builders for every client-issued opcode.

use crate::error::{CqlError, Result};
use crate::serialization::{CqlValue, CqlWrite, FrameBuffer};

use super::consistency::Consistency;
use super::constants::{CQL_VERSION, STARTUP_KEY_COMPRESSION, STARTUP_KEY_CQL_VERSION};
use super::event::EventType;

/// Builds a STARTUP body: a `[string map]` announcing the CQL version
/// and, when negotiating compression, the algorithm name.
pub fn startup(compression: Option<&str>) -> Result<Vec<u8>> {
    let mut options = vec![(
        STARTUP_KEY_CQL_VERSION.to_string(),
        CQL_VERSION.to_string(),
    )];
    if let Some(algorithm) = compression {
        options.push((STARTUP_KEY_COMPRESSION.to_string(), algorithm.to_string()));
    }
    let mut out = FrameBuffer::new();
    out.write_string_map(&options)?;
    Ok(out.into_bytes())
}

/// Builds a CREDENTIALS body from the authenticator's key/value pairs.
pub fn credentials(pairs: &[(String, String)]) -> Result<Vec<u8>> {
    let mut out = FrameBuffer::new();
    out.write_string_map(pairs)?;
    Ok(out.into_bytes())
}

/// Builds a QUERY body: `[long string]` CQL then `[consistency]`.
pub fn query(cql: &str, consistency: Consistency) -> Result<Vec<u8>> {
    let mut out = FrameBuffer::with_capacity(cql.len() + 6);
    out.write_long_string(cql)?;
    out.write_consistency(consistency)?;
    Ok(out.into_bytes())
}

/// Builds a PREPARE body: the `[long string]` CQL to parse.
pub fn prepare(cql: &str) -> Result<Vec<u8>> {
    let mut out = FrameBuffer::with_capacity(cql.len() + 4);
    out.write_long_string(cql)?;
    Ok(out.into_bytes())
}

/// Builds an EXECUTE body: statement id, bound values, consistency.
///
/// Each value is written as `[bytes]`; `CqlValue::Null` becomes the −1
/// null sentinel. The value count must fit in an `i16`.
pub fn execute(id: &[u8], values: &[CqlValue], consistency: Consistency) -> Result<Vec<u8>> {
    let count = u16::try_from(values.len())
        .ok()
        .filter(|n| *n <= i16::MAX as u16)
        .ok_or_else(|| {
            CqlError::Encoding(format!(
                "{} bound values exceed the i16 count limit",
                values.len()
            ))
        })?;
    let mut out = FrameBuffer::new();
    out.write_short_bytes(id)?;
    out.write_short(count)?;
    for value in values {
        let encoded = value.encode()?;
        out.write_bytes(encoded.as_deref())?;
    }
    out.write_consistency(consistency)?;
    Ok(out.into_bytes())
}

/// Builds a REGISTER body: the `[string list]` of event types.
pub fn register(events: &[EventType]) -> Result<Vec<u8>> {
    let names: Vec<String> = events.iter().map(|e| e.wire_name().to_string()).collect();
    let mut out = FrameBuffer::new();
    out.write_string_list(&names)?;
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::OPCODE_STARTUP;
    use crate::protocol::{Frame, ProtocolVersion};

    #[test]
    fn startup_frame_bytes_on_wire() {
        // The canonical v1 handshake frame, byte for byte.
        let body = startup(None).unwrap();
        let frame = Frame::request(ProtocolVersion::V1, 0, OPCODE_STARTUP, body).unwrap();
        assert_eq!(
            frame.to_bytes(),
            vec![
                0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x16, 0x00, 0x01, 0x00, 0x0B, 0x43,
                0x51, 0x4C, 0x5F, 0x56, 0x45, 0x52, 0x53, 0x49, 0x4F, 0x4E, 0x00, 0x05, 0x33,
                0x2E, 0x30, 0x2E, 0x30,
            ]
        );
    }

    #[test]
    fn startup_with_compression_adds_option() {
        let body = startup(Some("snappy")).unwrap();
        // Two entries in the option map.
        assert_eq!(&body[..2], &[0x00, 0x02]);
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("COMPRESSION"));
        assert!(text.contains("snappy"));
    }

    #[test]
    fn query_body_layout() {
        let body = query("USE ks", Consistency::Any).unwrap();
        assert_eq!(
            body,
            vec![0x00, 0x00, 0x00, 0x06, b'U', b'S', b'E', b' ', b'k', b's', 0x00, 0x00]
        );
    }

    #[test]
    fn execute_body_layout() {
        // prepare("INSERT ...") then execute(stmt, 42_i32, "hi")
        let id = vec![0xCA, 0xFE];
        let body = execute(
            &id,
            &[CqlValue::Int(42), CqlValue::Text("hi".to_string())],
            Consistency::One,
        )
        .unwrap();
        assert_eq!(
            body,
            vec![
                0x00, 0x02, 0xCA, 0xFE, // [short bytes] id
                0x00, 0x02, // two values
                0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x2A, // [bytes] int 42
                0x00, 0x00, 0x00, 0x02, 0x68, 0x69, // [bytes] "hi"
                0x00, 0x01, // consistency ONE
            ]
        );
    }

    #[test]
    fn execute_encodes_null_sentinel() {
        let body = execute(&[0x01], &[CqlValue::Null], Consistency::One).unwrap();
        assert_eq!(
            body,
            vec![0x00, 0x01, 0x01, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x01]
        );
    }

    #[test]
    fn register_encodes_string_list() {
        let body = register(&[EventType::TopologyChange, EventType::StatusChange]).unwrap();
        assert_eq!(&body[..2], &[0x00, 0x02]);
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("TOPOLOGY_CHANGE"));
        assert!(text.contains("STATUS_CHANGE"));
    }

    #[test]
    fn credentials_body_is_string_map() {
        let body = credentials(&[("username".to_string(), "cassandra".to_string())]).unwrap();
        assert_eq!(&body[..2], &[0x00, 0x01]);
    }
}
