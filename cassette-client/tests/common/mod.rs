//! Shared test harness: a scripted socket standing in for a server.

use cassette_client::CqlSocket;
use cassette_core::protocol::constants::*;
use cassette_core::serialization::{CqlType, CqlWrite, FrameBuffer};

use std::io::{self, Read};
use std::sync::{Arc, Mutex};

/// A socket fed from a pre-scripted sequence of server bytes.
///
/// Writes are captured so tests can assert exact request frames.
pub struct ScriptedSocket {
    input: io::Cursor<Vec<u8>>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedSocket {
    pub fn new(script: Vec<u8>) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                input: io::Cursor::new(script),
                written: Arc::clone(&written),
            },
            written,
        )
    }
}

impl CqlSocket for ScriptedSocket {
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.input.read_exact(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds a v1 response frame on stream 0.
pub fn server_frame(opcode: u8, body: &[u8]) -> Vec<u8> {
    frame(0x81, 0x00, 0x00, opcode, body)
}

/// Builds a v1 event frame (stream −1).
pub fn event_frame(body: &[u8]) -> Vec<u8> {
    frame(0x81, 0x00, 0xFF, OPCODE_EVENT, body)
}

/// Builds a v1 response frame with the compressed flag set.
pub fn compressed_frame(opcode: u8, body: &[u8]) -> Vec<u8> {
    frame(0x81, FLAG_COMPRESSED, 0x00, opcode, body)
}

fn frame(version: u8, flags: u8, stream: u8, opcode: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![version, flags, stream, opcode];
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

pub fn ready_frame() -> Vec<u8> {
    server_frame(OPCODE_READY, &[])
}

pub fn authenticate_frame(class: &str) -> Vec<u8> {
    let mut body = FrameBuffer::new();
    body.write_string(class).unwrap();
    server_frame(OPCODE_AUTHENTICATE, &body.into_bytes())
}

pub fn void_result_frame() -> Vec<u8> {
    let mut body = FrameBuffer::new();
    body.write_int(RESULT_KIND_VOID).unwrap();
    server_frame(OPCODE_RESULT, &body.into_bytes())
}

pub fn set_keyspace_frame(name: &str) -> Vec<u8> {
    let mut body = FrameBuffer::new();
    body.write_int(RESULT_KIND_SET_KEYSPACE).unwrap();
    body.write_string(name).unwrap();
    server_frame(OPCODE_RESULT, &body.into_bytes())
}

/// A prepared result with a global table spec and the given bind types.
pub fn prepared_frame(id: &[u8], binds: &[(&str, CqlType)]) -> Vec<u8> {
    let mut body = FrameBuffer::new();
    body.write_int(RESULT_KIND_PREPARED).unwrap();
    body.write_short_bytes(id).unwrap();
    body.write_int(ROWS_FLAG_GLOBAL_TABLES_SPEC).unwrap();
    body.write_int(binds.len() as i32).unwrap();
    body.write_string("ks").unwrap();
    body.write_string("t").unwrap();
    for (name, ty) in binds {
        body.write_string(name).unwrap();
        ty.encode(&mut body).unwrap();
    }
    server_frame(OPCODE_RESULT, &body.into_bytes())
}

/// A rows result with a global table spec.
pub fn rows_frame(columns: &[(&str, CqlType)], rows: &[Vec<Option<Vec<u8>>>]) -> Vec<u8> {
    let mut body = FrameBuffer::new();
    body.write_int(RESULT_KIND_ROWS).unwrap();
    body.write_int(ROWS_FLAG_GLOBAL_TABLES_SPEC).unwrap();
    body.write_int(columns.len() as i32).unwrap();
    body.write_string("ks").unwrap();
    body.write_string("t").unwrap();
    for (name, ty) in columns {
        body.write_string(name).unwrap();
        ty.encode(&mut body).unwrap();
    }
    body.write_int(rows.len() as i32).unwrap();
    for row in rows {
        for cell in row {
            body.write_bytes(cell.as_deref()).unwrap();
        }
    }
    server_frame(OPCODE_RESULT, &body.into_bytes())
}

pub fn error_frame(build: impl FnOnce(&mut FrameBuffer)) -> Vec<u8> {
    let mut body = FrameBuffer::new();
    build(&mut body);
    server_frame(OPCODE_ERROR, &body.into_bytes())
}
