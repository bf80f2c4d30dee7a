//! Connection-level protocol engine: handshake, request dispatch and
//! streaming body reads.

use cassette_core::compression::Decompressor;
use cassette_core::error::{CqlError, Result};
use cassette_core::protocol::constants::{
    OPCODE_AUTHENTICATE, OPCODE_CREDENTIALS, OPCODE_ERROR, OPCODE_READY, OPCODE_STARTUP,
};
use cassette_core::protocol::{request, ClusterEvent, Frame, FrameHeader, ProtocolVersion};
use cassette_core::serialization::CqlRead;

use crate::listener::EventSink;
use crate::security::Authenticator;

use super::socket::CqlSocket;

const DRAIN_CHUNK: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Ready,
    Closed,
}

/// A single connection to a Cassandra node.
///
/// The engine permits exactly one in-flight request: every request is
/// written on the same stream id, and the next response on that stream
/// answers it. Server events (stream −1) are decoded and handed to the
/// event sink whenever they interleave with a response.
pub struct Connection<S: CqlSocket> {
    socket: S,
    version: ProtocolVersion,
    stream: i8,
    state: ConnectionState,
    compression_agreed: bool,
    /// Body bytes of the current response not yet consumed.
    unread_body: usize,
    /// Inflated body of a compressed response, drawn down in place of
    /// the socket.
    inflated: Option<(Vec<u8>, usize)>,
    sink: Box<dyn EventSink>,
    decompressor: Option<Box<dyn Decompressor>>,
}

impl<S: CqlSocket> Connection<S> {
    /// Wraps an established socket; the handshake has not yet run.
    pub(crate) fn new(
        socket: S,
        version: ProtocolVersion,
        stream: i8,
        sink: Box<dyn EventSink>,
        decompressor: Option<Box<dyn Decompressor>>,
    ) -> Self {
        Self {
            socket,
            version,
            stream,
            state: ConnectionState::Ready,
            compression_agreed: false,
            unread_body: 0,
            inflated: None,
            sink,
            decompressor,
        }
    }

    /// Returns the negotiated protocol version.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Returns `true` once the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Returns the number of unconsumed body bytes of the current
    /// response; zero between requests.
    pub fn unread_body(&self) -> usize {
        self.unread_body
    }

    #[cfg(test)]
    pub(crate) fn socket_ref(&self) -> &S {
        &self.socket
    }

    /// Runs the STARTUP handshake, authenticating if the server asks.
    pub(crate) fn handshake(&mut self, authenticator: &dyn Authenticator) -> Result<()> {
        let offered = self.decompressor.as_ref().map(|d| d.algorithm().to_string());
        let body = request::startup(offered.as_deref())?;
        self.send(OPCODE_STARTUP, body)?;

        let header = self.read_response_header()?;
        match header.opcode {
            OPCODE_READY => {
                self.drain_body()?;
                self.compression_agreed = offered.is_some();
                tracing::debug!(version = ?self.version, "connection ready");
                Ok(())
            }
            OPCODE_AUTHENTICATE => {
                let class = self.read_string()?;
                self.drain_body()?;
                tracing::debug!(authenticator = %class, "server requires authentication");
                let pairs = authenticator.credentials(&class)?;
                self.send(OPCODE_CREDENTIALS, request::credentials(&pairs)?)?;

                let header = self.read_response_header()?;
                match header.opcode {
                    OPCODE_READY => {
                        self.drain_body()?;
                        self.compression_agreed = offered.is_some();
                        tracing::debug!("authenticated, connection ready");
                        Ok(())
                    }
                    OPCODE_ERROR => Err(self.read_error_body()?),
                    other => Err(self.unexpected_opcode(other)),
                }
            }
            OPCODE_ERROR => Err(self.read_error_body()?),
            other => Err(self.unexpected_opcode(other)),
        }
    }

    /// Sends one request and returns the header of its response.
    ///
    /// Fails with `BusyConnection` while a previous response body is
    /// unconsumed, and with `Closed` after an I/O failure or `close`.
    pub(crate) fn request(&mut self, opcode: u8, body: Vec<u8>) -> Result<FrameHeader> {
        self.send(opcode, body)?;
        self.read_response_header()
    }

    fn send(&mut self, opcode: u8, body: Vec<u8>) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(CqlError::Closed);
        }
        if self.unread_body > 0 {
            return Err(CqlError::BusyConnection);
        }
        let frame = Frame::request(self.version, self.stream, opcode, body)?;
        let bytes = frame.to_bytes();
        if let Err(e) = self.socket.write_all(&bytes) {
            self.state = ConnectionState::Closed;
            return Err(e.into());
        }
        Ok(())
    }

    /// Reads response headers, dispatching any interleaved event frames
    /// to the sink, until the pending request's response arrives.
    fn read_response_header(&mut self) -> Result<FrameHeader> {
        loop {
            let header = self.read_header()?;
            header.expect_response(self.version)?;
            self.begin_body(&header)?;

            if header.is_tracing() {
                // A traced response carries a 16-byte trace id before
                // the body proper.
                let trace_id = self.read_uuid()?;
                tracing::debug!(%trace_id, "server tracing id");
            }
            if header.is_event() {
                let event = ClusterEvent::decode(self)?;
                self.drain_body()?;
                self.sink.on_event(event);
                continue;
            }
            if header.stream != self.stream {
                self.drain_body()?;
                return Err(CqlError::Protocol(format!(
                    "response on unexpected stream {} (pending request on {})",
                    header.stream, self.stream
                )));
            }
            return Ok(header);
        }
    }

    fn read_header(&mut self) -> Result<FrameHeader> {
        if self.state == ConnectionState::Closed {
            return Err(CqlError::Closed);
        }
        let mut raw = [0u8; 8];
        if let Err(e) = self.socket.read_exact(&mut raw) {
            self.state = ConnectionState::Closed;
            return Err(e.into());
        }
        Ok(FrameHeader::decode(raw))
    }

    /// Establishes the body accounting for a freshly read header,
    /// inflating compressed bodies through the injected decompressor.
    fn begin_body(&mut self, header: &FrameHeader) -> Result<()> {
        let length = header.length as usize;
        self.inflated = None;
        if !header.is_compressed() {
            self.unread_body = length;
            return Ok(());
        }

        // Compressed bodies are read whole before inflating; without a
        // negotiated decompressor the raw bytes are discarded so the
        // connection stays usable.
        let mut raw = vec![0u8; length];
        if let Err(e) = self.socket.read_exact(&mut raw) {
            self.state = ConnectionState::Closed;
            return Err(e.into());
        }
        let decompressor = match &self.decompressor {
            Some(d) if self.compression_agreed => d,
            _ => {
                return Err(CqlError::Protocol(
                    "received compressed frame but compression was not negotiated".to_string(),
                ))
            }
        };
        let inflated = decompressor.decompress(&raw)?;
        self.unread_body = inflated.len();
        self.inflated = Some((inflated, 0));
        Ok(())
    }

    /// Decodes an ERROR body and drains whatever the decoder left.
    pub(crate) fn read_error_body(&mut self) -> Result<CqlError> {
        let err = CqlError::decode_body(self)?;
        self.drain_body()?;
        Ok(err)
    }

    pub(crate) fn unexpected_opcode(&mut self, opcode: u8) -> CqlError {
        if let Err(e) = self.drain_body() {
            return e;
        }
        CqlError::Protocol(format!("unexpected opcode 0x{:02X} in response", opcode))
    }

    /// Discards the rest of the current response body.
    pub(crate) fn drain_body(&mut self) -> Result<()> {
        if let Some((body, pos)) = &mut self.inflated {
            debug_assert_eq!(body.len() - *pos, self.unread_body);
            *pos = body.len();
            self.unread_body = 0;
            self.inflated = None;
            return Ok(());
        }
        let mut scratch = [0u8; DRAIN_CHUNK];
        while self.unread_body > 0 {
            let n = self.unread_body.min(DRAIN_CHUNK);
            if let Err(e) = self.socket.read_exact(&mut scratch[..n]) {
                self.state = ConnectionState::Closed;
                return Err(e.into());
            }
            self.unread_body -= n;
        }
        Ok(())
    }

    /// Drains any unread body bytes and shuts the socket down.
    ///
    /// Idempotent; a drain failure still closes the socket.
    pub(crate) fn close(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }
        let drained = self.drain_body();
        self.state = ConnectionState::Closed;
        let shut = self.socket.shutdown();
        tracing::debug!("connection closed");
        drained?;
        shut.map_err(Into::into)
    }

    fn body_read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.len() > self.unread_body {
            return Err(CqlError::Protocol(format!(
                "read of {} bytes exceeds remaining body of {}",
                buf.len(),
                self.unread_body
            )));
        }
        if let Some((body, pos)) = &mut self.inflated {
            buf.copy_from_slice(&body[*pos..*pos + buf.len()]);
            *pos += buf.len();
        } else if let Err(e) = self.socket.read_exact(buf) {
            self.state = ConnectionState::Closed;
            return Err(e.into());
        }
        self.unread_body -= buf.len();
        if self.unread_body == 0 {
            self.inflated = None;
        }
        Ok(())
    }
}

/// Body reads draw from the socket (or the inflated body) and decrement
/// the unread-body counter, so a response can be decoded incrementally.
impl<S: CqlSocket> CqlRead for Connection<S> {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.body_read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_short(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.body_read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.body_read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn read_long(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.body_read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    fn read_float(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.body_read_exact(&mut buf)?;
        Ok(f32::from_be_bytes(buf))
    }

    fn read_double(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.body_read_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    fn read_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.body_read_exact(&mut buf)?;
        Ok(buf)
    }
}
