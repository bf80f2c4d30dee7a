//! The injected socket collaborator and its TCP implementation.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A blocking byte stream carrying one CQL connection.
///
/// The engine never creates sockets itself; implementations may wrap the
/// stream in TLS or a proxy transparently. Read and write deadlines are
/// the implementation's responsibility; an elapsed deadline surfaces as
/// an I/O error and closes the connection.
pub trait CqlSocket {
    /// Fills the whole buffer from the stream.
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Writes the whole buffer to the stream.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Shuts the stream down; further use fails.
    fn shutdown(&mut self) -> io::Result<()>;
}

/// Plain TCP implementation of [`CqlSocket`].
#[derive(Debug)]
pub struct TcpSocket {
    stream: TcpStream,
}

impl TcpSocket {
    /// Connects to the given address, trying each resolved endpoint.
    pub fn connect(address: &str, timeout: Duration) -> io::Result<Self> {
        let mut last_err = None;
        for addr in address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(Self { stream });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("address {:?} did not resolve", address),
            )
        }))
    }
}

impl CqlSocket for TcpSocket {
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.stream.read_exact(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown(Shutdown::Both)
    }
}
