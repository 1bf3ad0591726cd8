//! Connection Handle
//!
//! Owns the stream to one server. Reads are buffered; writes go straight to
//! the underlying stream and are flushed per frame.

use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, TyrantError};
use crate::protocol::ResponseReader;

use super::transport::send_all;

/// An open connection to one server
pub struct Connection<S: Read + Write = TcpStream> {
    /// Stream, buffered on the read side
    stream: BufReader<S>,

    /// Peer address for logging
    peer_addr: String,

    /// Set after a transport failure; the stream position is unknown
    broken: bool,
}

impl Connection<TcpStream> {
    /// Connect to the server named by `config`
    ///
    /// Applies TCP_NODELAY and any configured socket deadlines.
    pub fn open(config: &Config) -> Result<Self> {
        let addr = config.addr();

        let stream = if config.connect_timeout_ms > 0 {
            connect_with_timeout(&addr, Duration::from_millis(config.connect_timeout_ms))?
        } else {
            TcpStream::connect(&addr)?
        };

        // Small request frames must not wait on Nagle's algorithm
        stream.set_nodelay(config.nodelay)?;

        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| addr.clone());

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            stream: BufReader::new(stream),
            peer_addr,
            broken: false,
        })
    }

    /// Shut the socket down in both directions
    pub fn close(self) -> Result<()> {
        tracing::debug!("Closing connection to {}", self.peer_addr);
        match self.stream.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: Read + Write> Connection<S> {
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            peer_addr: "stream".to_string(),
            broken: false,
        }
    }

    /// Send one complete frame
    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        send_all(self.stream.get_mut(), frame)?;
        Ok(())
    }

    /// Reader for the response to the frame just sent
    pub fn response(&mut self) -> ResponseReader<'_, BufReader<S>> {
        ResponseReader::new(&mut self.stream)
    }

    /// Refuse further round trips on this stream
    pub fn mark_broken(&mut self) {
        if !self.broken {
            tracing::debug!("Discarding connection to {} after a transport failure", self.peer_addr);
        }
        self.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Borrow the underlying stream
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    /// Unwrap the underlying stream. Buffered but unread bytes are dropped.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
}

fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    let addrs = addr
        .to_socket_addrs()
        .map_err(|e| TyrantError::Config(format!("cannot resolve {}: {}", addr, e)))?;

    for socket_addr in addrs {
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(match last_err {
        Some(e) => e.into(),
        None => TyrantError::Config(format!("{} resolved to no addresses", addr)),
    })
}
