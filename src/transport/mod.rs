//! # Transport
//!
//! The byte sink a finished packet is written to. The envelope calls
//! [`Transport::send`] exactly once per `Packet::send`, after finalization;
//! ordering and backpressure belong to the implementation.
//!
//! ## Implementations
//! - **IoTransport**: any `std::io::Write` (a `TcpStream`, a file, a `Vec<u8>`)
//! - **ChannelTransport**: hands frames to an async task over a tokio channel
//! - **`Vec<Bytes>`**: records each send separately, handy in tests

pub mod channel;

pub use channel::ChannelTransport;

use crate::error::Result;
use bytes::Bytes;
use std::io::Write;

/// Destination for finished packet bytes
pub trait Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Blocking transport over any writer
#[derive(Debug)]
pub struct IoTransport<W: Write> {
    writer: W,
}

impl<W: Write> IoTransport<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for IoTransport<W> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl Transport for Vec<Bytes> {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.push(Bytes::copy_from_slice(bytes));
        Ok(())
    }
}
