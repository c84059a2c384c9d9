// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::net::TcpStream;

use crate::{
    codec::Codec,
    error::*,
    frame::Pdu,
    session::{Config, Session},
    transport::Transport,
};

#[cfg(feature = "rtu")]
use crate::codec::rtu::RtuCodec;
#[cfg(feature = "tcp")]
use crate::codec::tcp::TcpCodec;

/// One codec bound to one connection.
///
/// All methods take `&self`, so a handler can be shared between
/// threads. Exchanges on the connection are serialized by the
/// [`Session`].
#[derive(Debug)]
pub struct Handler<C, T = TcpStream> {
    codec: C,
    session: Session<T>,
}

/// Handler for RTU frames tunneled over a stream.
#[cfg(feature = "rtu")]
pub type RtuHandler<T = TcpStream> = Handler<RtuCodec, T>;

/// Handler for MBAP frames.
#[cfg(feature = "tcp")]
pub type TcpHandler<T = TcpStream> = Handler<TcpCodec, T>;

impl<C, T> Handler<C, T>
where
    C: Codec,
    T: Transport,
{
    /// Bind a connected transport with the default configuration.
    ///
    /// No I/O is performed.
    pub fn new(codec: C, transport: T) -> Self {
        Self::with_config(codec, transport, Config::default())
    }

    pub fn with_config(codec: C, transport: T, config: Config) -> Self {
        Self {
            codec,
            session: Session::with_config(transport, config),
        }
    }

    pub fn encode(&self, pdu: &Pdu) -> Result<Vec<u8>> {
        self.codec.encode(pdu)
    }

    pub fn verify(&self, request: &[u8], response: &[u8]) -> Result<()> {
        self.codec.verify(request, response)
    }

    pub fn decode(&self, adu: &[u8]) -> Result<Pdu> {
        self.codec.decode(adu)
    }

    /// Write an encoded request and read its response frame.
    pub fn send(&self, request: &[u8]) -> Result<Vec<u8>> {
        self.session.send(&self.codec, request)
    }

    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Change the addressing of subsequent requests.
    pub fn codec_mut(&mut self) -> &mut C {
        &mut self.codec
    }

    pub const fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn into_parts(self) -> (C, Session<T>) {
        let Self { codec, session } = self;
        (codec, session)
    }
}
