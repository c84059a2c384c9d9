// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus client (master) on top of a [`Handler`]

use std::net::TcpStream;

use byteorder::{BigEndian, ByteOrder};

use crate::{
    codec::Codec,
    error::*,
    frame::{ExceptionResponse, FunctionCode, Pdu},
    handler::Handler,
    transport::Transport,
};

#[cfg(feature = "rtu")]
use crate::codec::rtu::{RtuCodec, SlaveId};
#[cfg(feature = "tcp")]
use crate::codec::tcp::{TcpCodec, UnitId};

/// A client issuing one request at a time per calling thread.
#[derive(Debug)]
pub struct Client<C, T = TcpStream> {
    handler: Handler<C, T>,
}

#[cfg(feature = "rtu")]
impl Client<RtuCodec> {
    /// RTU frames to `slave` over an already connected stream.
    pub fn rtu(stream: TcpStream, slave: SlaveId) -> Self {
        Self::new(Handler::new(RtuCodec::new(slave), stream))
    }
}

#[cfg(feature = "tcp")]
impl Client<TcpCodec> {
    /// MBAP frames to `unit_id` over an already connected stream.
    pub fn tcp(stream: TcpStream, unit_id: UnitId) -> Self {
        Self::new(Handler::new(TcpCodec::new(unit_id), stream))
    }
}

impl<C, T> Client<C, T>
where
    C: Codec,
    T: Transport,
{
    pub const fn new(handler: Handler<C, T>) -> Self {
        Self { handler }
    }

    pub const fn handler(&self) -> &Handler<C, T> {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut Handler<C, T> {
        &mut self.handler
    }

    pub fn into_handler(self) -> Handler<C, T> {
        self.handler
    }

    /// Send a request and return the response PDU.
    ///
    /// An exception response is returned as [`Error::Exception`].
    pub fn execute(&self, request: &Pdu) -> Result<Pdu> {
        let req_adu = self.handler.encode(request)?;
        let rsp_adu = self.handler.send(&req_adu)?;
        self.handler.verify(&req_adu, &rsp_adu)?;
        let response = self.handler.decode(&rsp_adu)?;

        let expected = request.fn_code();
        let actual = response.fn_code();
        if actual == expected {
            return Ok(response);
        }
        if actual == expected | 0x80 {
            let exception = ExceptionResponse::try_from(&response)?;
            return Err(Error::Exception(exception));
        }
        Err(Error::UnexpectedFnCode(expected, actual))
    }

    /// Read `quantity` holding registers starting at `address`.
    pub fn read_holding_registers(&self, address: u16, quantity: u16) -> Result<Vec<u16>> {
        let mut data = [0; 4];
        BigEndian::write_u16(&mut data[0..2], address);
        BigEndian::write_u16(&mut data[2..4], quantity);
        let request = Pdu::new(FunctionCode::ReadHoldingRegisters, data);
        let response = self.execute(&request)?;

        let data = response.data();
        let Some((&byte_count, values)) = data.split_first() else {
            return Err(Error::FrameTooShort(response.len(), 2));
        };
        let byte_count = usize::from(byte_count);
        let expected = 2 * usize::from(quantity);
        if byte_count != expected {
            return Err(Error::ByteCount(expected, byte_count));
        }
        if values.len() != byte_count {
            return Err(Error::ByteCount(byte_count, values.len()));
        }
        Ok(values.chunks_exact(2).map(BigEndian::read_u16).collect())
    }

    /// Write `value` to the holding register at `address`.
    pub fn write_single_register(&self, address: u16, value: u16) -> Result<()> {
        let mut data = [0; 4];
        BigEndian::write_u16(&mut data[0..2], address);
        BigEndian::write_u16(&mut data[2..4], value);
        let request = Pdu::new(FunctionCode::WriteSingleRegister, data);
        self.execute(&request)?;
        Ok(())
    }
}

impl<C, T> From<Handler<C, T>> for Client<C, T>
where
    C: Codec,
    T: Transport,
{
    fn from(handler: Handler<C, T>) -> Self {
        Self::new(handler)
    }
}
