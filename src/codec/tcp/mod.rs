// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP

use super::*;
use byteorder::{BigEndian, ByteOrder};
use std::sync::atomic::{AtomicU16, Ordering};

pub mod client;
pub use crate::frame::tcp::*;

/// Transaction id, protocol id, length and unit id.
pub const HEADER_LEN: usize = 7;

// [MODBUS MESSAGING ON TCP/IP IMPLEMENTATION GUIDE V1.0b](http://modbus.org/docs/Modbus_Messaging_Implementation_Guide_V1_0b.pdf), page 18
// "a MODBUS request needs a maximum of 256 bytes + the MBAP header size"
pub const MAX_FRAME_LEN: usize = 260;

/// The length field counts the unit id and the PDU.
pub const MAX_LENGTH_FIELD: usize = MAX_FRAME_LEN - HEADER_LEN + 1;

/// Codec for MBAP framed messages.
///
/// Every encoded request gets the next transaction id. The counter
/// is shared by all threads using the same codec.
#[derive(Debug)]
pub struct TcpCodec {
    unit_id: UnitId,
    transaction_id: AtomicU16,
}

impl TcpCodec {
    #[must_use]
    pub const fn new(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            transaction_id: AtomicU16::new(0),
        }
    }

    #[must_use]
    pub const fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    /// Address subsequent requests to another unit.
    pub fn set_unit_id(&mut self, unit_id: UnitId) {
        self.unit_id = unit_id;
    }

    /// Advance the transaction counter, wrapping at 2^16.
    pub fn next_transaction_id(&self) -> TransactionId {
        self.transaction_id
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
    }

    /// Header for the next request.
    pub fn next_request_hdr(&self) -> Header {
        Header {
            transaction_id: self.next_transaction_id(),
            unit_id: self.unit_id,
        }
    }
}

impl Codec for TcpCodec {
    const MAX_FRAME_LEN: usize = MAX_FRAME_LEN;
    const HEADER_LEN: usize = HEADER_LEN;

    fn encode(&self, pdu: &Pdu) -> Result<Vec<u8>> {
        client::encode_request(self.next_request_hdr(), pdu)
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()> {
        client::verify_response(request, response)
    }

    fn decode(&self, adu: &[u8]) -> Result<Pdu> {
        client::decode_response(adu)
    }

    fn response_len(&self, _request: &[u8], header: &[u8]) -> Result<usize> {
        response_frame_len(header)
    }
}

/// Total length of a response frame, derived from its MBAP header.
pub fn response_frame_len(header: &[u8]) -> Result<usize> {
    if header.len() < HEADER_LEN {
        return Err(Error::FrameTooShort(header.len(), HEADER_LEN));
    }
    let length = BigEndian::read_u16(&header[4..6]) as usize;
    // must be > 0 b/c the unit id counts towards the length
    if length == 0 || length > MAX_LENGTH_FIELD {
        return Err(Error::LengthField(length, MAX_LENGTH_FIELD));
    }
    Ok(HEADER_LEN - 1 + length)
}
