// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU client (master) specific functions.
use super::*;
use crate::checksum::{Checksum, Crc16};
use byteorder::LittleEndian;

/// Encode an RTU request.
///
/// The trailer is the [`Crc16`] of all preceding bytes, low byte first.
pub fn encode_request(hdr: Header, pdu: &Pdu) -> Result<Vec<u8>> {
    let len = MIN_FRAME_LEN + pdu.data().len();
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameSize(len, MAX_FRAME_LEN));
    }
    let mut buf = vec![0; len];
    buf[0] = hdr.slave;
    buf[1] = pdu.fn_code();
    buf[2..len - CRC_LEN].copy_from_slice(pdu.data());
    let mut crc = Crc16::new();
    crc.accumulate(&buf[..len - CRC_LEN]);
    LittleEndian::write_u16(&mut buf[len - CRC_LEN..], crc.value());
    Ok(buf)
}

/// Check that the response comes from the addressed slave.
pub fn verify_response(request: &[u8], response: &[u8]) -> Result<()> {
    if response.len() < MIN_FRAME_LEN {
        return Err(Error::FrameTooShort(response.len(), MIN_FRAME_LEN));
    }
    let Some(&slave) = request.first() else {
        return Err(Error::FrameTooShort(0, MIN_FRAME_LEN));
    };
    if response[0] != slave {
        return Err(Error::SlaveId(slave, response[0]));
    }
    Ok(())
}

/// Decode an RTU response.
///
/// Only the CRC is checked; the slave address has to be
/// checked with [`verify_response`] before.
pub fn decode_response(adu: &[u8]) -> Result<Pdu> {
    if adu.len() < MIN_FRAME_LEN {
        return Err(Error::FrameTooShort(adu.len(), MIN_FRAME_LEN));
    }
    let (adu_buf, crc_buf) = adu.split_at(adu.len() - CRC_LEN);
    // Read trailing CRC and verify ADU
    let expected_crc = LittleEndian::read_u16(crc_buf);
    let mut crc = Crc16::new();
    crc.accumulate(adu_buf);
    let actual_crc = crc.value();
    if expected_crc != actual_crc {
        log::debug!("Dropping RTU frame with invalid CRC: {adu:02X?}");
        return Err(Error::Crc(expected_crc, actual_crc));
    }
    Ok(Pdu::from_raw(adu_buf[1], &adu_buf[2..]))
}
