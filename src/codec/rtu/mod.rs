// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus RTU frames tunneled over a byte stream (DTU)

use super::*;
use byteorder::{BigEndian, ByteOrder};

pub mod client;
pub use crate::frame::rtu::*;

// [MODBUS over Serial Line Specification and Implementation Guide V1.02](http://modbus.org/docs/Modbus_over_serial_line_V1_02.pdf), page 13
// "The maximum size of a MODBUS RTU frame is 256 bytes."
pub const MAX_FRAME_LEN: usize = 256;

/// Slave address, function code and CRC.
pub const MIN_FRAME_LEN: usize = 4;

/// Slave address, function code, exception code and CRC.
pub const EXCEPTION_FRAME_LEN: usize = 5;

pub(crate) const CRC_LEN: usize = 2;

/// Codec for CRC-framed RTU messages.
///
/// Responses are correlated with requests by the slave address.
/// The frame checksum is always the Modbus CRC-16 ([`Crc16`](crate::checksum::Crc16)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtuCodec {
    hdr: Header,
}

impl RtuCodec {
    #[must_use]
    pub const fn new(slave: SlaveId) -> Self {
        Self {
            hdr: Header { slave },
        }
    }

    #[must_use]
    pub const fn slave(&self) -> SlaveId {
        self.hdr.slave
    }

    /// Address subsequent requests to another slave.
    pub fn set_slave(&mut self, slave: SlaveId) {
        self.hdr.slave = slave;
    }
}

impl Codec for RtuCodec {
    const MAX_FRAME_LEN: usize = MAX_FRAME_LEN;
    const HEADER_LEN: usize = MIN_FRAME_LEN;

    fn encode(&self, pdu: &Pdu) -> Result<Vec<u8>> {
        client::encode_request(self.hdr, pdu)
    }

    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()> {
        client::verify_response(request, response)
    }

    fn decode(&self, adu: &[u8]) -> Result<Pdu> {
        client::decode_response(adu)
    }

    fn response_len(&self, request: &[u8], header: &[u8]) -> Result<usize> {
        response_frame_len(request, header)
    }
}

/// Total length of a response frame, derived from its first
/// [`MIN_FRAME_LEN`] bytes.
///
/// An exception response is always [`EXCEPTION_FRAME_LEN`] bytes long.
/// Any other response must repeat the function code of the request and
/// fit into [`MAX_FRAME_LEN`] bytes.
pub fn response_frame_len(request: &[u8], header: &[u8]) -> Result<usize> {
    if header.len() < MIN_FRAME_LEN {
        return Err(Error::FrameTooShort(header.len(), MIN_FRAME_LEN));
    }
    let Some(&expected) = request.get(1) else {
        return Err(Error::FrameTooShort(request.len(), MIN_FRAME_LEN));
    };
    let fn_code = header[1];
    if fn_code == expected {
        let Some(pdu_len) = response_pdu_len(header)? else {
            return Err(Error::FnCode(fn_code));
        };
        let len = 1 + pdu_len + CRC_LEN;
        if len > MAX_FRAME_LEN {
            return Err(Error::FrameSize(len, MAX_FRAME_LEN));
        }
        return Ok(len);
    }
    if fn_code & 0x80 != 0 {
        return Ok(EXCEPTION_FRAME_LEN);
    }
    Err(Error::UnexpectedFnCode(expected, fn_code))
}

/// Extract the PDU length out of the ADU response buffer.
pub fn response_pdu_len(adu_buf: &[u8]) -> Result<Option<usize>> {
    if adu_buf.len() < 2 {
        return Ok(None);
    }
    let fn_code = adu_buf[1];
    let len = match fn_code {
        0x01..=0x04 | 0x0C | 0x11 | 0x17 => {
            if adu_buf.len() > 2 {
                Some(2 + adu_buf[2] as usize)
            } else {
                // incomplete frame
                None
            }
        }
        0x05 | 0x06 | 0x08 | 0x0B | 0x0F | 0x10 => Some(5),
        0x07 | 0x81..=0xAB => Some(2),
        0x16 => Some(7),
        0x18 => {
            if adu_buf.len() > 3 {
                Some(3 + BigEndian::read_u16(&adu_buf[2..=3]) as usize)
            } else {
                // incomplete frame
                None
            }
        }
        _ => return Err(Error::FnCode(fn_code)),
    };
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_pdu_len() {
        let buf = &mut [0x66, 0x01, 99];
        assert_eq!(response_pdu_len(buf).unwrap(), Some(101));

        let buf = &mut [0x66, 0x00, 99, 0x00];
        assert!(matches!(response_pdu_len(buf), Err(Error::FnCode(0))));

        let buf = &mut [0x66, 0xee, 99, 0x00];
        assert!(matches!(response_pdu_len(buf), Err(Error::FnCode(0xee))));

        for fn_code in [0x01, 0x02, 0x03, 0x04, 0x0C, 0x11, 0x17] {
            buf[1] = fn_code;
            assert_eq!(response_pdu_len(buf).unwrap(), Some(101));
        }

        for fn_code in [0x05, 0x06, 0x08, 0x0B, 0x0F, 0x10] {
            buf[1] = fn_code;
            assert_eq!(response_pdu_len(buf).unwrap(), Some(5));
        }

        buf[1] = 0x07;
        assert_eq!(response_pdu_len(buf).unwrap(), Some(2));

        buf[1] = 0x16;
        assert_eq!(response_pdu_len(buf).unwrap(), Some(7));

        buf[1] = 0x18;
        buf[2] = 0x01; // byte count Hi
        buf[3] = 0x00; // byte count Lo
        assert_eq!(response_pdu_len(buf).unwrap(), Some(259));

        for i in 0x81..0xAB {
            buf[1] = i;
            assert_eq!(response_pdu_len(buf).unwrap(), Some(2));
        }
    }

    #[test]
    fn incomplete_response_pdu_len() {
        assert_eq!(response_pdu_len(&[0x01]).unwrap(), None);
        assert_eq!(response_pdu_len(&[0x01, 0x03]).unwrap(), None);
        assert_eq!(response_pdu_len(&[0x01, 0x18, 0x00]).unwrap(), None);
    }

    mod frame_len {
        use super::*;

        const READ_HOLDING_REGISTERS: &[u8] = &[0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0xC4, 0x0B];

        #[test]
        fn read_registers_response() {
            // two registers: byte count 4
            let header = &[0x01, 0x03, 0x04, 0x00];
            assert_eq!(
                response_frame_len(READ_HOLDING_REGISTERS, header).unwrap(),
                9
            );
        }

        #[test]
        fn write_response() {
            let request = &[0x11, 0x06, 0x00, 0x01, 0x00, 0x03, 0x9A, 0x9B];
            let header = &[0x11, 0x06, 0x00, 0x01];
            assert_eq!(response_frame_len(request, header).unwrap(), 8);
        }

        #[test]
        fn exception_response() {
            let header = &[0x01, 0x83, 0x02, 0xC0];
            assert_eq!(
                response_frame_len(READ_HOLDING_REGISTERS, header).unwrap(),
                EXCEPTION_FRAME_LEN
            );
            // The exception flag wins even if the request implies something else.
            let header = &[0x01, 0x90, 0x7F, 0x00];
            assert_eq!(
                response_frame_len(READ_HOLDING_REGISTERS, header).unwrap(),
                EXCEPTION_FRAME_LEN
            );
        }

        #[test]
        fn unexpected_function_code() {
            let header = &[0x01, 0x04, 0x04, 0x00];
            assert!(matches!(
                response_frame_len(READ_HOLDING_REGISTERS, header),
                Err(Error::UnexpectedFnCode(0x03, 0x04))
            ));
        }

        #[test]
        fn unknown_layout() {
            let request = &[0x01, 0x41, 0x00, 0x00];
            let header = &[0x01, 0x41, 0x00, 0x00];
            assert!(matches!(
                response_frame_len(request, header),
                Err(Error::FnCode(0x41))
            ));
        }

        #[test]
        fn oversized_response() {
            let request = &[0x01, 0x18, 0x00, 0x00, 0x00, 0x00];
            let header = &[0x01, 0x18, 0xFF, 0xFF];
            assert!(matches!(
                response_frame_len(request, header),
                Err(Error::FrameSize(65_541, MAX_FRAME_LEN))
            ));

            // byte count 255 exceeds the frame limit by four bytes
            let header = &[0x01, 0x03, 0xFF, 0x00];
            assert!(matches!(
                response_frame_len(READ_HOLDING_REGISTERS, header),
                Err(Error::FrameSize(260, MAX_FRAME_LEN))
            ));

            // the largest frame that fits
            let header = &[0x01, 0x03, 0xFB, 0x00];
            assert_eq!(
                response_frame_len(READ_HOLDING_REGISTERS, header).unwrap(),
                MAX_FRAME_LEN
            );
        }

        #[test]
        fn short_header() {
            assert!(matches!(
                response_frame_len(READ_HOLDING_REGISTERS, &[0x01, 0x03]),
                Err(Error::FrameTooShort(2, MIN_FRAME_LEN))
            ));
        }
    }
}
