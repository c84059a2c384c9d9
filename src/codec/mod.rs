// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{error::*, frame::*};
use core::convert::TryFrom;

#[cfg(feature = "rtu")]
pub mod rtu;
#[cfg(feature = "tcp")]
pub mod tcp;

/// Framing of PDUs into ADUs of one wire variant.
///
/// A [`Session`](crate::Session) only relies on this trait, so
/// either variant can be bound to the same transport machinery.
pub trait Codec {
    /// Upper bound of a single frame on the wire.
    const MAX_FRAME_LEN: usize;

    /// Number of bytes to read before the length of a response is known.
    const HEADER_LEN: usize;

    /// Wrap a PDU into a request frame.
    fn encode(&self, pdu: &Pdu) -> Result<Vec<u8>>;

    /// Check that `response` belongs to `request`.
    fn verify(&self, request: &[u8], response: &[u8]) -> Result<()>;

    /// Extract the PDU of a verified response frame.
    fn decode(&self, adu: &[u8]) -> Result<Pdu>;

    /// Total length of the response frame that starts with `header`.
    ///
    /// `header` holds exactly [`Self::HEADER_LEN`] bytes.
    fn response_len(&self, request: &[u8], header: &[u8]) -> Result<usize>;
}

impl TryFrom<u8> for Exception {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        use crate::frame::Exception::*;
        let ex = match code {
            0x01 => IllegalFunction,
            0x02 => IllegalDataAddress,
            0x03 => IllegalDataValue,
            0x04 => ServerDeviceFailure,
            0x05 => Acknowledge,
            0x06 => ServerDeviceBusy,
            0x08 => MemoryParityError,
            0x0A => GatewayPathUnavailable,
            0x0B => GatewayTargetDevice,
            _ => {
                return Err(Error::ExceptionCode(code));
            }
        };
        Ok(ex)
    }
}

impl TryFrom<&Pdu> for ExceptionResponse {
    type Error = Error;

    fn try_from(pdu: &Pdu) -> Result<Self> {
        let fn_err_code = pdu.fn_code();
        if fn_err_code < 0x80 {
            return Err(Error::ExceptionFnCode(fn_err_code));
        }
        let Some(&code) = pdu.data().first() else {
            return Err(Error::FrameTooShort(pdu.len(), 2));
        };
        let function = (fn_err_code - 0x80).into();
        let exception = Exception::try_from(code)?;
        Ok(ExceptionResponse {
            function,
            exception,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exception_response_from_pdu() {
        let pdu = Pdu::from_raw(0x79, vec![0x02]);
        assert!(matches!(
            ExceptionResponse::try_from(&pdu),
            Err(Error::ExceptionFnCode(0x79))
        ));

        let pdu = Pdu::from_raw(0x83, vec![0x02]);
        let rsp = ExceptionResponse::try_from(&pdu).unwrap();
        assert_eq!(
            rsp,
            ExceptionResponse {
                function: FunctionCode::ReadHoldingRegisters,
                exception: Exception::IllegalDataAddress,
            }
        );
    }

    #[test]
    fn exception_response_with_unknown_code() {
        let pdu = Pdu::from_raw(0x83, vec![0x42]);
        assert!(matches!(
            ExceptionResponse::try_from(&pdu),
            Err(Error::ExceptionCode(0x42))
        ));
        let pdu = Pdu::from_raw(0x83, vec![]);
        assert!(matches!(
            ExceptionResponse::try_from(&pdu),
            Err(Error::FrameTooShort(1, 2))
        ));
    }
}
