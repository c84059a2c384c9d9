// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;
use std::io;

use crate::frame::{ExceptionResponse, SlaveId, TransactionId, UnitId};

/// modbus-dtu Result
pub type Result<T> = core::result::Result<T, Error>;

/// modbus-dtu Error
#[derive(Debug)]
pub enum Error {
    /// Encoded frame exceeds the wire maximum: (size, max)
    FrameSize(usize, usize),
    /// Response frame is shorter than the minimum frame: (length, min)
    FrameTooShort(usize, usize),
    /// Length Mismatch
    LengthMismatch(usize, usize),
    /// Byte count of a read response does not match: (expected, actual)
    ByteCount(usize, usize),
    /// Invalid length field in a response header: (value, max)
    LengthField(usize, usize),
    /// Invalid function code
    FnCode(u8),
    /// Response function code differs from the request: (expected, actual)
    UnexpectedFnCode(u8, u8),
    /// Invalid exception code
    ExceptionCode(u8),
    /// Invalid exception function code
    ExceptionFnCode(u8),
    /// The server answered with an exception
    Exception(ExceptionResponse),
    /// Invalid CRC
    Crc(u16, u16),
    /// Response slave id differs from the request: (expected, actual)
    SlaveId(SlaveId, SlaveId),
    /// Response transaction id differs from the request: (expected, actual)
    TransactionId(TransactionId, TransactionId),
    /// Response protocol id differs from the request: (expected, actual)
    ProtocolId(u16, u16),
    /// Response unit id differs from the request: (expected, actual)
    UnitId(UnitId, UnitId),
    /// The deadline of the exchange expired
    Timeout,
    /// I/O error of the underlying connection
    Io(io::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SizeViolation,
    LengthViolation,
    IdentityMismatch,
    IntegrityFailure,
    ProtocolViolation,
    Exception,
    TransportFailure,
    DeadlineExceeded,
}

impl Error {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        use Error::*;

        match self {
            FrameSize(..) => ErrorKind::SizeViolation,
            FrameTooShort(..) | LengthMismatch(..) | ByteCount(..) | LengthField(..) => {
                ErrorKind::LengthViolation
            }
            SlaveId(..) | TransactionId(..) | ProtocolId(..) | UnitId(..) => {
                ErrorKind::IdentityMismatch
            }
            Crc(..) => ErrorKind::IntegrityFailure,
            FnCode(_) | UnexpectedFnCode(..) => ErrorKind::ProtocolViolation,
            ExceptionCode(_) | ExceptionFnCode(_) | Exception(_) => ErrorKind::Exception,
            Io(_) => ErrorKind::TransportFailure,
            Timeout => ErrorKind::DeadlineExceeded,
        }
    }

    /// `true` if the exchange ran into its deadline.
    ///
    /// Such a request may have reached the server, so only
    /// idempotent requests should be retried.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            FrameSize(size, max) => {
                write!(f, "Invalid frame size: {size} exceeds the maximum of {max}")
            }
            FrameTooShort(len, min) => {
                write!(f, "Response too short: {len} byte(s), expected at least {min}")
            }
            LengthMismatch(length_field, pdu_len) => write!(
                f,
                "Length Mismatch: Length Field: {length_field}, PDU Len + 1: {pdu_len}"
            ),
            ByteCount(expected, actual) => write!(
                f,
                "Invalid byte count: expected = {expected}, actual = {actual}"
            ),
            LengthField(value, max) => write!(
                f,
                "Invalid length in response header: {value}, expected 1..={max}"
            ),
            FnCode(fn_code) => write!(f, "Invalid function code: 0x{fn_code:0>2X}"),
            UnexpectedFnCode(expected, actual) => write!(
                f,
                "Unexpected function code: expected = 0x{expected:0>2X}, actual = 0x{actual:0>2X}"
            ),
            ExceptionCode(code) => write!(f, "Invalid exception code: 0x{code:0>2X}"),
            ExceptionFnCode(code) => write!(f, "Invalid exception function code: 0x{code:0>2X}"),
            Exception(rsp) => write!(
                f,
                "Exception response to function 0x{:0>2X}: {}",
                rsp.function.value(),
                rsp.exception
            ),
            Crc(expected, actual) => write!(
                f,
                "Invalid CRC: expected = 0x{expected:0>4X}, actual = 0x{actual:0>4X}"
            ),
            SlaveId(expected, actual) => {
                write!(f, "Invalid slave id: expected = {expected}, actual = {actual}")
            }
            TransactionId(expected, actual) => write!(
                f,
                "Invalid transaction id: expected = {expected}, actual = {actual}"
            ),
            ProtocolId(expected, actual) => write!(
                f,
                "Invalid protocol id: expected = {expected}, actual = {actual}"
            ),
            UnitId(expected, actual) => {
                write!(f, "Invalid unit id: expected = {expected}, actual = {actual}")
            }
            Timeout => write!(f, "Deadline exceeded"),
            Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            // Depending on the platform an expired socket timeout
            // is reported as either of these.
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(err),
        }
    }
}
