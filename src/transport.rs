// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Byte streams with deadlines

use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
    time::{Duration, Instant},
};

use crate::error::*;

/// Upper bound of reads while draining stale bytes.
const MAX_FLUSH_READS: usize = 16;

/// A connected byte stream whose blocking calls can be bounded in time.
///
/// An expired timeout must surface as [`io::ErrorKind::WouldBlock`] or
/// [`io::ErrorKind::TimedOut`], as the socket types of `std` do.
pub trait Transport: Read + Write {
    /// Bound subsequent reads. `None` blocks without limit.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Bound subsequent writes. `None` blocks without limit.
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Let reads return immediately if nothing is pending.
    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()>;

    /// Close both directions of the stream.
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }

    fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        TcpStream::set_nonblocking(self, nonblocking)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Time left until `deadline`.
///
/// Fails with [`Error::Timeout`] once the deadline has passed.
pub(crate) fn remaining(deadline: Option<Instant>) -> Result<Option<Duration>> {
    let Some(deadline) = deadline else {
        return Ok(None);
    };
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(Error::Timeout);
    }
    Ok(Some(left))
}

/// Write the whole buffer before `deadline`.
pub(crate) fn write_all<T>(
    transport: &mut T,
    mut buf: &[u8],
    deadline: Option<Instant>,
) -> Result<()>
where
    T: Transport + ?Sized,
{
    while !buf.is_empty() {
        transport.set_write_timeout(remaining(deadline)?)?;
        match transport.write(buf) {
            Ok(0) => return Err(Error::Io(io::ErrorKind::WriteZero.into())),
            Ok(n) => buf = &buf[n..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    transport.flush()?;
    Ok(())
}

/// Fill the whole buffer before `deadline`.
///
/// Partial reads are continued until the buffer is full, so a
/// frame that arrives in several chunks is still read completely.
pub(crate) fn read_exact<T>(
    transport: &mut T,
    mut buf: &mut [u8],
    deadline: Option<Instant>,
) -> Result<()>
where
    T: Transport + ?Sized,
{
    while !buf.is_empty() {
        transport.set_read_timeout(remaining(deadline)?)?;
        match transport.read(buf) {
            Ok(0) => return Err(Error::Io(io::ErrorKind::UnexpectedEof.into())),
            Ok(n) => buf = &mut buf[n..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Discard everything that is already pending on the stream.
///
/// Returns the number of discarded bytes. Finding nothing to read is
/// the expected outcome and not an error; a closed stream is.
pub(crate) fn flush<T>(transport: &mut T, buf: &mut [u8]) -> io::Result<usize>
where
    T: Transport + ?Sized,
{
    transport.set_nonblocking(true)?;
    let res = drain(transport, buf);
    transport.set_nonblocking(false)?;
    res
}

fn drain<T>(transport: &mut T, buf: &mut [u8]) -> io::Result<usize>
where
    T: Transport + ?Sized,
{
    let mut discarded = 0;
    for _ in 0..MAX_FLUSH_READS {
        match transport.read(buf) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => discarded += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Ok(discarded);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(discarded)
}
