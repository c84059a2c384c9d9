// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response exchange over a shared connection

use std::{
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    codec::Codec,
    error::*,
    transport::{self, Transport},
};

/// Default deadline of a single exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default period of inactivity after which a connection counts as idle.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deadline of a whole exchange (write and all reads).
    ///
    /// [`Duration::ZERO`] disables the deadline.
    pub timeout: Duration,
    /// See [`Session::is_idle`].
    ///
    /// [`Duration::ZERO`] disables idle detection.
    pub idle_timeout: Duration,
    /// Log every request and response frame at `debug` level.
    pub log_frames: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            log_frames: false,
        }
    }
}

#[derive(Debug)]
struct State<T> {
    transport: T,
    timeout: Duration,
    last_activity: Instant,
}

/// A connection that carries one exchange at a time.
///
/// [`Session::send`] holds the lock from writing the request until
/// the response has been read completely or the exchange failed.
/// Requests are never pipelined.
#[derive(Debug)]
pub struct Session<T> {
    state: Mutex<State<T>>,
    idle_timeout: Duration,
    log_frames: AtomicBool,
}

impl<T: Transport> Session<T> {
    /// Bind an already connected transport. No I/O is performed.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, Config::default())
    }

    pub fn with_config(transport: T, config: Config) -> Self {
        let Config {
            timeout,
            idle_timeout,
            log_frames,
        } = config;
        Self {
            state: Mutex::new(State {
                transport,
                timeout,
                last_activity: Instant::now(),
            }),
            idle_timeout,
            log_frames: AtomicBool::new(log_frames),
        }
    }

    // Leftovers of a panicked exchange are flushed by the next failed read.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.lock().timeout
    }

    /// Change the deadline of subsequent exchanges.
    pub fn set_timeout(&self, timeout: Duration) {
        self.lock().timeout = timeout;
    }

    pub fn set_log_frames(&self, enabled: bool) {
        self.log_frames.store(enabled, Ordering::Relaxed);
    }

    /// Start of the most recent exchange.
    #[must_use]
    pub fn last_activity(&self) -> Instant {
        self.lock().last_activity
    }

    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_activity().elapsed()
    }

    /// `true` if no exchange started within the configured idle timeout.
    ///
    /// The session never closes itself; this is meant for whoever
    /// manages the lifetime of the connection.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.idle_timeout.is_zero() && self.idle_for() >= self.idle_timeout
    }

    /// Close the underlying connection.
    pub fn shutdown(&self) -> Result<()> {
        self.lock().transport.shutdown()?;
        Ok(())
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .transport
    }

    /// Write `request` and read exactly the frame that answers it.
    ///
    /// The length of the response is learned from its first
    /// [`Codec::HEADER_LEN`] bytes. If reading fails, bytes still
    /// pending on the connection are discarded before the error is
    /// returned, so the next exchange starts on a frame boundary.
    pub fn send<C: Codec>(&self, codec: &C, request: &[u8]) -> Result<Vec<u8>> {
        let mut guard = self.lock();
        let state = &mut *guard;

        state.last_activity = Instant::now();
        let deadline = (!state.timeout.is_zero()).then(|| state.last_activity + state.timeout);

        let log_frames = self.log_frames.load(Ordering::Relaxed);
        if log_frames {
            log::debug!("Sending {request:02X?}");
        }
        transport::write_all(&mut state.transport, request, deadline)?;

        let mut buf = vec![0; C::MAX_FRAME_LEN];
        match read_response(&mut state.transport, codec, request, &mut buf, deadline) {
            Ok(len) => {
                buf.truncate(len);
                if log_frames {
                    log::debug!("Received {buf:02X?}");
                }
                Ok(buf)
            }
            Err(err) => {
                match transport::flush(&mut state.transport, &mut buf) {
                    Ok(0) => {}
                    Ok(n) => log::debug!("Discarded {n} stale byte(s) after: {err}"),
                    Err(flush_err) => log::warn!("Failed to flush connection: {flush_err}"),
                }
                Err(err)
            }
        }
    }
}

fn read_response<T, C>(
    transport: &mut T,
    codec: &C,
    request: &[u8],
    buf: &mut [u8],
    deadline: Option<Instant>,
) -> Result<usize>
where
    T: Transport,
    C: Codec,
{
    let header_len = C::HEADER_LEN;
    transport::read_exact(transport, &mut buf[..header_len], deadline)?;
    let len = codec
        .response_len(request, &buf[..header_len])
        .inspect_err(|err| {
            log::warn!("Invalid response header {:02X?}: {err}", &buf[..header_len]);
        })?;
    if len > buf.len() {
        return Err(Error::FrameSize(len, buf.len()));
    }
    if len < header_len {
        return Err(Error::FrameTooShort(len, header_len));
    }
    // Only read on if the header did not already contain the whole frame.
    if len > header_len {
        transport::read_exact(transport, &mut buf[header_len..len], deadline)?;
    }
    Ok(len)
}
