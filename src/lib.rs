// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

#![doc = include_str!("../README.md")]

pub mod checksum;
mod client;
mod codec;
mod error;
mod frame;
mod handler;
pub mod session;
pub mod transport;

#[cfg(feature = "rtu")]
pub use codec::rtu;
#[cfg(feature = "tcp")]
pub use codec::tcp;

pub use client::Client;
pub use codec::Codec;
pub use error::*;
pub use frame::*;
pub use handler::Handler;
#[cfg(feature = "rtu")]
pub use handler::RtuHandler;
#[cfg(feature = "tcp")]
pub use handler::TcpHandler;
pub use session::{Config, Session};
pub use transport::Transport;
