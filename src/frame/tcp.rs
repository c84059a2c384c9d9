// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

pub type TransactionId = u16;
pub type UnitId = u8;

/// The protocol id of Modbus in the MBAP header.
pub const PROTOCOL_ID: u16 = 0x0000;

/// MBAP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub transaction_id: TransactionId,
    pub unit_id: UnitId,
}
