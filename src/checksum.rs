// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Frame checksums

/// A stateful 16 bit checksum accumulator.
pub trait Checksum {
    /// Restart the calculation.
    fn reset(&mut self);

    /// Feed more bytes.
    fn accumulate(&mut self, data: &[u8]);

    /// The checksum of all bytes fed since the last reset.
    fn value(&self) -> u16;
}

const CRC16_INIT: u16 = 0xFFFF;

/// Modbus CRC-16 (polynomial `0xA001`, reflected).
///
/// The value is transmitted low byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    #[must_use]
    pub const fn new() -> Self {
        Self { crc: CRC16_INIT }
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for Crc16 {
    fn reset(&mut self) {
        self.crc = CRC16_INIT;
    }

    fn accumulate(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for x in data {
            crc ^= u16::from(*x);
            for _ in 0..8 {
                #[allow(clippy::branches_sharing_code)]
                if (crc & 0x0001) != 0 {
                    crc >>= 1;
                    crc ^= 0xA001;
                } else {
                    crc >>= 1;
                }
            }
        }
        self.crc = crc;
    }

    fn value(&self) -> u16 {
        self.crc
    }
}

/// Calculate the CRC (Cyclic Redundancy Check) sum.
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.accumulate(data);
    crc.value()
}
