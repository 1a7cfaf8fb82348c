//! Status register decoding
//!
//! The W25Q family exposes three 8-bit status registers. Only the bits the
//! driver acts on are named here; the rest are preserved untouched when a
//! register is rewritten.

use bitflags::bitflags;

use crate::error::{ParamError, Result};
use crate::qspi::opcodes;

bitflags! {
    /// Status Register 1 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Sr1: u8 {
        /// Erase/write in progress
        const BUSY = 1 << 0;
        /// Write enable latch
        const WEL  = 1 << 1;
    }
}

bitflags! {
    /// Status Register 2 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Sr2: u8 {
        /// Quad enable
        const QE  = 1 << 1;
        /// Erase/program suspend status
        const SUS = 1 << 7;
    }
}

bitflags! {
    /// Status Register 3 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Sr3: u8 {
        /// Current address mode (1 = 4-byte)
        const ADS = 1 << 0;
        /// Power-up address mode (non-volatile)
        const ADP = 1 << 1;
    }
}

/// One of the three status registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusRegister {
    /// Status Register 1
    One,
    /// Status Register 2
    Two,
    /// Status Register 3
    Three,
}

impl StatusRegister {
    /// Select a register by its 1-based number
    pub fn from_index(which: u8) -> Result<Self> {
        match which {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            _ => Err(ParamError::InvalidRegister { which }.into()),
        }
    }

    /// Opcode that reads this register
    pub const fn read_opcode(self) -> u8 {
        match self {
            Self::One => opcodes::RDSR1,
            Self::Two => opcodes::RDSR2,
            Self::Three => opcodes::RDSR3,
        }
    }

    /// Opcode that writes this register
    pub const fn write_opcode(self) -> u8 {
        match self {
            Self::One => opcodes::WRSR1,
            Self::Two => opcodes::WRSR2,
            Self::Three => opcodes::WRSR3,
        }
    }
}

/// Coarse chip state derived from the status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipState {
    /// Ready to accept commands
    Idle,
    /// A program/erase is running
    Busy,
    /// A program/erase is suspended
    Suspended,
}

/// Driver-side snapshot of the chip's status bits
///
/// Refreshed from the chip after every state-changing command. The
/// `sleeping` flag has no hardware counterpart; the driver sets it on
/// power-down and clears it on wake-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StatusFlags {
    /// SR1 BUSY
    pub busy: bool,
    /// SR1 WEL
    pub write_enable_latch: bool,
    /// SR2 QE
    pub quad_enable: bool,
    /// SR2 SUS
    pub suspended: bool,
    /// SR3 ADS
    pub address_4byte: bool,
    /// SR3 ADP
    pub power_up_4byte: bool,
    /// Chip was put into deep power-down by the driver
    pub sleeping: bool,
}

impl StatusFlags {
    /// Build a snapshot from raw register values
    pub fn decode(sr1: u8, sr2: u8, sr3: u8, sleeping: bool) -> Self {
        let sr1 = Sr1::from_bits_retain(sr1);
        let sr2 = Sr2::from_bits_retain(sr2);
        let sr3 = Sr3::from_bits_retain(sr3);
        Self {
            busy: sr1.contains(Sr1::BUSY),
            write_enable_latch: sr1.contains(Sr1::WEL),
            quad_enable: sr2.contains(Sr2::QE),
            suspended: sr2.contains(Sr2::SUS),
            address_4byte: sr3.contains(Sr3::ADS),
            power_up_4byte: sr3.contains(Sr3::ADP),
            sleeping,
        }
    }

    /// Coarse state; a suspended operation wins over a busy flag
    pub fn state(&self) -> ChipState {
        if self.suspended {
            ChipState::Suspended
        } else if self.busy {
            ChipState::Busy
        } else {
            ChipState::Idle
        }
    }
}
