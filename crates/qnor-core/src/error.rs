//! Error types for qnor-core
//!
//! This module provides a no_std compatible error type shared by every
//! layer of the driver. Parameter errors are always raised before any bus
//! activity.

use core::fmt;

use crate::driver::Capability;

/// Which half of a bus transaction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Instruction/address/dummy phase
    Command,
    /// Data transmit or receive phase
    Data,
}

/// Details about a rejected caller-supplied parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    /// Page number is not below the page count
    PageOutOfRange {
        /// Requested page
        page: u32,
        /// Number of pages on the chip
        count: u32,
    },
    /// Intra-page shift plus transfer length runs past the page end
    ShiftOutOfRange {
        /// Requested shift
        shift: u32,
        /// Transfer length
        len: usize,
    },
    /// Transfer length outside the accepted range
    LengthOutOfRange {
        /// Requested length
        len: usize,
    },
    /// Raw address range exceeds the chip capacity
    AddressOutOfRange {
        /// Start address
        addr: u32,
        /// Transfer length
        len: usize,
    },
    /// Raw program would wrap around a page boundary
    CrossesPageBoundary {
        /// Start address
        addr: u32,
        /// Transfer length
        len: usize,
    },
    /// Sector index is not below the sector count
    SectorOutOfRange {
        /// Requested sector
        sector: u32,
        /// Number of sectors on the chip
        count: u32,
    },
    /// Block index is not below the block count for the requested size
    BlockOutOfRange {
        /// Requested block
        block: u32,
        /// Number of blocks of that size
        count: u32,
    },
    /// Block size is neither of the two supported erase quanta
    InvalidBlockSize {
        /// Requested size in KB
        size_kb: u32,
    },
    /// Status register selector outside {1, 2, 3}
    InvalidRegister {
        /// Requested register number
        which: u8,
    },
    /// Caller buffer does not match the descriptor's data phase
    PayloadMismatch,
    /// Configured geometry is inconsistent
    InvalidGeometry,
}

/// Chip state that makes the requested operation structurally illegal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipFault {
    /// A program/erase is in progress
    Busy,
    /// A program/erase is suspended
    Suspended,
    /// The geometry needs 4-byte addressing but the chip is still in 3-byte mode
    FourByteModeInactive,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Caller-supplied index, length or selector out of range
    Param(ParamError),
    /// Bus command or data phase failed; chip state may be stale
    Transport(Phase),
    /// Operation illegal given the current chip state
    Chip(ChipFault),
    /// The chip would ignore this command; short-circuited locally
    ChipIgnored,
    /// Capability not implemented by this driver
    Unsupported(Capability),
    /// The transport cannot drive the line width a command needs
    IoModeNotSupported,
    /// Busy polling exhausted its configured budget
    Timeout,
}

impl From<ParamError> for Error {
    fn from(e: ParamError) -> Self {
        Error::Param(e)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "command"),
            Self::Data => write!(f, "data"),
        }
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageOutOfRange { page, count } => {
                write!(f, "page {} out of range (chip has {} pages)", page, count)
            }
            Self::ShiftOutOfRange { shift, len } => {
                write!(f, "shift {} with length {} runs past the page end", shift, len)
            }
            Self::LengthOutOfRange { len } => write!(f, "transfer length {} out of range", len),
            Self::AddressOutOfRange { addr, len } => {
                write!(f, "range 0x{:08X}+{} exceeds chip capacity", addr, len)
            }
            Self::CrossesPageBoundary { addr, len } => {
                write!(f, "range 0x{:08X}+{} crosses a page boundary", addr, len)
            }
            Self::SectorOutOfRange { sector, count } => {
                write!(f, "sector {} out of range (chip has {} sectors)", sector, count)
            }
            Self::BlockOutOfRange { block, count } => {
                write!(f, "block {} out of range (chip has {} blocks)", block, count)
            }
            Self::InvalidBlockSize { size_kb } => write!(f, "unsupported block size {} KB", size_kb),
            Self::InvalidRegister { which } => write!(f, "no status register {}", which),
            Self::PayloadMismatch => write!(f, "buffer does not match the command's data phase"),
            Self::InvalidGeometry => write!(f, "inconsistent chip geometry"),
        }
    }
}

impl fmt::Display for ChipFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "chip is busy"),
            Self::Suspended => write!(f, "chip has a suspended operation"),
            Self::FourByteModeInactive => write!(f, "4-byte addressing is not active"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(e) => write!(f, "invalid parameter: {}", e),
            Self::Transport(phase) => write!(f, "bus {} phase failed", phase),
            Self::Chip(fault) => write!(f, "chip error: {}", fault),
            Self::ChipIgnored => write!(f, "command would be ignored by the chip"),
            Self::Unsupported(cap) => write!(f, "{:?} is not supported", cap),
            Self::IoModeNotSupported => write!(f, "I/O mode not supported by transport"),
            Self::Timeout => write!(f, "chip stayed busy past the polling budget"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
