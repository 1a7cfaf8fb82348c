//! QSPI I/O line modes

use crate::error::{Error, Result};
use crate::transport::BusFeatures;

/// I/O mode for QSPI transactions
///
/// Describes how many lines carry the instruction, address and data
/// phases. The instruction phase is always single-line on this chip
/// family; QPI (4-4-4) is not used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IoMode {
    /// Standard SPI: 1-1-1 (cmd, addr, data all on single line)
    #[default]
    Single,
    /// Quad Output/Input: 1-1-4 (data phase on 4 lines)
    QuadOut,
    /// Quad I/O: 1-4-4 (addr and data on 4 lines)
    QuadIo,
}

impl IoMode {
    /// Returns the number of lines used for the address phase
    pub const fn addr_lines(&self) -> u8 {
        match self {
            Self::Single | Self::QuadOut => 1,
            Self::QuadIo => 4,
        }
    }

    /// Returns the number of lines used for the data phase
    pub const fn data_lines(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::QuadOut | Self::QuadIo => 4,
        }
    }
}

/// Check if a transport supports the requested I/O mode
///
/// Returns `Ok(())` if the mode is supported, or `Err(IoModeNotSupported)` if not.
pub fn check_io_mode_supported(mode: IoMode, features: BusFeatures) -> Result<()> {
    let required = match mode {
        IoMode::Single => return Ok(()),
        IoMode::QuadOut => BusFeatures::QUAD_IN,
        IoMode::QuadIo => BusFeatures::QUAD_IO,
    };

    if features.contains(required) {
        Ok(())
    } else {
        Err(Error::IoModeNotSupported)
    }
}
