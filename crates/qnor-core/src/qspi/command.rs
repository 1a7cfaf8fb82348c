//! QSPI command descriptor

use super::{AddressWidth, IoMode};

/// Data phase of a transaction, as announced in the command phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DataPhase {
    /// No data phase
    #[default]
    None,
    /// Host transmits this many bytes
    Transmit(usize),
    /// Host receives this many bytes
    Receive(usize),
}

impl DataPhase {
    /// Returns true if there is no data phase
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A single QSPI transaction descriptor
///
/// Built fresh for every call and handed to the transport's command
/// phase. It carries no buffers: the dispatcher pairs it with the caller's
/// payload for the data phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QspiCommand {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// I/O mode (line count per phase)
    pub io_mode: IoMode,

    /// Number of dummy cycles after address
    pub dummy_cycles: u8,

    /// Data phase direction and length
    pub data: DataPhase,
}

impl QspiCommand {
    /// Create a simple command with no address or data (e.g., WREN, DP)
    pub const fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            io_mode: IoMode::Single,
            dummy_cycles: 0,
            data: DataPhase::None,
        }
    }

    /// Create a one-byte register read with no address (e.g., RDSR1)
    pub const fn read_reg(opcode: u8) -> Self {
        Self {
            data: DataPhase::Receive(1),
            ..Self::simple(opcode)
        }
    }

    /// Create a one-byte register write with no address (e.g., WRSR2)
    pub const fn write_reg(opcode: u8) -> Self {
        Self {
            data: DataPhase::Transmit(1),
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed read of `len` bytes
    pub const fn read(opcode: u8, addr: u32, width: AddressWidth, len: usize) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            data: DataPhase::Receive(len),
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed write of `len` bytes
    pub const fn write(opcode: u8, addr: u32, width: AddressWidth, len: usize) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            data: DataPhase::Transmit(len),
            ..Self::simple(opcode)
        }
    }

    /// Create an address-only command (e.g., sector erase)
    pub const fn erase(opcode: u8, addr: u32, width: AddressWidth) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            ..Self::simple(opcode)
        }
    }

    /// Set the I/O mode for this command
    pub const fn with_io_mode(mut self, mode: IoMode) -> Self {
        self.io_mode = mode;
        self
    }

    /// Set the number of dummy cycles
    pub const fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Returns true if this command has an address phase
    pub const fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Returns true if this command has a data phase
    pub const fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qspi::opcodes;

    #[test]
    fn test_simple_has_no_phases() {
        let cmd = QspiCommand::simple(opcodes::WREN);
        assert!(!cmd.has_address());
        assert!(!cmd.has_data());
        assert_eq!(cmd.address_width.bits(), 0);
    }

    #[test]
    fn test_quad_read_descriptor() {
        let cmd = QspiCommand::read(opcodes::QIOR_4B, 0x0100_0000, AddressWidth::FourByte, 16)
            .with_io_mode(IoMode::QuadIo)
            .with_dummy_cycles(opcodes::QIOR_DUMMY_CYCLES);

        assert_eq!(cmd.address, Some(0x0100_0000));
        assert_eq!(cmd.address_width.bits(), 32);
        assert_eq!(cmd.io_mode.addr_lines(), 4);
        assert_eq!(cmd.dummy_cycles, 6);
        assert_eq!(cmd.data, DataPhase::Receive(16));
    }

    #[test]
    fn test_erase_has_no_data() {
        let cmd = QspiCommand::erase(opcodes::SE, 0x1000, AddressWidth::ThreeByte);
        assert!(cmd.has_address());
        assert!(!cmd.has_data());
        assert_eq!(cmd.data, DataPhase::None);
    }
}
