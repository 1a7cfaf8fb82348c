//! Error types for the emulator

use qnor_core::Phase;
use thiserror::Error;

/// Ways the emulated chip rejects a transaction
///
/// A real chip silently ignores most of these; the emulator reports them
/// so tests catch driver sequencing mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DummyError {
    /// Failure injected with `fail_on`
    #[error("injected {phase} phase failure on opcode 0x{opcode:02X}")]
    Injected {
        /// Opcode the fault was armed for
        opcode: u8,
        /// Phase that failed
        phase: Phase,
    },

    /// Opcode the emulator does not model
    #[error("unsupported opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Address field width disagrees with the opcode and address mode
    #[error("opcode 0x{opcode:02X} sent with a {bits}-bit address")]
    AddressWidth {
        /// Offending opcode
        opcode: u8,
        /// Width that was sent
        bits: u8,
    },

    /// Address outside the array
    #[error("address 0x{addr:08X} out of range")]
    AddressOutOfRange {
        /// Offending address
        addr: u32,
    },

    /// Program, erase or status write without a preceding WREN
    #[error("opcode 0x{opcode:02X} without write enable")]
    WriteNotEnabled {
        /// Offending opcode
        opcode: u8,
    },

    /// Quad command while the QE bit is clear
    #[error("quad opcode 0x{opcode:02X} with quad mode disabled")]
    QuadDisabled {
        /// Offending opcode
        opcode: u8,
    },

    /// Line mode or dummy cycles do not match the opcode
    #[error("malformed descriptor for opcode 0x{opcode:02X}")]
    BadDescriptor {
        /// Offending opcode
        opcode: u8,
    },

    /// Data phase without a matching command phase
    #[error("unexpected data phase")]
    UnexpectedDataPhase,
}
