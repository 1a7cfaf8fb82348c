//! Quad-SPI command descriptors
//!
//! This module provides the transaction descriptor handed to the
//! transport, the address width and I/O line-mode types, and the W25Q
//! opcode table.

mod address;
mod command;
mod io_mode;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::{DataPhase, QspiCommand};
pub use io_mode::{check_io_mode_supported, IoMode};
