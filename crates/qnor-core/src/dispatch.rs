//! Command dispatch
//!
//! The dispatcher is the only place that talks to the transport. It pairs
//! a [`QspiCommand`] with the caller's buffer, checks that the two agree,
//! runs the command phase and then at most one data phase.

use maybe_async::maybe_async;

use crate::error::{Error, ParamError, Phase, Result};
use crate::geometry::ChipGeometry;
use crate::qspi::{check_io_mode_supported, opcodes, AddressWidth, DataPhase, QspiCommand};
use crate::transport::QspiTransport;

/// Caller-side buffer for a transaction's data phase
#[derive(Debug)]
pub enum Payload<'a> {
    /// No data phase
    None,
    /// Bytes sent to the chip
    Out(&'a [u8]),
    /// Buffer filled from the chip
    In(&'a mut [u8]),
}

impl Payload<'_> {
    fn matches(&self, phase: DataPhase) -> bool {
        match (self, phase) {
            (Payload::None, DataPhase::None) => true,
            (Payload::Out(data), DataPhase::Transmit(len)) => data.len() == len && len > 0,
            (Payload::In(buf), DataPhase::Receive(len)) => buf.len() == len && len > 0,
            _ => false,
        }
    }
}

/// Opcodes chosen once from the geometry
///
/// Above the 128 Mbit threshold the dedicated 4-byte variants are used
/// wherever the chip has one. The 32 KB block erase has none and keeps its
/// legacy opcode with a 32-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeSet {
    /// Address width used by every address-bearing command
    pub width: AddressWidth,
    /// Quad I/O fast read
    pub read: u8,
    /// Single-line read
    pub single_read: u8,
    /// Quad input page program
    pub program: u8,
    /// 4 KB sector erase
    pub sector_erase: u8,
    /// Small block erase
    pub block_erase_small: u8,
    /// Large block erase
    pub block_erase_large: u8,
}

impl OpcodeSet {
    /// Pick the opcode variants for a geometry
    pub const fn for_geometry(geo: &ChipGeometry) -> Self {
        if geo.requires_4byte_addr() {
            Self {
                width: AddressWidth::FourByte,
                read: opcodes::QIOR_4B,
                single_read: opcodes::READ_4B,
                program: opcodes::QPP_4B,
                sector_erase: opcodes::SE_4B,
                block_erase_small: opcodes::BE32,
                block_erase_large: opcodes::BE64_4B,
            }
        } else {
            Self {
                width: AddressWidth::ThreeByte,
                read: opcodes::QIOR,
                single_read: opcodes::READ,
                program: opcodes::QPP,
                sector_erase: opcodes::SE,
                block_erase_small: opcodes::BE32,
                block_erase_large: opcodes::BE64,
            }
        }
    }
}

/// Single owner of the transport
///
/// Holds the per-phase timeout passed down with every transaction.
pub struct Dispatcher<T> {
    bus: T,
    timeout_ms: u32,
}

impl<T: QspiTransport> Dispatcher<T> {
    /// Wrap a transport
    pub fn new(bus: T, timeout_ms: u32) -> Self {
        Self { bus, timeout_ms }
    }

    /// Run one transaction
    ///
    /// The payload must agree with the descriptor's data phase in direction
    /// and length; otherwise nothing is sent.
    #[maybe_async]
    pub async fn execute(&mut self, cmd: &QspiCommand, payload: Payload<'_>) -> Result<()> {
        if !payload.matches(cmd.data) {
            return Err(ParamError::PayloadMismatch.into());
        }
        check_io_mode_supported(cmd.io_mode, self.bus.features())?;

        log::trace!(
            "qspi: op=0x{:02X} addr={:?}/{} lines=1-{}-{} dummy={} data={:?}",
            cmd.opcode,
            cmd.address,
            cmd.address_width.bits(),
            cmd.io_mode.addr_lines(),
            cmd.io_mode.data_lines(),
            cmd.dummy_cycles,
            cmd.data
        );

        if let Err(e) = self.bus.command(cmd, self.timeout_ms).await {
            log::warn!("qspi: command phase of 0x{:02X} failed: {:?}", cmd.opcode, e);
            return Err(Error::Transport(Phase::Command));
        }

        let result = match payload {
            Payload::None => return Ok(()),
            Payload::Out(data) => self.bus.transmit(data, self.timeout_ms).await,
            Payload::In(buf) => self.bus.receive(buf, self.timeout_ms).await,
        };

        result.map_err(|e| {
            log::warn!("qspi: data phase of 0x{:02X} failed: {:?}", cmd.opcode, e);
            Error::Transport(Phase::Data)
        })
    }

    /// Delay for the specified number of microseconds
    #[maybe_async]
    pub async fn delay_us(&mut self, us: u32) {
        self.bus.delay_us(us).await
    }

    /// Borrow the transport
    pub fn bus(&self) -> &T {
        &self.bus
    }

    /// Mutably borrow the transport
    pub fn bus_mut(&mut self) -> &mut T {
        &mut self.bus
    }

    /// Give the transport back
    pub fn into_inner(self) -> T {
        self.bus
    }
}
