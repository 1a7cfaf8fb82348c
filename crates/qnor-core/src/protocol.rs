//! W25Q command helpers
//!
//! One function per single-transaction command. Each builds the
//! descriptor and hands it to the dispatcher; ordering, waiting and
//! state tracking live in the driver.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async

use maybe_async::maybe_async;

use crate::dispatch::{Dispatcher, Payload};
use crate::error::Result;
use crate::qspi::{opcodes, AddressWidth, IoMode, QspiCommand};
use crate::status::StatusRegister;
use crate::transport::QspiTransport;

/// Read one status register
#[maybe_async]
pub async fn read_register<T: QspiTransport>(
    bus: &mut Dispatcher<T>,
    reg: StatusRegister,
) -> Result<u8> {
    let mut buf = [0u8; 1];
    let cmd = QspiCommand::read_reg(reg.read_opcode());
    bus.execute(&cmd, Payload::In(&mut buf)).await?;
    Ok(buf[0])
}

/// Write one status register
///
/// The caller is responsible for WREN and for waiting afterwards.
#[maybe_async]
pub async fn write_register<T: QspiTransport>(
    bus: &mut Dispatcher<T>,
    reg: StatusRegister,
    value: u8,
) -> Result<()> {
    let cmd = QspiCommand::write_reg(reg.write_opcode());
    bus.execute(&cmd, Payload::Out(&[value])).await
}

/// Send the Write Enable command
#[maybe_async]
pub async fn write_enable<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::WREN), Payload::None)
        .await
}

/// Read the legacy one-byte device ID
///
/// Sends 0xAB with a 24-bit zero address. Also wakes the chip from
/// power-down.
#[maybe_async]
pub async fn read_device_id<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<u8> {
    let mut buf = [0u8; 1];
    let cmd = QspiCommand::read(opcodes::RDID, 0, AddressWidth::ThreeByte, 1);
    bus.execute(&cmd, Payload::In(&mut buf)).await?;
    Ok(buf[0])
}

/// Enter deep power-down
#[maybe_async]
pub async fn power_down<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::DP), Payload::None)
        .await
}

/// Release from deep power-down
#[maybe_async]
pub async fn release_power_down<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::RDP), Payload::None)
        .await
}

/// Switch the chip to 4-byte addressing (volatile)
#[maybe_async]
pub async fn enter_4byte_mode<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::EN4B), Payload::None)
        .await
}

/// Suspend the running program/erase
#[maybe_async]
pub async fn suspend<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::SUSPEND), Payload::None)
        .await
}

/// Resume a suspended program/erase
#[maybe_async]
pub async fn resume<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::RESUME), Payload::None)
        .await
}

/// First half of the software reset pair
#[maybe_async]
pub async fn reset_enable<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::RSTEN), Payload::None)
        .await
}

/// Second half of the software reset pair
#[maybe_async]
pub async fn reset<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::RST), Payload::None)
        .await
}

/// Erase the whole array
#[maybe_async]
pub async fn chip_erase<T: QspiTransport>(bus: &mut Dispatcher<T>) -> Result<()> {
    bus.execute(&QspiCommand::simple(opcodes::CE), Payload::None)
        .await
}

/// Sector or block erase at `addr`
#[maybe_async]
pub async fn erase<T: QspiTransport>(
    bus: &mut Dispatcher<T>,
    opcode: u8,
    addr: u32,
    width: AddressWidth,
) -> Result<()> {
    bus.execute(&QspiCommand::erase(opcode, addr, width), Payload::None)
        .await
}

/// Fast Read Quad I/O (1-4-4, 6 dummy cycles)
#[maybe_async]
pub async fn read_quad_io<T: QspiTransport>(
    bus: &mut Dispatcher<T>,
    opcode: u8,
    addr: u32,
    width: AddressWidth,
    buf: &mut [u8],
) -> Result<()> {
    let cmd = QspiCommand::read(opcode, addr, width, buf.len())
        .with_io_mode(IoMode::QuadIo)
        .with_dummy_cycles(opcodes::QIOR_DUMMY_CYCLES);
    bus.execute(&cmd, Payload::In(buf)).await
}

/// Plain single-line read (1-1-1, no dummy cycles)
#[maybe_async]
pub async fn read_single<T: QspiTransport>(
    bus: &mut Dispatcher<T>,
    opcode: u8,
    addr: u32,
    width: AddressWidth,
    buf: &mut [u8],
) -> Result<()> {
    let cmd = QspiCommand::read(opcode, addr, width, buf.len());
    bus.execute(&cmd, Payload::In(buf)).await
}

/// Quad Input Page Program (1-1-4)
///
/// The caller is responsible for WREN and for waiting afterwards.
#[maybe_async]
pub async fn program_quad<T: QspiTransport>(
    bus: &mut Dispatcher<T>,
    opcode: u8,
    addr: u32,
    width: AddressWidth,
    data: &[u8],
) -> Result<()> {
    let cmd = QspiCommand::write(opcode, addr, width, data.len()).with_io_mode(IoMode::QuadOut);
    bus.execute(&cmd, Payload::Out(data)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, ScriptedBus};
    use crate::transport::BusFeatures;
    use std::vec;

    #[test]
    fn test_read_device_id_descriptor() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        bus.push_response(&[0x18]);
        let mut d = Dispatcher::new(&mut bus, 100);
        assert_eq!(read_device_id(&mut d).unwrap(), 0x18);

        let cmd = bus.commands()[0];
        assert_eq!(cmd.opcode, 0xAB);
        assert_eq!(cmd.address, Some(0));
        assert_eq!(cmd.address_width, AddressWidth::ThreeByte);
        assert_eq!(cmd.io_mode, IoMode::Single);
    }

    #[test]
    fn test_quad_read_descriptor() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut d = Dispatcher::new(&mut bus, 100);
        let mut buf = [0u8; 8];
        read_quad_io(&mut d, opcodes::QIOR_4B, 0x200, AddressWidth::FourByte, &mut buf).unwrap();

        let cmd = bus.commands()[0];
        assert_eq!(cmd.io_mode, IoMode::QuadIo);
        assert_eq!(cmd.dummy_cycles, 6);
        assert_eq!(cmd.address, Some(0x200));
        assert_eq!(bus.events[1], Event::Receive(8));
    }

    #[test]
    fn test_program_quad_descriptor() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut d = Dispatcher::new(&mut bus, 100);
        program_quad(&mut d, opcodes::QPP, 0x100, AddressWidth::ThreeByte, &[1, 2, 3]).unwrap();

        let cmd = bus.commands()[0];
        assert_eq!(cmd.opcode, 0x32);
        assert_eq!(cmd.io_mode.addr_lines(), 1);
        assert_eq!(cmd.io_mode.data_lines(), 4);
        assert_eq!(cmd.dummy_cycles, 0);
        assert_eq!(bus.events[1], Event::Transmit(vec![1, 2, 3]));
    }

    #[test]
    fn test_write_register() {
        let mut bus = ScriptedBus::new(BusFeatures::empty());
        let mut d = Dispatcher::new(&mut bus, 100);
        write_register(&mut d, StatusRegister::Three, 0x02).unwrap();

        assert_eq!(bus.opcodes(), [0x11]);
        assert_eq!(bus.events[1], Event::Transmit(vec![0x02]));
    }
}
