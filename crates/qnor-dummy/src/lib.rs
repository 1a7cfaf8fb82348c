//! qnor-dummy - In-memory W25Q flash emulator for testing
//!
//! This crate provides a [`QspiTransport`] that emulates a W25Q-family
//! quad-SPI NOR flash in memory: erase to 0xFF, AND-programming with
//! in-page wrap, the three status registers, write enable latch, a busy
//! countdown, suspend/resume, deep power-down and software reset. Every
//! command phase is recorded, and failures can be injected per opcode.

mod error;

pub use error::DummyError;

use qnor_core::qspi::opcodes;
use qnor_core::status::{Sr1, Sr2, Sr3};
use qnor_core::{AddressWidth, BlockSize, BusFeatures, ChipGeometry, DataPhase, IoMode, Phase};
use qnor_core::{QspiCommand, QspiTransport};

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Memory layout
    pub geometry: ChipGeometry,
    /// Byte returned by the 0xAB device ID read
    pub device_id: u8,
    /// Features advertised to the driver
    pub features: BusFeatures,
    /// Status register 1 reads that report BUSY after each
    /// program, erase or status write
    pub busy_polls: u32,
}

impl EmulatorConfig {
    /// W25Q256JV
    pub fn w25q256() -> Self {
        Self {
            geometry: ChipGeometry::W25Q256,
            device_id: 0x18,
            features: BusFeatures::all(),
            busy_polls: 2,
        }
    }

    /// W25Q128JV
    pub fn w25q128() -> Self {
        Self {
            geometry: ChipGeometry::W25Q128,
            device_id: 0x17,
            ..Self::w25q256()
        }
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::w25q256()
    }
}

/// Injected transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fault {
    opcode: u8,
    phase: Phase,
}

/// Command phase that still expects its data phase
#[derive(Debug, Clone, Copy)]
struct Pending {
    cmd: QspiCommand,
    ignored: bool,
}

/// Emulated W25Q chip
pub struct EmulatedW25q {
    config: EmulatorConfig,
    data: Vec<u8>,
    sr1: Sr1,
    sr2: Sr2,
    sr3: Sr3,
    busy_remaining: u32,
    suspended_remaining: u32,
    sleeping: bool,
    reset_enabled: bool,
    pending: Option<Pending>,
    log: Vec<QspiCommand>,
    fault: Option<Fault>,
    elapsed_us: u64,
}

impl EmulatedW25q {
    /// Create a blank chip: all 0xFF, 3-byte addressing, quad mode off
    pub fn new(config: EmulatorConfig) -> Self {
        let data = vec![0xFF; config.geometry.capacity_bytes() as usize];
        Self {
            config,
            data,
            sr1: Sr1::empty(),
            sr2: Sr2::empty(),
            sr3: Sr3::empty(),
            busy_remaining: 0,
            suspended_remaining: 0,
            sleeping: false,
            reset_enabled: false,
            pending: None,
            log: Vec::new(),
            fault: None,
            elapsed_us: 0,
        }
    }

    /// Create a default W25Q256
    pub fn new_default() -> Self {
        Self::new(EmulatorConfig::default())
    }

    /// Create a chip that already has quad mode and, when the capacity
    /// needs it, 4-byte addressing enabled
    pub fn configured(config: EmulatorConfig) -> Self {
        let mut chip = Self::new(config);
        chip.sr2 |= Sr2::QE;
        if chip.config.geometry.requires_4byte_addr() {
            chip.sr3 |= Sr3::ADS | Sr3::ADP;
        }
        chip
    }

    /// Preload the status registers, as left behind by an earlier session
    ///
    /// BUSY and WEL in SR1 are ignored.
    pub fn with_registers(mut self, regs: [u8; 3]) -> Self {
        self.sr1 = Sr1::from_bits_retain(regs[0] & !(Sr1::BUSY | Sr1::WEL).bits());
        self.sr2 = Sr2::from_bits_retain(regs[1]);
        self.sr3 = Sr3::from_bits_retain(regs[2]);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Raw status registers (SR1 includes BUSY as a reader would see it)
    pub fn registers(&self) -> [u8; 3] {
        [self.sr1_value(), self.sr2.bits(), self.sr3.bits()]
    }

    /// Returns true while in deep power-down
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Pretend a program/erase started elsewhere, busy for `polls` reads
    pub fn start_busy(&mut self, polls: u32) {
        self.busy_remaining = polls;
    }

    /// Every command phase seen so far
    pub fn log(&self) -> &[QspiCommand] {
        &self.log
    }

    /// Opcodes of every command phase seen so far
    pub fn opcodes(&self) -> Vec<u8> {
        self.log.iter().map(|cmd| cmd.opcode).collect()
    }

    /// Forget the recorded commands
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Total time the driver asked to wait
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Fail the given phase of every transaction with `opcode`
    pub fn fail_on(&mut self, opcode: u8, phase: Phase) {
        self.fault = Some(Fault { opcode, phase });
    }

    /// Stop injecting failures
    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    fn sr1_value(&self) -> u8 {
        let mut sr1 = self.sr1;
        sr1.set(Sr1::BUSY, self.busy_remaining > 0);
        sr1.bits()
    }

    fn check_fault(&self, opcode: u8, phase: Phase) -> Result<(), DummyError> {
        match self.fault {
            Some(f) if f.opcode == opcode && f.phase == phase => {
                Err(DummyError::Injected { opcode, phase })
            }
            _ => Ok(()),
        }
    }

    /// Check that the address field fits the opcode and current mode
    fn check_address(&self, cmd: &QspiCommand) -> Result<u32, DummyError> {
        let addr = cmd.address.unwrap_or(0);
        let expected = if opcodes::is_dedicated_4byte(cmd.opcode) || self.sr3.contains(Sr3::ADS) {
            AddressWidth::FourByte
        } else {
            AddressWidth::ThreeByte
        };
        if cmd.address.is_none() || cmd.address_width != expected {
            return Err(DummyError::AddressWidth {
                opcode: cmd.opcode,
                bits: cmd.address_width.bits(),
            });
        }
        if addr as usize >= self.data.len() {
            return Err(DummyError::AddressOutOfRange { addr });
        }
        Ok(addr)
    }

    fn check_quad(&self, cmd: &QspiCommand, mode: IoMode, dummy: u8) -> Result<(), DummyError> {
        if !self.sr2.contains(Sr2::QE) {
            return Err(DummyError::QuadDisabled { opcode: cmd.opcode });
        }
        if cmd.io_mode != mode || cmd.dummy_cycles != dummy {
            return Err(DummyError::BadDescriptor { opcode: cmd.opcode });
        }
        Ok(())
    }

    fn take_write_enable(&mut self, opcode: u8) -> Result<(), DummyError> {
        if !self.sr1.contains(Sr1::WEL) {
            return Err(DummyError::WriteNotEnabled { opcode });
        }
        self.sr1.remove(Sr1::WEL);
        self.busy_remaining = self.config.busy_polls;
        Ok(())
    }

    fn handle_erase(&mut self, cmd: &QspiCommand, size: u32) -> Result<(), DummyError> {
        let addr = self.check_address(cmd)?;
        self.take_write_enable(cmd.opcode)?;
        let start = (addr & !(size - 1)) as usize;
        let end = (start + size as usize).min(self.data.len());
        log::debug!("dummy: erase {} bytes at 0x{:08X}", size, start);
        self.data[start..end].fill(0xFF);
        Ok(())
    }

    fn handle_simple(&mut self, cmd: &QspiCommand) -> Result<(), DummyError> {
        let geo = self.config.geometry;
        match cmd.opcode {
            opcodes::WREN => self.sr1.insert(Sr1::WEL),
            opcodes::WRDI => self.sr1.remove(Sr1::WEL),
            opcodes::EN4B => self.sr3.insert(Sr3::ADS),
            opcodes::EX4B => self.sr3.remove(Sr3::ADS),
            opcodes::DP => self.sleeping = true,
            opcodes::SUSPEND => {
                if self.busy_remaining > 0 && !self.sr2.contains(Sr2::SUS) {
                    self.suspended_remaining = self.busy_remaining;
                    self.busy_remaining = 0;
                    self.sr2.insert(Sr2::SUS);
                }
            }
            opcodes::RESUME => {
                if self.sr2.contains(Sr2::SUS) {
                    self.sr2.remove(Sr2::SUS);
                    self.busy_remaining = self.suspended_remaining;
                    self.suspended_remaining = 0;
                }
            }
            opcodes::RSTEN => {
                self.reset_enabled = true;
                return Ok(());
            }
            opcodes::RST => {
                if self.reset_enabled {
                    log::debug!("dummy: software reset");
                    self.sr1.remove(Sr1::WEL);
                    self.sr2.remove(Sr2::SUS);
                    self.sr3.set(Sr3::ADS, self.sr3.contains(Sr3::ADP));
                    self.busy_remaining = 0;
                    self.suspended_remaining = 0;
                }
            }
            opcodes::CE => {
                self.take_write_enable(cmd.opcode)?;
                self.data.fill(0xFF);
            }
            opcodes::SE | opcodes::SE_4B => self.handle_erase(cmd, geo.sector_size())?,
            opcodes::BE32 => self.handle_erase(cmd, geo.block_size(BlockSize::Small))?,
            opcodes::BE64 | opcodes::BE64_4B => {
                self.handle_erase(cmd, geo.block_size(BlockSize::Large))?
            }
            other => return Err(DummyError::UnknownOpcode(other)),
        }
        self.reset_enabled = false;
        Ok(())
    }

    fn handle_receive(&mut self, cmd: &QspiCommand, buf: &mut [u8]) -> Result<(), DummyError> {
        match cmd.opcode {
            opcodes::RDID => {
                self.sleeping = false;
                buf.fill(self.config.device_id);
            }
            opcodes::RDSR1 => {
                buf.fill(self.sr1_value());
                self.busy_remaining = self.busy_remaining.saturating_sub(1);
            }
            opcodes::RDSR2 => buf.fill(self.sr2.bits()),
            opcodes::RDSR3 => buf.fill(self.sr3.bits()),
            opcodes::READ | opcodes::READ_4B | opcodes::QIOR | opcodes::QIOR_4B => {
                if matches!(cmd.opcode, opcodes::QIOR | opcodes::QIOR_4B) {
                    self.check_quad(cmd, IoMode::QuadIo, opcodes::QIOR_DUMMY_CYCLES)?;
                }
                let addr = self.check_address(cmd)? as usize;
                // Reads run on past page boundaries and wrap at the end of the array
                for (i, byte) in buf.iter_mut().enumerate() {
                    *byte = self.data[(addr + i) % self.data.len()];
                }
            }
            other => return Err(DummyError::UnknownOpcode(other)),
        }
        Ok(())
    }

    fn handle_transmit(&mut self, cmd: &QspiCommand, data: &[u8]) -> Result<(), DummyError> {
        match cmd.opcode {
            opcodes::WRSR1 | opcodes::WRSR2 | opcodes::WRSR3 => {
                self.take_write_enable(cmd.opcode)?;
                let value = data.first().copied().ok_or(DummyError::UnexpectedDataPhase)?;
                match cmd.opcode {
                    opcodes::WRSR1 => {
                        self.sr1 = Sr1::from_bits_retain(value & !(Sr1::BUSY | Sr1::WEL).bits())
                    }
                    opcodes::WRSR2 => {
                        let sus = self.sr2 & Sr2::SUS;
                        self.sr2 = Sr2::from_bits_retain(value & !Sr2::SUS.bits()) | sus;
                    }
                    _ => {
                        let ads = self.sr3 & Sr3::ADS;
                        self.sr3 = Sr3::from_bits_retain(value & !Sr3::ADS.bits()) | ads;
                    }
                }
            }
            opcodes::PP | opcodes::PP_4B | opcodes::QPP | opcodes::QPP_4B => {
                if matches!(cmd.opcode, opcodes::QPP | opcodes::QPP_4B) {
                    self.check_quad(cmd, IoMode::QuadOut, 0)?;
                }
                let addr = self.check_address(cmd)?;
                self.take_write_enable(cmd.opcode)?;
                let page_size = self.config.geometry.page_size as usize;
                let page_start = addr as usize & !(page_size - 1);
                let mut offset = addr as usize - page_start;
                for &byte in data {
                    // Bits only go from 1 to 0; past the page end the address wraps
                    self.data[page_start + offset] &= byte;
                    offset = (offset + 1) % page_size;
                }
            }
            other => return Err(DummyError::UnknownOpcode(other)),
        }
        Ok(())
    }
}

impl QspiTransport for EmulatedW25q {
    type Error = DummyError;

    fn features(&self) -> BusFeatures {
        self.config.features
    }

    fn command(&mut self, cmd: &QspiCommand, _timeout_ms: u32) -> Result<(), DummyError> {
        self.log.push(*cmd);
        self.pending = None;
        self.check_fault(cmd.opcode, Phase::Command)?;

        // A sleeping chip only listens for the release opcode
        let ignored = (self.sleeping && cmd.opcode != opcodes::RDP)
            || (self.busy_remaining > 0
                && !matches!(
                    cmd.opcode,
                    opcodes::RDSR1 | opcodes::RDSR2 | opcodes::RDSR3 | opcodes::SUSPEND
                ));
        if ignored {
            log::warn!("dummy: ignoring opcode 0x{:02X}", cmd.opcode);
        }

        match cmd.data {
            DataPhase::None if ignored => Ok(()),
            DataPhase::None if cmd.opcode == opcodes::RDP && !cmd.has_address() => {
                self.sleeping = false;
                self.reset_enabled = false;
                Ok(())
            }
            DataPhase::None => self.handle_simple(cmd),
            DataPhase::Transmit(_) | DataPhase::Receive(_) => {
                self.reset_enabled = false;
                self.pending = Some(Pending { cmd: *cmd, ignored });
                Ok(())
            }
        }
    }

    fn transmit(&mut self, data: &[u8], _timeout_ms: u32) -> Result<(), DummyError> {
        let pending = self.pending.take().ok_or(DummyError::UnexpectedDataPhase)?;
        if pending.cmd.data != DataPhase::Transmit(data.len()) {
            return Err(DummyError::UnexpectedDataPhase);
        }
        self.check_fault(pending.cmd.opcode, Phase::Data)?;
        if pending.ignored {
            return Ok(());
        }
        self.handle_transmit(&pending.cmd, data)
    }

    fn receive(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<(), DummyError> {
        let pending = self.pending.take().ok_or(DummyError::UnexpectedDataPhase)?;
        if pending.cmd.data != DataPhase::Receive(buf.len()) {
            return Err(DummyError::UnexpectedDataPhase);
        }
        self.check_fault(pending.cmd.opcode, Phase::Data)?;
        if pending.ignored {
            // Nobody drives the bus
            buf.fill(0xFF);
            return Ok(());
        }
        self.handle_receive(&pending.cmd, buf)
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += u64::from(us);
    }
}
