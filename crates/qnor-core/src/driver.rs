//! NOR flash command sequencer
//!
//! [`NorFlash`] owns the transport (through a [`Dispatcher`]) and the
//! status snapshot, and composes single commands into the multi-step
//! protocols the chip requires: wait for idle, latch write enable, issue
//! the destructive command, wait for idle again.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async

use maybe_async::maybe_async;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes};

use crate::address::{self, LinearAddress};
use crate::dispatch::{Dispatcher, OpcodeSet};
use crate::error::{ChipFault, Error, Result};
use crate::geometry::{BlockSize, ChipGeometry};
use crate::protocol;
use crate::status::{ChipState, Sr2, Sr3, StatusFlags, StatusRegister};
use crate::transport::{BusFeatures, QspiTransport};

/// Default per-phase transport timeout
pub const DEFAULT_PHASE_TIMEOUT_MS: u32 = 5000;

/// Default delay between busy polls
pub const DEFAULT_POLL_INTERVAL_US: u32 = 1000;

/// Settle time after write enable, power-down, wake-up and reset enable
const SETTLE_DELAY_US: u32 = 1000;

/// Settle time after the reset opcode
const RESET_DELAY_US: u32 = 5000;

/// Capabilities the chip offers but this driver does not implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Manufacturer + device ID (0x90)
    FullId,
    /// 64-bit unique ID (0x4B)
    UniqueId,
    /// JEDEC ID (0x9F)
    JedecId,
    /// SFDP table (0x5A)
    Sfdp,
    /// Security register erase/program/read
    SecurityRegisters,
    /// Individual and global block lock/unlock
    BlockLock,
    /// Burst with wrap (0x77)
    BurstWrap,
    /// Volatile status register write enable (0x50)
    VolatileStatusRegister,
    /// Extended address register (0xC5/0xC8)
    ExtendedAddressRegister,
}

/// Busy-wait policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct PollConfig {
    /// Delay between two status polls in microseconds
    pub interval_us: u32,
    /// Give up with [`Error::Timeout`] after this many busy polls;
    /// `None` polls forever
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_us: DEFAULT_POLL_INTERVAL_US,
            max_polls: None,
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct DriverConfig {
    /// Chip layout
    pub geometry: ChipGeometry,
    /// Busy-wait policy
    pub poll: PollConfig,
    /// Timeout handed to every transport phase
    pub phase_timeout_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            geometry: ChipGeometry::default(),
            poll: PollConfig::default(),
            phase_timeout_ms: DEFAULT_PHASE_TIMEOUT_MS,
        }
    }
}

impl DriverConfig {
    /// Configuration with default timing for the given chip
    pub fn for_geometry(geometry: ChipGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }
}

/// W25Q-style quad-SPI NOR flash driver
///
/// Holds the only copy of the chip's status snapshot. All methods take
/// `&mut self`; sharing a driver between execution contexts needs an
/// external lock.
pub struct NorFlash<T> {
    bus: Dispatcher<T>,
    config: DriverConfig,
    opcodes: OpcodeSet,
    status: StatusFlags,
}

impl<T: QspiTransport> NorFlash<T> {
    /// Create a driver
    ///
    /// Validates the geometry and fixes the opcode set. A geometry that
    /// needs 4-byte addressing is rejected if the transport cannot send
    /// 32-bit addresses. No bus traffic happens until [`init`](Self::init).
    pub fn new(bus: T, config: DriverConfig) -> Result<Self> {
        config.geometry.validate()?;
        if config.geometry.requires_4byte_addr()
            && !bus.features().contains(BusFeatures::FOUR_BYTE_ADDR)
        {
            return Err(Error::IoModeNotSupported);
        }

        Ok(Self {
            bus: Dispatcher::new(bus, config.phase_timeout_ms),
            opcodes: OpcodeSet::for_geometry(&config.geometry),
            config,
            status: StatusFlags::default(),
        })
    }

    /// Chip layout
    pub fn geometry(&self) -> &ChipGeometry {
        &self.config.geometry
    }

    /// Opcodes selected for the configured capacity
    pub fn opcodes(&self) -> &OpcodeSet {
        &self.opcodes
    }

    /// Active configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Last observed status, without bus traffic
    pub fn status(&self) -> StatusFlags {
        self.status
    }

    /// Coarse state from the last observed status
    pub fn state(&self) -> ChipState {
        self.status.state()
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        self.bus.bus()
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        self.bus.bus_mut()
    }

    /// Consume the driver and return the transport
    pub fn release(self) -> T {
        self.bus.into_inner()
    }

    /// Report a capability this driver does not implement
    pub fn require(&self, capability: Capability) -> Result<()> {
        Err(Error::Unsupported(capability))
    }

    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    /// Bring the chip into the mode the driver expects
    ///
    /// Reads the ID and status, switches to 4-byte addressing (volatile
    /// and power-up default) when the capacity needs it, enables quad
    /// mode, then returns a fresh status snapshot. On an already
    /// configured chip only reads are issued, even with an operation
    /// suspended; any needed write fails with [`ChipFault::Suspended`]
    /// while one is.
    #[maybe_async]
    pub async fn init(&mut self) -> Result<StatusFlags> {
        let id = self.read_id().await?;
        log::debug!("w25q: init, device id 0x{:02X}", id);

        let status = self.read_status().await?;

        if self.config.geometry.requires_4byte_addr() {
            if !status.power_up_4byte {
                log::debug!("w25q: setting power-up 4-byte addressing");
                self.check_not_suspended()?;
                let sr3 = self.read_status_register(3).await?;
                self.write_status_register(sr3 | Sr3::ADP.bits(), 3)
                    .await?;
            }
            if !status.address_4byte {
                log::debug!("w25q: entering 4-byte addressing");
                self.check_not_suspended()?;
                self.wait_idle().await?;
                protocol::enter_4byte_mode(&mut self.bus).await?;
                self.bus.delay_us(SETTLE_DELAY_US).await;
            }
        }

        if !status.quad_enable {
            log::debug!("w25q: enabling quad mode");
            self.check_not_suspended()?;
            let sr2 = self.read_status_register(2).await?;
            self.write_status_register(sr2 | Sr2::QE.bits(), 2).await?;
        }

        self.read_status().await
    }

    /// Read the one-byte device ID
    #[maybe_async]
    pub async fn read_id(&mut self) -> Result<u8> {
        protocol::read_device_id(&mut self.bus).await
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    /// Read status register `which` (1, 2 or 3)
    #[maybe_async]
    pub async fn read_status_register(&mut self, which: u8) -> Result<u8> {
        let reg = StatusRegister::from_index(which)?;
        protocol::read_register(&mut self.bus, reg).await
    }

    /// Write `value` to status register `which` (1, 2 or 3)
    ///
    /// Waits for idle and latches write enable first, then waits for the
    /// register write to complete.
    #[maybe_async]
    pub async fn write_status_register(&mut self, value: u8, which: u8) -> Result<()> {
        let reg = StatusRegister::from_index(which)?;
        self.wait_idle().await?;
        self.write_enable().await?;
        protocol::write_register(&mut self.bus, reg, value).await?;
        self.wait_idle().await
    }

    /// Read all three status registers and refresh the snapshot
    ///
    /// The snapshot is only replaced if all three reads succeed. The
    /// `sleeping` flag is carried over.
    #[maybe_async]
    pub async fn read_status(&mut self) -> Result<StatusFlags> {
        let sr1 = protocol::read_register(&mut self.bus, StatusRegister::One).await?;
        let sr2 = protocol::read_register(&mut self.bus, StatusRegister::Two).await?;
        let sr3 = protocol::read_register(&mut self.bus, StatusRegister::Three).await?;
        self.status = StatusFlags::decode(sr1, sr2, sr3, self.status.sleeping);
        Ok(self.status)
    }

    /// Read status register 1 and report the BUSY bit
    #[maybe_async]
    pub async fn is_busy(&mut self) -> Result<bool> {
        let sr1 = protocol::read_register(&mut self.bus, StatusRegister::One).await?;
        self.status.busy = StatusFlags::decode(sr1, 0, 0, false).busy;
        Ok(self.status.busy)
    }

    /// Poll until the chip reports idle
    #[maybe_async]
    pub async fn wait_idle(&mut self) -> Result<()> {
        let poll = self.config.poll;
        let mut polls: u32 = 0;
        while self.is_busy().await? {
            polls = polls.saturating_add(1);
            if poll.max_polls.is_some_and(|max| polls >= max) {
                log::warn!("w25q: chip still busy after {} polls", polls);
                return Err(Error::Timeout);
            }
            if poll.interval_us > 0 {
                self.bus.delay_us(poll.interval_us).await;
            }
        }
        Ok(())
    }

    #[maybe_async]
    async fn write_enable(&mut self) -> Result<()> {
        protocol::write_enable(&mut self.bus).await?;
        self.status.write_enable_latch = true;
        self.bus.delay_us(SETTLE_DELAY_US).await;
        Ok(())
    }

    fn check_not_suspended(&self) -> Result<()> {
        if self.status.suspended {
            return Err(Error::Chip(ChipFault::Suspended));
        }
        Ok(())
    }

    fn check_addressing(&self) -> Result<()> {
        if self.config.geometry.requires_4byte_addr() && !self.status.address_4byte {
            return Err(Error::Chip(ChipFault::FourByteModeInactive));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Read `buf.len()` bytes at `shift` inside `page` (quad I/O)
    #[maybe_async]
    pub async fn read_data(&mut self, page: u32, shift: u32, buf: &mut [u8]) -> Result<()> {
        let addr = address::page_span(&self.config.geometry, page, shift, buf.len())?;
        self.read_at(addr, buf).await
    }

    /// Read a plain-old-data value at `shift` inside `page`
    #[maybe_async]
    pub async fn read_value<V>(&mut self, page: u32, shift: u32) -> Result<V>
    where
        V: FromBytes + IntoBytes,
    {
        let mut value = <V as FromZeros>::new_zeroed();
        self.read_data(page, shift, value.as_mut_bytes()).await?;
        Ok(value)
    }

    /// Read up to one page at a linear address (quad I/O)
    #[maybe_async]
    pub async fn read_raw(&mut self, addr: LinearAddress, buf: &mut [u8]) -> Result<()> {
        address::raw_span(&self.config.geometry, addr, buf.len())?;
        self.read_at(addr, buf).await
    }

    /// Read any length at a linear address over a single line
    #[maybe_async]
    pub async fn read_single(&mut self, addr: LinearAddress, buf: &mut [u8]) -> Result<()> {
        address::check_capacity(&self.config.geometry, addr, buf.len())?;
        self.check_addressing()?;
        self.wait_idle().await?;
        let (op, width) = (self.opcodes.single_read, self.opcodes.width);
        protocol::read_single(&mut self.bus, op, addr, width, buf).await
    }

    #[maybe_async]
    async fn read_at(&mut self, addr: LinearAddress, buf: &mut [u8]) -> Result<()> {
        self.check_addressing()?;
        self.wait_idle().await?;
        let (op, width) = (self.opcodes.read, self.opcodes.width);
        protocol::read_quad_io(&mut self.bus, op, addr, width, buf).await
    }

    // ------------------------------------------------------------------
    // Program
    // ------------------------------------------------------------------

    /// Program `data` at `shift` inside `page` (quad input)
    ///
    /// Only clears bits; the target should be erased first.
    #[maybe_async]
    pub async fn program_data(&mut self, page: u32, shift: u32, data: &[u8]) -> Result<()> {
        let addr = address::page_span(&self.config.geometry, page, shift, data.len())?;
        self.program_at(addr, data).await
    }

    /// Program a plain-old-data value at `shift` inside `page`
    #[maybe_async]
    pub async fn program_value<V: IntoBytes + Immutable>(
        &mut self,
        page: u32,
        shift: u32,
        value: &V,
    ) -> Result<()> {
        self.program_data(page, shift, value.as_bytes()).await
    }

    /// Program up to one page at a linear address without crossing a page
    /// boundary
    #[maybe_async]
    pub async fn program_raw(&mut self, addr: LinearAddress, data: &[u8]) -> Result<()> {
        address::program_span(&self.config.geometry, addr, data.len())?;
        self.program_at(addr, data).await
    }

    #[maybe_async]
    async fn program_at(&mut self, addr: LinearAddress, data: &[u8]) -> Result<()> {
        self.check_addressing()?;
        self.wait_idle().await?;
        self.write_enable().await?;
        let (op, width) = (self.opcodes.program, self.opcodes.width);
        protocol::program_quad(&mut self.bus, op, addr, width, data).await?;
        self.wait_idle().await
    }

    // ------------------------------------------------------------------
    // Erase
    // ------------------------------------------------------------------

    /// Erase one sector
    #[maybe_async]
    pub async fn erase_sector(&mut self, sector: u32) -> Result<()> {
        let addr = address::sector_address(&self.config.geometry, sector)?;
        self.erase_at(self.opcodes.sector_erase, addr).await
    }

    /// Erase one block of `size_kb` (32 or 64 on W25Q parts)
    ///
    /// `block` counts in units of the requested size.
    #[maybe_async]
    pub async fn erase_block(&mut self, block: u32, size_kb: u32) -> Result<()> {
        let geo = &self.config.geometry;
        let size = geo.block_size_from_kb(size_kb)?;
        let addr = address::block_address(geo, block, size)?;
        let opcode = match size {
            BlockSize::Small => self.opcodes.block_erase_small,
            BlockSize::Large => self.opcodes.block_erase_large,
        };
        self.erase_at(opcode, addr).await
    }

    /// Erase the whole chip
    #[maybe_async]
    pub async fn erase_chip(&mut self) -> Result<()> {
        self.wait_idle().await?;
        self.write_enable().await?;
        log::debug!("w25q: chip erase");
        protocol::chip_erase(&mut self.bus).await?;
        self.wait_idle().await
    }

    #[maybe_async]
    async fn erase_at(&mut self, opcode: u8, addr: LinearAddress) -> Result<()> {
        self.check_addressing()?;
        self.wait_idle().await?;
        self.write_enable().await?;
        protocol::erase(&mut self.bus, opcode, addr, self.opcodes.width).await?;
        self.wait_idle().await
    }

    // ------------------------------------------------------------------
    // Suspend / resume
    // ------------------------------------------------------------------

    /// Suspend the running program/erase
    ///
    /// Decided from the last snapshot: if it does not show a busy,
    /// unsuspended chip, returns [`Error::ChipIgnored`] without touching
    /// the bus. Does not wait for the suspend to take effect, but marks the
    /// snapshot suspended so a repeated call is ignored.
    #[maybe_async]
    pub async fn suspend(&mut self) -> Result<()> {
        if self.status.state() != ChipState::Busy {
            log::debug!("w25q: suspend ignored in state {:?}", self.status.state());
            return Err(Error::ChipIgnored);
        }
        log::debug!("w25q: suspend");
        protocol::suspend(&mut self.bus).await?;
        self.status.suspended = true;
        Ok(())
    }

    /// Resume a suspended program/erase
    ///
    /// Reads the full status first and returns [`Error::ChipIgnored`]
    /// unless it shows a suspended operation.
    #[maybe_async]
    pub async fn resume(&mut self) -> Result<()> {
        if !self.read_status().await?.suspended {
            log::debug!("w25q: resume ignored, nothing suspended");
            return Err(Error::ChipIgnored);
        }
        log::debug!("w25q: resume");
        protocol::resume(&mut self.bus).await
    }

    // ------------------------------------------------------------------
    // Power and reset
    // ------------------------------------------------------------------

    /// Enter deep power-down
    #[maybe_async]
    pub async fn sleep(&mut self) -> Result<()> {
        log::debug!("w25q: power down");
        protocol::power_down(&mut self.bus).await?;
        self.bus.delay_us(SETTLE_DELAY_US).await;
        self.status.sleeping = true;
        Ok(())
    }

    /// Release from deep power-down
    #[maybe_async]
    pub async fn wake_up(&mut self) -> Result<()> {
        log::debug!("w25q: release power down");
        protocol::release_power_down(&mut self.bus).await?;
        self.bus.delay_us(SETTLE_DELAY_US).await;
        self.status.sleeping = false;
        Ok(())
    }

    /// Software reset followed by [`init`](Self::init)
    ///
    /// Without `force`, a busy or suspended chip fails with
    /// [`Error::Chip`]. With `force`, the driver waits for idle and
    /// resumes a suspended operation (waiting again) before resetting.
    #[maybe_async]
    pub async fn soft_reset(&mut self, force: bool) -> Result<StatusFlags> {
        let status = self.read_status().await?;
        if !force {
            if status.busy {
                return Err(Error::Chip(ChipFault::Busy));
            }
            if status.suspended {
                return Err(Error::Chip(ChipFault::Suspended));
            }
        } else {
            self.wait_idle().await?;
            if self.status.suspended {
                self.resume().await?;
                self.wait_idle().await?;
            }
        }

        log::debug!("w25q: software reset");
        protocol::reset_enable(&mut self.bus).await?;
        self.bus.delay_us(SETTLE_DELAY_US).await;
        protocol::reset(&mut self.bus).await?;
        self.bus.delay_us(RESET_DELAY_US).await;

        self.status = StatusFlags {
            sleeping: self.status.sleeping,
            ..StatusFlags::default()
        };
        self.init().await
    }
}

macro_rules! typed_accessors {
    ($($ty:ty => $read:ident, $program:ident;)*) => {
        impl<T: QspiTransport> NorFlash<T> {
            $(
                #[doc = concat!("Read a native-endian `", stringify!($ty), "` at `shift` inside `page`")]
                #[maybe_async]
                pub async fn $read(&mut self, page: u32, shift: u32) -> Result<$ty> {
                    self.read_value::<$ty>(page, shift).await
                }

                #[doc = concat!("Program a native-endian `", stringify!($ty), "` at `shift` inside `page`")]
                #[maybe_async]
                pub async fn $program(&mut self, page: u32, shift: u32, value: $ty) -> Result<()> {
                    self.program_value(page, shift, &value).await
                }
            )*
        }
    };
}

typed_accessors! {
    u8 => read_u8, program_u8;
    i8 => read_i8, program_i8;
    u16 => read_u16, program_u16;
    i16 => read_i16, program_i16;
    u32 => read_u32, program_u32;
    i32 => read_i32, program_i32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParamError, Phase};
    use crate::qspi::{opcodes, AddressWidth};
    use crate::testing::{Event, ScriptedBus};
    use std::vec;

    fn small_flash(bus: &mut ScriptedBus) -> NorFlash<&mut ScriptedBus> {
        NorFlash::new(bus, DriverConfig::for_geometry(ChipGeometry::W25Q128)).unwrap()
    }

    #[test]
    fn test_rejects_4byte_geometry_without_bus_support() {
        let bus = ScriptedBus::new(BusFeatures::QUAD);
        assert_eq!(
            NorFlash::new(bus, DriverConfig::default()).err(),
            Some(Error::IoModeNotSupported)
        );
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut config = DriverConfig::default();
        config.geometry.page_size = 0;
        let bus = ScriptedBus::new(BusFeatures::all());
        assert_eq!(
            NorFlash::new(bus, config).err(),
            Some(Error::Param(ParamError::InvalidGeometry))
        );
    }

    #[test]
    fn test_init_enables_quad_on_fresh_chip() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut flash = small_flash(&mut bus);
        flash.init().unwrap();

        assert_eq!(
            bus.opcodes(),
            [
                opcodes::RDID,
                opcodes::RDSR1,
                opcodes::RDSR2,
                opcodes::RDSR3,
                opcodes::RDSR2,
                opcodes::RDSR1,
                opcodes::WREN,
                opcodes::WRSR2,
                opcodes::RDSR1,
                opcodes::RDSR1,
                opcodes::RDSR2,
                opcodes::RDSR3,
            ]
        );
        assert!(bus.events.contains(&Event::Transmit(vec![0x02])));
    }

    #[test]
    fn test_init_suspended_chip_needing_quad_write() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        bus.push_response(&[0x17]);
        bus.push_response(&[0x00]);
        bus.push_response(&[0x80]);
        let mut flash = small_flash(&mut bus);
        assert_eq!(flash.init(), Err(Error::Chip(ChipFault::Suspended)));
        assert!(!bus.opcodes().contains(&opcodes::WREN));
    }

    #[test]
    fn test_init_suspended_configured_chip_only_reads() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        bus.push_response(&[0x17]);
        bus.push_response(&[0x00]);
        bus.push_response(&[0x82]);
        bus.push_response(&[0x00]);
        bus.push_response(&[0x00]);
        bus.push_response(&[0x82]);
        let mut flash = small_flash(&mut bus);
        let status = flash.init().unwrap();
        assert!(status.suspended);
        assert!(status.quad_enable);

        assert_eq!(
            bus.opcodes(),
            [
                opcodes::RDID,
                opcodes::RDSR1,
                opcodes::RDSR2,
                opcodes::RDSR3,
                opcodes::RDSR1,
                opcodes::RDSR2,
                opcodes::RDSR3,
            ]
        );
    }

    #[test]
    fn test_read_status_keeps_snapshot_on_failure() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        bus.push_response(&[0x01]);
        bus.push_response(&[0x02]);
        bus.fail_data_on = Some(opcodes::RDSR3);
        let mut flash = small_flash(&mut bus);
        flash.sleep().unwrap();

        assert_eq!(flash.read_status(), Err(Error::Transport(Phase::Data)));
        assert_eq!(
            flash.status(),
            StatusFlags {
                sleeping: true,
                ..StatusFlags::default()
            }
        );
    }

    #[test]
    fn test_param_errors_touch_no_bus() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut flash = small_flash(&mut bus);
        let pages = flash.geometry().page_count();

        let mut buf = [0u8; 4];
        assert!(flash.read_data(pages, 0, &mut buf).is_err());
        assert!(flash.program_data(0, 0, &[]).is_err());
        assert!(flash.program_u32(0, 253, 1).is_err());
        assert!(flash.read_u16(pages, 0).is_err());
        assert!(flash.erase_block(0, 16).is_err());
        assert!(flash.erase_sector(flash.geometry().sector_count()).is_err());
        assert!(flash.read_status_register(4).is_err());
        assert!(flash.write_status_register(0, 0).is_err());

        assert!(bus.events.is_empty());
    }

    #[test]
    fn test_program_sequence() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut flash = small_flash(&mut bus);
        flash.program_u16(2, 10, 0x1234).unwrap();
        assert!(flash.status().write_enable_latch);

        assert_eq!(
            bus.opcodes(),
            [opcodes::RDSR1, opcodes::WREN, opcodes::QPP, opcodes::RDSR1]
        );
        let program = bus.commands()[2];
        assert_eq!(program.address, Some(2 * 256 + 10));
        assert_eq!(program.address_width, AddressWidth::ThreeByte);
        assert!(bus
            .events
            .contains(&Event::Transmit(0x1234u16.to_ne_bytes().to_vec())));
    }

    #[test]
    fn test_bounded_polling_times_out() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        for _ in 0..3 {
            bus.push_response(&[0x01]);
        }
        let mut config = DriverConfig::for_geometry(ChipGeometry::W25Q128);
        config.poll = PollConfig {
            interval_us: 10,
            max_polls: Some(3),
        };
        let mut flash = NorFlash::new(&mut bus, config).unwrap();

        assert_eq!(flash.erase_sector(0), Err(Error::Timeout));
        assert_eq!(bus.opcodes(), [opcodes::RDSR1; 3]);
        assert_eq!(bus.events.iter().filter(|e| **e == Event::Delay(10)).count(), 2);
    }

    #[test]
    fn test_4byte_geometry_requires_init() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut flash = NorFlash::new(&mut bus, DriverConfig::default()).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            flash.read_raw(0, &mut buf),
            Err(Error::Chip(ChipFault::FourByteModeInactive))
        );
        assert_eq!(
            flash.erase_block(0, 64),
            Err(Error::Chip(ChipFault::FourByteModeInactive))
        );
        assert!(bus.events.is_empty());
    }

    #[test]
    fn test_suspend_from_snapshot() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut flash = small_flash(&mut bus);
        assert_eq!(flash.suspend(), Err(Error::ChipIgnored));
        assert!(flash.transport().events.is_empty());

        flash.transport_mut().push_response(&[0x01]);
        flash.read_status().unwrap();
        assert_eq!(flash.state(), ChipState::Busy);
        flash.suspend().unwrap();
        assert_eq!(flash.state(), ChipState::Suspended);

        // Already suspended in the snapshot: nothing more goes out
        assert_eq!(flash.suspend(), Err(Error::ChipIgnored));
        assert_eq!(
            bus.opcodes(),
            [opcodes::RDSR1, opcodes::RDSR2, opcodes::RDSR3, opcodes::SUSPEND]
        );
    }

    #[test]
    fn test_sleep_and_wake_track_flag() {
        let mut bus = ScriptedBus::new(BusFeatures::all());
        let mut flash = small_flash(&mut bus);
        flash.sleep().unwrap();
        assert!(flash.status().sleeping);
        flash.wake_up().unwrap();
        assert!(!flash.status().sleeping);

        assert_eq!(bus.opcodes(), [opcodes::DP, opcodes::RDP]);
        let wake = bus.commands()[1];
        assert!(!wake.has_address());
        assert!(!wake.has_data());
    }

    #[test]
    fn test_unsupported_capabilities() {
        let bus = ScriptedBus::new(BusFeatures::all());
        let flash = NorFlash::new(bus, DriverConfig::default()).unwrap();
        for cap in [Capability::JedecId, Capability::Sfdp, Capability::BlockLock] {
            assert_eq!(flash.require(cap), Err(Error::Unsupported(cap)));
        }
    }
}
