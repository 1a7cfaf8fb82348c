//! qnor-core - Command sequencer for quad-SPI NOR flash chips
//!
//! This crate turns logical storage operations (read N bytes at page P,
//! offset S; erase a sector or block; program a page; sleep, wake, reset)
//! into correctly parameterized and correctly ordered bus transactions for
//! a Winbond W25Q-style serial NOR flash. It tracks the chip's status
//! registers so that operations are only issued when they are legal.
//!
//! The physical bus is abstracted behind [`QspiTransport`]; the crate never
//! touches hardware itself. It is `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`) and
//!   configuration file loading
//! - `alloc` - Enable heap allocation
//! - `is_sync` - Compile the transport trait and driver as blocking code
//!
//! # Example
//!
//! ```ignore
//! use qnor_core::{DriverConfig, NorFlash, QspiTransport};
//!
//! fn store<T: QspiTransport>(bus: T) -> qnor_core::Result<()> {
//!     let mut flash = NorFlash::new(bus, DriverConfig::default())?;
//!     flash.init()?;
//!     flash.erase_sector(0)?;
//!     flash.program_u32(0, 0, 0xDEAD_BEEF)?;
//!     assert_eq!(flash.read_u32(0, 0)?, 0xDEAD_BEEF);
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod address;
#[cfg(feature = "std")]
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod protocol;
pub mod qspi;
pub mod status;
pub mod transport;

#[cfg(test)]
mod testing;

pub use address::LinearAddress;
pub use dispatch::{Dispatcher, OpcodeSet, Payload};
pub use driver::{Capability, DriverConfig, NorFlash, PollConfig};
pub use error::{ChipFault, Error, ParamError, Phase, Result};
pub use geometry::{BlockSize, ChipGeometry};
pub use qspi::{AddressWidth, DataPhase, IoMode, QspiCommand};
pub use status::{ChipState, StatusFlags, StatusRegister};
pub use transport::{BusFeatures, QspiTransport};
