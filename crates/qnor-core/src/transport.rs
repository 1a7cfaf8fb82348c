//! Transport trait definitions
//!
//! The transport is the bus-transaction executor: it performs one command
//! phase and, when the descriptor announces one, one data phase. It is
//! implemented outside this crate (a QSPI peripheral driver, or the
//! in-memory emulator used by the tests).
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy and other executors)
//! - With the `is_sync` feature, traits become synchronous

use bitflags::bitflags;
use maybe_async::maybe_async;

use crate::qspi::QspiCommand;

bitflags! {
    /// Transport feature flags
    ///
    /// These flags indicate what capabilities a transport supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusFeatures: u32 {
        /// Supports 32-bit address fields
        const FOUR_BYTE_ADDR = 1 << 0;
        /// Can move data on four lines (1-1-4 mode)
        const QUAD_IN        = 1 << 1;
        /// Can move address and data on four lines (1-4-4 mode)
        const QUAD_IO        = 1 << 2;

        /// Shorthand for quad mode (both QUAD_IN and QUAD_IO)
        const QUAD = Self::QUAD_IN.bits() | Self::QUAD_IO.bits();
    }
}

impl Default for BusFeatures {
    fn default() -> Self {
        BusFeatures::empty()
    }
}

/// QSPI transport trait (sync or async depending on `is_sync` feature)
///
/// Exactly one transaction may be in flight. `command` is always called
/// first; when the descriptor's data phase is not `None`, it is followed
/// by exactly one `transmit` or `receive` call whose buffer length equals
/// the announced length.
///
/// ## Example
///
/// ```ignore
/// #[maybe_async]
/// impl QspiTransport for Stm32Qspi {
///     type Error = HalError;
///
///     fn features(&self) -> BusFeatures {
///         BusFeatures::FOUR_BYTE_ADDR | BusFeatures::QUAD
///     }
///
///     async fn command(&mut self, cmd: &QspiCommand, timeout_ms: u32) -> Result<(), HalError> {
///         self.hal.command(&to_hal(cmd), timeout_ms)
///     }
///     // ...
/// }
/// ```
#[maybe_async(AFIT)]
pub trait QspiTransport {
    /// Transport-level failure reported by the bus
    type Error: core::fmt::Debug;

    /// Get the features supported by this transport
    fn features(&self) -> BusFeatures;

    /// Run the instruction, address and dummy phases of `cmd`
    async fn command(&mut self, cmd: &QspiCommand, timeout_ms: u32)
        -> Result<(), Self::Error>;

    /// Run a host-to-chip data phase
    async fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), Self::Error>;

    /// Run a chip-to-host data phase
    async fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), Self::Error>;

    /// Delay for the specified number of microseconds
    async fn delay_us(&mut self, us: u32);
}

// Lending a transport to a driver keeps it inspectable after the driver is dropped
#[maybe_async(AFIT)]
impl<T: QspiTransport + ?Sized> QspiTransport for &mut T {
    type Error = T::Error;

    fn features(&self) -> BusFeatures {
        (**self).features()
    }

    async fn command(&mut self, cmd: &QspiCommand, timeout_ms: u32)
        -> Result<(), Self::Error> {
        (**self).command(cmd, timeout_ms).await
    }

    async fn transmit(&mut self, data: &[u8], timeout_ms: u32) -> Result<(), Self::Error> {
        (**self).transmit(data, timeout_ms).await
    }

    async fn receive(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<(), Self::Error> {
        (**self).receive(buf, timeout_ms).await
    }

    async fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us).await
    }
}
