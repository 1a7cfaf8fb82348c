//! Chip geometry - page/sector/block sizes and counts

use crate::error::{ParamError, Result};
use crate::qspi::AddressWidth;

/// Capacities above this many Mbit no longer fit a 24-bit address
pub const FOUR_BYTE_THRESHOLD_MBIT: u32 = 128;

/// Largest page size the driver accepts
pub const MAX_PAGE_SIZE: u32 = 256;

/// Largest capacity whose byte size still fits a `u32` (2 GiB)
pub const MAX_CAPACITY_MBIT: u32 = 16 * 1024;

/// Block erase granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSize {
    /// The smaller block (32 KB on W25Q parts)
    Small,
    /// The larger block (64 KB on W25Q parts)
    Large,
}

/// Immutable description of a chip's memory array
///
/// Set once when the driver is configured and never mutated. All counts
/// are derived from the sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct ChipGeometry {
    /// Page size in bytes
    pub page_size: u32,
    /// Sector size in KB
    pub sector_size_kb: u32,
    /// Small block size in KB
    pub small_block_kb: u32,
    /// Large block size in KB
    pub large_block_kb: u32,
    /// Total capacity in Mbit
    pub capacity_mbit: u32,
}

impl ChipGeometry {
    /// Winbond W25Q256 (256 Mbit, needs 4-byte addressing)
    pub const W25Q256: ChipGeometry = ChipGeometry::winbond(256);

    /// Winbond W25Q128 (128 Mbit, 3-byte addressing)
    pub const W25Q128: ChipGeometry = ChipGeometry::winbond(128);

    /// Standard Winbond layout (256 B pages, 4 KB sectors, 32/64 KB blocks)
    /// for the given capacity
    pub const fn winbond(capacity_mbit: u32) -> Self {
        Self {
            page_size: 256,
            sector_size_kb: 4,
            small_block_kb: 32,
            large_block_kb: 64,
            capacity_mbit,
        }
    }

    /// Total capacity in bytes
    pub const fn capacity_bytes(&self) -> u32 {
        self.capacity_mbit * (1024 * 1024 / 8)
    }

    /// Sector size in bytes
    pub const fn sector_size(&self) -> u32 {
        self.sector_size_kb * 1024
    }

    /// Number of pages
    pub const fn page_count(&self) -> u32 {
        self.capacity_bytes() / self.page_size
    }

    /// Number of sectors
    pub const fn sector_count(&self) -> u32 {
        self.capacity_bytes() / self.sector_size()
    }

    /// Block size in bytes
    pub const fn block_size(&self, size: BlockSize) -> u32 {
        match size {
            BlockSize::Small => self.small_block_kb * 1024,
            BlockSize::Large => self.large_block_kb * 1024,
        }
    }

    /// Number of blocks of the given size
    pub const fn block_count(&self, size: BlockSize) -> u32 {
        self.capacity_bytes() / self.block_size(size)
    }

    /// Map a block size in KB onto one of the two supported quanta
    pub fn block_size_from_kb(&self, size_kb: u32) -> Result<BlockSize> {
        if size_kb == self.small_block_kb {
            Ok(BlockSize::Small)
        } else if size_kb == self.large_block_kb {
            Ok(BlockSize::Large)
        } else {
            Err(ParamError::InvalidBlockSize { size_kb }.into())
        }
    }

    /// Returns true if the capacity exceeds the 3-byte address space
    pub const fn requires_4byte_addr(&self) -> bool {
        self.capacity_mbit > FOUR_BYTE_THRESHOLD_MBIT
    }

    /// Address width every address-bearing command must use
    pub const fn address_width(&self) -> AddressWidth {
        if self.requires_4byte_addr() {
            AddressWidth::FourByte
        } else {
            AddressWidth::ThreeByte
        }
    }

    /// Check that the sizes describe a real chip
    pub fn validate(&self) -> Result<()> {
        let ok = self.page_size.is_power_of_two()
            && self.page_size <= MAX_PAGE_SIZE
            && self.sector_size_kb > 0
            && self.small_block_kb > 0
            && self.large_block_kb > self.small_block_kb
            && self.large_block_kb <= 1024
            && self.capacity_mbit > 0
            && self.capacity_mbit <= MAX_CAPACITY_MBIT
            && self.small_block_kb % self.sector_size_kb == 0
            && self.large_block_kb % self.small_block_kb == 0
            && self.capacity_bytes() % self.block_size(BlockSize::Large) == 0
            && self.sector_size() % self.page_size == 0;

        if ok {
            Ok(())
        } else {
            Err(ParamError::InvalidGeometry.into())
        }
    }
}

impl Default for ChipGeometry {
    fn default() -> Self {
        Self::W25Q256
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_w25q256_counts() {
        let geo = ChipGeometry::W25Q256;
        assert_eq!(geo.capacity_bytes(), 32 * 1024 * 1024);
        assert_eq!(geo.page_count(), 131_072);
        assert_eq!(geo.sector_count(), 8192);
        assert_eq!(geo.block_count(BlockSize::Large), 512);
        assert_eq!(geo.block_count(BlockSize::Small), 1024);
        assert!(geo.requires_4byte_addr());
        assert_eq!(geo.address_width(), AddressWidth::FourByte);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let geo = ChipGeometry::W25Q128;
        assert!(!geo.requires_4byte_addr());
        assert_eq!(geo.address_width(), AddressWidth::ThreeByte);
        assert_eq!(geo.capacity_bytes(), 1u32 << AddressWidth::ThreeByte.bits());
    }

    #[test]
    fn test_block_size_from_kb() {
        let geo = ChipGeometry::W25Q256;
        assert_eq!(geo.block_size_from_kb(32), Ok(BlockSize::Small));
        assert_eq!(geo.block_size_from_kb(64), Ok(BlockSize::Large));
        assert_eq!(
            geo.block_size_from_kb(16),
            Err(Error::Param(ParamError::InvalidBlockSize { size_kb: 16 }))
        );
    }

    #[test]
    fn test_validate() {
        assert!(ChipGeometry::W25Q256.validate().is_ok());
        assert!(ChipGeometry::winbond(64).validate().is_ok());

        let mut geo = ChipGeometry::W25Q256;
        geo.page_size = 300;
        assert!(geo.validate().is_err());

        let mut geo = ChipGeometry::W25Q256;
        geo.small_block_kb = 48;
        assert!(geo.validate().is_err());

        let mut geo = ChipGeometry::W25Q256;
        geo.capacity_mbit = 0;
        assert!(geo.validate().is_err());
    }
}
