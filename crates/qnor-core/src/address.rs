//! Address translation
//!
//! Pure functions that turn page/shift or sector/block indices into linear
//! byte addresses and enforce bounds. Nothing here touches the bus, so
//! every check runs before any transaction is issued.

use crate::error::{ParamError, Result};
use crate::geometry::{BlockSize, ChipGeometry};

/// Linear byte address inside the flash array
///
/// Always recomputed from indices, never cached.
pub type LinearAddress = u32;

/// Translate a page number and intra-page shift into a linear address
///
/// `shift` must point inside the page; use [`page_span`] when a transfer
/// length is known.
pub fn page_to_address(geo: &ChipGeometry, page: u32, shift: u32) -> Result<LinearAddress> {
    check_page(geo, page)?;
    if shift >= geo.page_size {
        return Err(ParamError::ShiftOutOfRange { shift, len: 0 }.into());
    }
    Ok(page * geo.page_size + shift)
}

/// Split a linear address back into (page, shift)
pub fn address_to_page(geo: &ChipGeometry, addr: LinearAddress) -> (u32, u32) {
    (addr / geo.page_size, addr % geo.page_size)
}

/// Validate a page-relative transfer of `len` bytes and return its start
/// address
///
/// Fails if `len` is outside `[1, page_size]`, if the page is out of range
/// or if `shift + len` runs past the end of the page.
pub fn page_span(geo: &ChipGeometry, page: u32, shift: u32, len: usize) -> Result<LinearAddress> {
    check_length(geo, len)?;
    check_page(geo, page)?;
    if u64::from(shift) + len as u64 > u64::from(geo.page_size) {
        return Err(ParamError::ShiftOutOfRange { shift, len }.into());
    }
    Ok(page * geo.page_size + shift)
}

/// Validate a single-shot raw transfer of `len` bytes at `addr`
pub fn raw_span(geo: &ChipGeometry, addr: LinearAddress, len: usize) -> Result<LinearAddress> {
    check_length(geo, len)?;
    check_capacity(geo, addr, len)?;
    Ok(addr)
}

/// Validate a raw program: like [`raw_span`], and the data must not wrap
/// around the end of its page
pub fn program_span(geo: &ChipGeometry, addr: LinearAddress, len: usize) -> Result<LinearAddress> {
    raw_span(geo, addr, len)?;
    let (_, shift) = address_to_page(geo, addr);
    if shift as usize + len > geo.page_size as usize {
        return Err(ParamError::CrossesPageBoundary { addr, len }.into());
    }
    Ok(addr)
}

/// Check that `[addr, addr + len)` is non-empty and lies inside the chip
pub fn check_capacity(geo: &ChipGeometry, addr: LinearAddress, len: usize) -> Result<()> {
    let end = addr as u64 + len as u64;
    if len == 0 || end > geo.capacity_bytes() as u64 {
        return Err(ParamError::AddressOutOfRange { addr, len }.into());
    }
    Ok(())
}

/// Start address of a sector
pub fn sector_address(geo: &ChipGeometry, sector: u32) -> Result<LinearAddress> {
    let count = geo.sector_count();
    if sector >= count {
        return Err(ParamError::SectorOutOfRange { sector, count }.into());
    }
    Ok(sector * geo.sector_size())
}

/// Start address of a block of the given size
///
/// Blocks are numbered in units of `size`, so the small-block count is
/// larger than the large-block count.
pub fn block_address(geo: &ChipGeometry, block: u32, size: BlockSize) -> Result<LinearAddress> {
    let count = geo.block_count(size);
    if block >= count {
        return Err(ParamError::BlockOutOfRange { block, count }.into());
    }
    Ok(block * geo.block_size(size))
}

fn check_page(geo: &ChipGeometry, page: u32) -> Result<()> {
    let count = geo.page_count();
    if page >= count {
        return Err(ParamError::PageOutOfRange { page, count }.into());
    }
    Ok(())
}

fn check_length(geo: &ChipGeometry, len: usize) -> Result<()> {
    if len == 0 || len > geo.page_size as usize {
        return Err(ParamError::LengthOutOfRange { len }.into());
    }
    Ok(())
}
