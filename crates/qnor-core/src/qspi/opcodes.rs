//! W25Q serial NOR flash opcodes
//!
//! Instruction set of the Winbond W25Q family (W25Q128/W25Q256 and
//! compatibles), including the dedicated 4-byte-address variants.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/program/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR1: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3
pub const RDSR3: u8 = 0x15;
/// Write Status Register 1
pub const WRSR1: u8 = 0x01;
/// Write Status Register 2
pub const WRSR2: u8 = 0x31;
/// Write Status Register 3
pub const WRSR3: u8 = 0x11;

// ============================================================================
// Identification / power
// ============================================================================

/// Read Device ID. Shares its value with [`RDP`]; the chip tells the two
/// apart by whether an address and data phase follow.
pub const RDID: u8 = 0xAB;
/// Release from Power-Down
pub const RDP: u8 = 0xAB;
/// Power-Down
pub const DP: u8 = 0xB9;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data (1-1-1), 3-byte address
pub const READ: u8 = 0x03;
/// Read Data (1-1-1), 4-byte address
pub const READ_4B: u8 = 0x13;
/// Fast Read Quad I/O (1-4-4), 3-byte address
pub const QIOR: u8 = 0xEB;
/// Fast Read Quad I/O (1-4-4), 4-byte address
pub const QIOR_4B: u8 = 0xEC;

/// Dummy cycles for Fast Read Quad I/O (mode byte included)
pub const QIOR_DUMMY_CYCLES: u8 = 6;

// ============================================================================
// Page Program
// ============================================================================

/// Page Program (1-1-1), 3-byte address
pub const PP: u8 = 0x02;
/// Page Program (1-1-1), 4-byte address
pub const PP_4B: u8 = 0x12;
/// Quad Input Page Program (1-1-4), 3-byte address
pub const QPP: u8 = 0x32;
/// Quad Input Page Program (1-1-4), 4-byte address
pub const QPP_4B: u8 = 0x34;

// ============================================================================
// Erase commands
// ============================================================================

/// Sector Erase 4KB, 3-byte address
pub const SE: u8 = 0x20;
/// Sector Erase 4KB, 4-byte address
pub const SE_4B: u8 = 0x21;
/// Block Erase 32KB. No dedicated 4-byte variant; takes a 4-byte address
/// once the chip is in 4-byte mode.
pub const BE32: u8 = 0x52;
/// Block Erase 64KB, 3-byte address
pub const BE64: u8 = 0xD8;
/// Block Erase 64KB, 4-byte address
pub const BE64_4B: u8 = 0xDC;
/// Chip Erase
pub const CE: u8 = 0xC7;

// ============================================================================
// 4-byte address mode control
// ============================================================================

/// Enter 4-Byte Address Mode
pub const EN4B: u8 = 0xB7;
/// Exit 4-Byte Address Mode
pub const EX4B: u8 = 0xE9;

// ============================================================================
// Suspend/Resume
// ============================================================================

/// Erase/Program Suspend
pub const SUSPEND: u8 = 0x75;
/// Erase/Program Resume
pub const RESUME: u8 = 0x7A;

// ============================================================================
// Software Reset
// ============================================================================

/// Enable Reset
pub const RSTEN: u8 = 0x66;
/// Reset Device
pub const RST: u8 = 0x99;

/// Returns true if `opcode` always carries a 4-byte address regardless of
/// the chip's current address mode
pub const fn is_dedicated_4byte(opcode: u8) -> bool {
    matches!(opcode, READ_4B | QIOR_4B | PP_4B | QPP_4B | SE_4B | BE64_4B)
}
