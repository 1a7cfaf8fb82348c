//! Address field width

/// Width of the address field sent after the opcode
///
/// Chosen once from the chip capacity; every address-bearing command of a
/// driver instance uses the same width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// Command without an address field
    #[default]
    None,
    /// 24-bit address
    ThreeByte,
    /// 32-bit address
    FourByte,
}

impl AddressWidth {
    /// Size of the address field in bits
    pub const fn bits(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 24,
            Self::FourByte => 32,
        }
    }
}
