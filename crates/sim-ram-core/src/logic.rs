//! std_logic symbols and the byte/bit-vector codec.

/// Number of logic symbols carried by one stored byte.
pub const SYMBOLS_PER_BYTE: usize = 8;

/// One std_logic value as exchanged with the logic simulator.
///
/// Discriminants follow the simulator's enumeration order, so the raw code of
/// a symbol is stable across the host boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum LogicSymbol {
    /// Uninitialized.
    #[default]
    Uninitialized = 0,
    /// Forcing unknown.
    Unknown = 1,
    /// Forcing 0.
    Zero = 2,
    /// Forcing 1.
    One = 3,
    /// High impedance.
    HighImpedance = 4,
    /// Weak unknown.
    WeakUnknown = 5,
    /// Weak 0.
    WeakZero = 6,
    /// Weak 1.
    WeakOne = 7,
    /// Don't care.
    DontCare = 8,
}

impl LogicSymbol {
    /// Converts a symbol to its raw simulator code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a raw simulator code back into a symbol.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::Unknown),
            2 => Some(Self::Zero),
            3 => Some(Self::One),
            4 => Some(Self::HighImpedance),
            5 => Some(Self::WeakUnknown),
            6 => Some(Self::WeakZero),
            7 => Some(Self::WeakOne),
            8 => Some(Self::DontCare),
            _ => None,
        }
    }

    /// Returns the VHDL character literal for this symbol.
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::Uninitialized => 'U',
            Self::Unknown => 'X',
            Self::Zero => '0',
            Self::One => '1',
            Self::HighImpedance => 'Z',
            Self::WeakUnknown => 'W',
            Self::WeakZero => 'L',
            Self::WeakOne => 'H',
            Self::DontCare => '-',
        }
    }

    /// Parses a VHDL character literal, accepting lowercase letters.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' => Some(Self::Uninitialized),
            'X' => Some(Self::Unknown),
            '0' => Some(Self::Zero),
            '1' => Some(Self::One),
            'Z' => Some(Self::HighImpedance),
            'W' => Some(Self::WeakUnknown),
            'L' => Some(Self::WeakZero),
            'H' => Some(Self::WeakOne),
            '-' => Some(Self::DontCare),
            _ => None,
        }
    }

    /// Returns `true` only for the forcing-1 symbol.
    ///
    /// Weak high (`H`) does not count as 1.
    #[must_use]
    pub const fn is_one(self) -> bool {
        matches!(self, Self::One)
    }

    /// Maps a stored bit to its driven symbol.
    #[must_use]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Self::One
        } else {
            Self::Zero
        }
    }
}

/// Decodes one stored byte into eight symbols, most significant bit first.
#[must_use]
pub const fn decode_byte(byte: u8) -> [LogicSymbol; SYMBOLS_PER_BYTE] {
    let mut symbols = [LogicSymbol::Zero; SYMBOLS_PER_BYTE];
    let mut index = 0;
    while index < SYMBOLS_PER_BYTE {
        symbols[index] = LogicSymbol::from_bit(byte & (0x80 >> index) != 0);
        index += 1;
    }
    symbols
}

/// Merges eight symbols into `existing` under a per-bit select mask.
///
/// Bits are ordered most significant first, matching [`decode_byte`]. A bit
/// whose select symbol is not `'1'` keeps its value from `existing`; a
/// selected bit becomes 1 only when its symbol is `'1'`.
#[must_use]
pub fn merge_byte(
    existing: u8,
    symbols: &[LogicSymbol; SYMBOLS_PER_BYTE],
    select: &[LogicSymbol; SYMBOLS_PER_BYTE],
) -> u8 {
    symbols
        .iter()
        .zip(select)
        .enumerate()
        .fold(existing, |byte, (index, (symbol, enable))| {
            if !enable.is_one() {
                return byte;
            }
            let mask = 0x80 >> index;
            if symbol.is_one() {
                byte | mask
            } else {
                byte & !mask
            }
        })
}

/// Formats a symbol vector as a VHDL bit-string literal body.
#[must_use]
pub fn format_symbols(symbols: &[LogicSymbol]) -> String {
    symbols.iter().map(|symbol| symbol.to_char()).collect()
}
