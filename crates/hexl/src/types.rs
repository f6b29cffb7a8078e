//! Value types and rounding modes shared by the numeric emulation code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::HexlError;

/// Scalar value type of an instruction operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed 8-bit integer
    S8,
    /// Signed 16-bit integer
    S16,
    /// Signed 32-bit integer
    S32,
    /// Signed 64-bit integer
    S64,
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// Half precision float
    F16,
    /// Single precision float
    F32,
    /// Double precision float
    F64,
}

impl ValueType {
    /// All value types, integers first
    pub const ALL: [Self; 11] = [
        Self::S8,
        Self::S16,
        Self::S32,
        Self::S64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F16,
        Self::F32,
        Self::F64,
    ];

    /// Whether this is a signed integer type
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::S8 | Self::S16 | Self::S32 | Self::S64)
    }

    /// Whether this is an unsigned integer type
    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Whether this is an integer type
    #[must_use]
    pub const fn is_int(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// Whether this is a floating-point type
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32 | Self::F64)
    }

    /// Width in bits
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::S8 | Self::U8 => 8,
            Self::S16 | Self::U16 | Self::F16 => 16,
            Self::S32 | Self::U32 | Self::F32 => 32,
            Self::S64 | Self::U64 | Self::F64 => 64,
        }
    }

    /// Assembler name (`s8`, `f32`, ...)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::S64 => "s64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = HexlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| HexlError::config(format!("unknown value type '{s}'")))
    }
}

/// Rounding mode of an ALU modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// No rounding modifier
    #[default]
    None,
    /// Float round to nearest even
    Near,
    /// Float round toward zero
    Zero,
    /// Float round toward +infinity
    Up,
    /// Float round toward -infinity
    Down,
    /// Integer round to nearest even
    Neari,
    /// Integer round toward zero
    Zeroi,
    /// Integer round toward +infinity
    Upi,
    /// Integer round toward -infinity
    Downi,
    /// Signaling integer round to nearest even
    Sneari,
    /// Signaling integer round toward zero
    Szeroi,
    /// Signaling integer round toward +infinity
    Supi,
    /// Signaling integer round toward -infinity
    Sdowni,
    /// Saturating integer round to nearest even
    NeariSat,
    /// Saturating integer round toward zero
    ZeroiSat,
    /// Saturating integer round toward +infinity
    UpiSat,
    /// Saturating integer round toward -infinity
    DowniSat,
    /// Signaling saturating integer round to nearest even
    SneariSat,
    /// Signaling saturating integer round toward zero
    SzeroiSat,
    /// Signaling saturating integer round toward +infinity
    SupiSat,
    /// Signaling saturating integer round toward -infinity
    SdowniSat,
}

/// Direction an integer rounding mode rounds in, ignoring saturation and signaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntRounding {
    /// Nearest even
    Near,
    /// Toward zero
    Zero,
    /// Toward +infinity
    Up,
    /// Toward -infinity
    Down,
}

impl Rounding {
    /// All rounding modes
    pub const ALL: [Self; 21] = [
        Self::None,
        Self::Near,
        Self::Zero,
        Self::Up,
        Self::Down,
        Self::Neari,
        Self::Zeroi,
        Self::Upi,
        Self::Downi,
        Self::Sneari,
        Self::Szeroi,
        Self::Supi,
        Self::Sdowni,
        Self::NeariSat,
        Self::ZeroiSat,
        Self::UpiSat,
        Self::DowniSat,
        Self::SneariSat,
        Self::SzeroiSat,
        Self::SupiSat,
        Self::SdowniSat,
    ];

    /// Integer rounding direction, `None` for float and absent modes
    #[must_use]
    pub const fn int_rounding(self) -> Option<IntRounding> {
        match self {
            Self::Neari | Self::Sneari | Self::NeariSat | Self::SneariSat => {
                Some(IntRounding::Near)
            }
            Self::Zeroi | Self::Szeroi | Self::ZeroiSat | Self::SzeroiSat => {
                Some(IntRounding::Zero)
            }
            Self::Upi | Self::Supi | Self::UpiSat | Self::SupiSat => Some(IntRounding::Up),
            Self::Downi | Self::Sdowni | Self::DowniSat | Self::SdowniSat => {
                Some(IntRounding::Down)
            }
            Self::None | Self::Near | Self::Zero | Self::Up | Self::Down => None,
        }
    }

    /// Whether this is a saturating integer mode
    #[must_use]
    pub const fn is_sat(self) -> bool {
        matches!(
            self,
            Self::NeariSat
                | Self::ZeroiSat
                | Self::UpiSat
                | Self::DowniSat
                | Self::SneariSat
                | Self::SzeroiSat
                | Self::SupiSat
                | Self::SdowniSat
        )
    }

    /// Assembler name (`neari_sat`, `zero`, ...)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Near => "near",
            Self::Zero => "zero",
            Self::Up => "up",
            Self::Down => "down",
            Self::Neari => "neari",
            Self::Zeroi => "zeroi",
            Self::Upi => "upi",
            Self::Downi => "downi",
            Self::Sneari => "sneari",
            Self::Szeroi => "szeroi",
            Self::Supi => "supi",
            Self::Sdowni => "sdowni",
            Self::NeariSat => "neari_sat",
            Self::ZeroiSat => "zeroi_sat",
            Self::UpiSat => "upi_sat",
            Self::DowniSat => "downi_sat",
            Self::SneariSat => "sneari_sat",
            Self::SzeroiSat => "szeroi_sat",
            Self::SupiSat => "supi_sat",
            Self::SdowniSat => "sdowni_sat",
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rounding {
    type Err = HexlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| HexlError::config(format!("unknown rounding mode '{s}'")))
    }
}

/// ALU modifier attached to a conversion or arithmetic instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AluModifier {
    /// Rounding mode
    pub rounding: Rounding,
    /// Flush subnormals to zero
    pub ftz: bool,
}

impl AluModifier {
    /// Create a modifier with the given rounding
    #[must_use]
    pub const fn new(rounding: Rounding) -> Self {
        Self {
            rounding,
            ftz: false,
        }
    }

    /// Set flush-to-zero
    #[must_use]
    pub const fn with_ftz(mut self, ftz: bool) -> Self {
        self.ftz = ftz;
        self
    }
}
