//! Atomicity tests for parallel atomic read-modify-write instructions.
//!
//! Every work-item of a grid applies the same atomic operation to one memory
//! location. Afterwards each work-item checks the value it got back (`dst`)
//! and the value left in memory, setting flags in a result array; a test
//! passes when every slot of that array holds the expected flag set.
//!
//! Operands are chosen so that each work-item sees a distinct `dst`, which
//! lets the checks be exact rather than conservative. Operations that only
//! use a few bits of the location additionally multiply their test values by
//! a repeating key so that most bits are exercised; the checks then also
//! verify that the values decode cleanly.
//!
//! [`AtomicTest::emulate`] runs the whole protocol on the host, executing
//! workgroups one after another the way a conforming device is allowed to.

mod behavior;
mod emulate;

pub use behavior::{AtomicBehavior, DstCheck, ExchCheck, Lane, MemCheck};
pub use emulate::{apply, Emulation};
pub use test::{
    atomic_suite, AtomicTest, TestKind, FLAG_DST, FLAG_MEM, FLAG_NONE, FLAG_VLD_DST,
    FLAG_VLD_MEM,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Atomic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomicOp {
    /// Integer addition
    Add,
    /// Bitwise and
    And,
    /// Compare and swap
    Cas,
    /// Exchange
    Exch,
    /// Atomic load
    Ld,
    /// Maximum
    Max,
    /// Minimum
    Min,
    /// Bitwise or
    Or,
    /// Atomic store
    St,
    /// Integer subtraction
    Sub,
    /// Decrement, wrapping to the operand at zero
    Wrapdec,
    /// Increment, wrapping to zero at the operand
    Wrapinc,
    /// Bitwise exclusive or
    Xor,
}

impl AtomicOp {
    /// All operations
    pub const ALL: [Self; 13] = [
        Self::Add,
        Self::And,
        Self::Cas,
        Self::Exch,
        Self::Ld,
        Self::Max,
        Self::Min,
        Self::Or,
        Self::St,
        Self::Sub,
        Self::Wrapdec,
        Self::Wrapinc,
        Self::Xor,
    ];

    /// Opcode suffix used in test names
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::And => "and",
            Self::Cas => "cas",
            Self::Exch => "exch",
            Self::Ld => "ld",
            Self::Max => "max",
            Self::Min => "min",
            Self::Or => "or",
            Self::St => "st",
            Self::Sub => "sub",
            Self::Wrapdec => "wrapdec",
            Self::Wrapinc => "wrapinc",
            Self::Xor => "xor",
        }
    }

    /// Whether the operation is legal in its returning form (`atomic`)
    #[must_use]
    pub const fn has_ret_form(self) -> bool {
        !matches!(self, Self::St)
    }

    /// Whether the operation is legal in its no-return form (`atomicnoret`)
    #[must_use]
    pub const fn has_noret_form(self) -> bool {
        !matches!(self, Self::Ld | Self::Exch)
    }

    /// Whether `ty` is a legal operand type for this operation
    #[must_use]
    pub const fn accepts_type(self, ty: AtomicType) -> bool {
        match self {
            Self::And | Self::Or | Self::Xor | Self::Exch | Self::Cas | Self::Ld | Self::St => {
                ty.is_bit()
            }
            Self::Add | Self::Sub | Self::Max | Self::Min => ty.is_signed() || ty.is_unsigned(),
            Self::Wrapinc | Self::Wrapdec => ty.is_unsigned(),
        }
    }

    /// Whether `order` is a legal memory order for this operation
    #[must_use]
    pub const fn accepts_order(self, order: MemoryOrder) -> bool {
        match self {
            Self::Ld => matches!(order, MemoryOrder::Relaxed | MemoryOrder::ScAcquire),
            Self::St => matches!(order, MemoryOrder::Relaxed | MemoryOrder::ScRelease),
            _ => true,
        }
    }
}

impl fmt::Display for AtomicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memory segment of the atomic variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Global,
    Group,
    Flat,
}

impl Segment {
    pub const ALL: [Self; 3] = [Self::Global, Self::Group, Self::Flat];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Group => "group",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memory order of the atomic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryOrder {
    #[serde(rename = "rlx")]
    Relaxed,
    #[serde(rename = "scacq")]
    ScAcquire,
    #[serde(rename = "screl")]
    ScRelease,
    #[serde(rename = "scar")]
    ScAcquireRelease,
}

impl MemoryOrder {
    pub const ALL: [Self; 4] = [
        Self::Relaxed,
        Self::ScAcquire,
        Self::ScRelease,
        Self::ScAcquireRelease,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Relaxed => "rlx",
            Self::ScAcquire => "scacq",
            Self::ScRelease => "screl",
            Self::ScAcquireRelease => "scar",
        }
    }
}

impl fmt::Display for MemoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Memory scope of the atomic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryScope {
    #[serde(rename = "wave")]
    Wavefront,
    #[serde(rename = "wg")]
    Workgroup,
    #[serde(rename = "agent")]
    Agent,
    #[serde(rename = "system")]
    System,
}

impl MemoryScope {
    pub const ALL: [Self; 4] = [Self::Wavefront, Self::Workgroup, Self::Agent, Self::System];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wavefront => "wave",
            Self::Workgroup => "wg",
            Self::Agent => "agent",
            Self::System => "system",
        }
    }
}

impl fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operand type of an atomic operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomicType {
    B32,
    B64,
    S32,
    S64,
    U32,
    U64,
}

impl AtomicType {
    pub const ALL: [Self; 6] = [Self::B32, Self::B64, Self::S32, Self::S64, Self::U32, Self::U64];

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::B32 | Self::S32 | Self::U32 => 32,
            Self::B64 | Self::S64 | Self::U64 => 64,
        }
    }

    /// All-ones value of the type width
    #[must_use]
    pub const fn mask(self) -> u64 {
        if self.bits() == 32 {
            0xFFFF_FFFF
        } else {
            u64::MAX
        }
    }

    #[must_use]
    pub const fn is_bit(self) -> bool {
        matches!(self, Self::B32 | Self::B64)
    }

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::S32 | Self::S64)
    }

    #[must_use]
    pub const fn is_unsigned(self) -> bool {
        matches!(self, Self::U32 | Self::U64)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::B32 => "b32",
            Self::B64 => "b64",
            Self::S32 => "s32",
            Self::S64 => "s64",
            Self::U32 => "u32",
            Self::U64 => "u64",
        }
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
