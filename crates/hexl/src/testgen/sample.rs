//! Live instruction samples mutated by the search.

use super::prop::PropId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Encoding format of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstFormat {
    /// No modifiers
    Basic,
    /// Rounding/ftz/packing modifiers
    Mod,
    /// Address computation
    Addr,
    /// Atomic memory operation
    Atomic,
    /// Branch
    Br,
    /// Comparison
    Cmp,
    /// Conversion
    Cvt,
    /// Image access
    Image,
    /// Cross-lane
    Lane,
    /// Memory access
    Mem,
    /// Memory fence
    MemFence,
    /// Image/sampler query
    Query,
    /// Segment address
    Seg,
    /// Segment conversion
    SegCvt,
    /// Signal operation
    Signal,
    /// Instruction with a separate source type
    SourceType,
}

impl fmt::Display for InstFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Mod => "mod",
            Self::Addr => "addr",
            Self::Atomic => "atomic",
            Self::Br => "br",
            Self::Cmp => "cmp",
            Self::Cvt => "cvt",
            Self::Image => "image",
            Self::Lane => "lane",
            Self::Mem => "mem",
            Self::MemFence => "mem_fence",
            Self::Query => "query",
            Self::Seg => "seg",
            Self::SegCvt => "seg_cvt",
            Self::Signal => "signal",
            Self::SourceType => "source_type",
        };
        f.write_str(name)
    }
}

/// An instruction operand as far as diagnostics are concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Absent operand
    Null,
    /// Register (`$s1`)
    Register(String),
    /// Vector of registers, immediates or wavesize
    Vector(Vec<Operand>),
    /// Memory address
    Address {
        /// Symbol name
        symbol: Option<String>,
        /// Base register
        reg: Option<String>,
        /// Byte offset
        offset: i64,
    },
    /// Wavesize constant
    WaveSize,
    /// Reference to a label, function, kernel, signature or fbarrier
    CodeRef(String),
    /// List of code references
    CodeList(Vec<String>),
    /// Immediate bytes
    Immediate(Vec<u8>),
    /// Alignment
    Align(u32),
    /// Operand kind the renderer does not know
    Unknown(u32),
}

fn write_immediate(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("IMM(")?;
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{b}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Register(name) | Self::CodeRef(name) => f.write_str(name),
            Self::Vector(elements) => {
                f.write_str("(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match e {
                        Self::Register(name) => f.write_str(name)?,
                        Self::Immediate(bytes) => write_immediate(f, bytes)?,
                        Self::WaveSize => f.write_str("wavesize")?,
                        _ => f.write_str("***UNKNOWN***")?,
                    }
                }
                f.write_str(")")
            }
            Self::Address {
                symbol,
                reg,
                offset,
            } => {
                if let Some(symbol) = symbol {
                    write!(f, "[{symbol}]")?;
                }
                if let Some(reg) = reg {
                    write!(f, "[{reg}]")?;
                }
                if *offset != 0 || (symbol.is_none() && reg.is_none()) {
                    write!(f, "[{offset}]")?;
                }
                Ok(())
            }
            Self::WaveSize => f.write_str("wavesize"),
            Self::CodeList(names) => write!(f, "({})", names.join(", ")),
            Self::Immediate(bytes) => write_immediate(f, bytes),
            Self::Align(n) => write!(f, "align({n})"),
            Self::Unknown(kind) => write!(f, "*UNKNOWN*, kind = {kind}"),
        }
    }
}

/// Mutable instruction under construction: property assignments plus operands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    opcode: String,
    format: InstFormat,
    props: BTreeMap<PropId, u32>,
    operands: Vec<Operand>,
}

impl Sample {
    /// Create an empty sample
    #[must_use]
    pub fn new(opcode: impl Into<String>, format: InstFormat) -> Self {
        Self {
            opcode: opcode.into(),
            format,
            props: BTreeMap::new(),
            operands: Vec::new(),
        }
    }

    /// Opcode name
    #[must_use]
    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    /// Encoding format
    #[must_use]
    pub const fn format(&self) -> InstFormat {
        self.format
    }

    /// Value assigned to `prop`
    #[must_use]
    pub fn get(&self, prop: PropId) -> Option<u32> {
        self.props.get(&prop).copied()
    }

    /// Assign `value` to `prop`
    pub fn set(&mut self, prop: PropId, value: u32) {
        self.props.insert(prop, value);
    }

    /// Clear the assignment of `prop`
    pub fn unset(&mut self, prop: PropId) {
        self.props.remove(&prop);
    }

    /// Replace every assignment and operand with those of `other`
    pub fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }

    /// Assigned properties in id order
    pub fn props(&self) -> impl Iterator<Item = (PropId, u32)> + '_ {
        self.props.iter().map(|(p, v)| (*p, *v))
    }

    /// Operands
    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Replace the operand list
    pub fn set_operands(&mut self, operands: Vec<Operand>) {
        self.operands = operands;
    }

    /// Builder form of [`set_operands`](Self::set_operands)
    #[must_use]
    pub fn with_operands(mut self, operands: Vec<Operand>) -> Self {
        self.operands = operands;
        self
    }
}
