//! Instruction properties and their candidate-value cursors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an instruction property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropId(pub u32);

/// Value that marks an absent operand
pub const OPERAND_VAL_NULL: u32 = 0;

macro_rules! well_known_props {
    ($($(#[$doc:meta])* $name:ident = $id:literal, $key:literal;)*) => {
        impl PropId {
            $($(#[$doc])* pub const $name: Self = Self($id);)*

            /// Look up a well-known property by its key
            #[must_use]
            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $($key => Some(Self::$name),)*
                    _ => None,
                }
            }

            /// Key of a well-known property
            #[must_use]
            pub const fn key(self) -> Option<&'static str> {
                match self.0 {
                    $($id => Some($key),)*
                    _ => None,
                }
            }
        }
    };
}

well_known_props! {
    /// Destination/operation type
    TYPE = 1, "type";
    /// Source type
    SOURCE_TYPE = 2, "stype";
    /// Rounding modifier
    ROUND = 3, "round";
    /// Flush-to-zero modifier
    FTZ = 4, "ftz";
    /// Packing control
    PACK = 5, "pack";
    /// Memory segment
    SEGMENT = 6, "segment";
    /// Alignment
    ALIGN = 7, "align";
    /// Const qualifier
    CONST = 8, "const";
    /// Alias equivalence class
    EQUIV_CLASS = 9, "equivclass";
    /// Width modifier
    WIDTH = 10, "width";
    /// Comparison operator
    COMPARE = 11, "compare";
    /// Atomic operation
    ATOMIC_OPERATION = 12, "atomicoperation";
    /// Memory order
    MEMORY_ORDER = 13, "memoryorder";
    /// Memory scope
    MEMORY_SCOPE = 14, "memoryscope";
    /// Operand 0
    OPERAND0 = 20, "operand0";
    /// Operand 1
    OPERAND1 = 21, "operand1";
    /// Operand 2
    OPERAND2 = 22, "operand2";
    /// Operand 3
    OPERAND3 = 23, "operand3";
    /// Operand 4
    OPERAND4 = 24, "operand4";
}

impl PropId {
    /// First id handed out to properties that are not well-known
    pub const FIRST_CUSTOM: u32 = 0x100;
}

impl fmt::Display for PropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key() {
            Some(key) => f.write_str(key),
            None => write!(f, "prop{}", self.0),
        }
    }
}

/// One property of an instruction with its positive and negative candidates.
///
/// Cursors count consumed candidates: 0 means "before the first", so a fresh
/// or reset property has no current value until the first `find_next_*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    id: PropId,
    valid: Vec<u32>,
    all: Vec<u32>,
    pos: usize,
    neg: usize,
}

impl Prop {
    /// Create a property from its valid values and the complete value set
    #[must_use]
    pub const fn new(id: PropId, valid: Vec<u32>, all: Vec<u32>) -> Self {
        Self {
            id,
            valid,
            all,
            pos: 0,
            neg: 0,
        }
    }

    /// Property id
    #[must_use]
    pub const fn id(&self) -> PropId {
        self.id
    }

    /// Values the property may legitimately take
    #[must_use]
    pub fn valid_values(&self) -> &[u32] {
        &self.valid
    }

    /// Every value of the property
    #[must_use]
    pub fn all_values(&self) -> &[u32] {
        &self.all
    }

    /// Advance to the next valid value
    pub fn find_next_positive(&mut self) -> bool {
        if self.pos < self.valid.len() {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Advance to the next value outside the valid list
    pub fn find_next_negative(&mut self) -> bool {
        while self.neg < self.all.len() {
            self.neg += 1;
            if !self.valid.contains(&self.all[self.neg - 1]) {
                return true;
            }
        }
        false
    }

    /// Rewind the positive cursor
    pub fn reset_positive(&mut self) {
        self.pos = 0;
    }

    /// Rewind the negative cursor
    pub fn reset_negative(&mut self) {
        self.neg = 0;
    }

    /// Current valid value, if the cursor is on one
    #[must_use]
    pub fn current_positive(&self) -> Option<u32> {
        self.pos.checked_sub(1).and_then(|i| self.valid.get(i)).copied()
    }

    /// Current invalid value, if the cursor is on one
    #[must_use]
    pub fn current_negative(&self) -> Option<u32> {
        self.neg.checked_sub(1).and_then(|i| self.all.get(i)).copied()
    }

    pub(crate) const fn cursors(&self) -> (usize, usize) {
        (self.pos, self.neg)
    }

    pub(crate) fn set_cursors(&mut self, pos: usize, neg: usize) -> bool {
        if pos > self.valid.len() || neg > self.all.len() {
            return false;
        }
        self.pos = pos;
        self.neg = neg;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop() -> Prop {
        Prop::new(PropId::TYPE, vec![1, 3], vec![1, 2, 3, 4])
    }

    #[test]
    fn test_positive_iteration() {
        let mut p = prop();
        assert_eq!(p.current_positive(), None);
        assert!(p.find_next_positive());
        assert_eq!(p.current_positive(), Some(1));
        assert!(p.find_next_positive());
        assert_eq!(p.current_positive(), Some(3));
        assert!(!p.find_next_positive());
        assert!(!p.find_next_positive());
        p.reset_positive();
        assert!(p.find_next_positive());
        assert_eq!(p.current_positive(), Some(1));
    }

    #[test]
    fn test_negative_skips_valid_values() {
        let mut p = prop();
        let mut seen = Vec::new();
        while p.find_next_negative() {
            seen.extend(p.current_negative());
        }
        assert_eq!(seen, vec![2, 4]);
    }

    #[test]
    fn test_no_negative_when_all_equals_valid() {
        let mut p = Prop::new(PropId::FTZ, vec![0, 1], vec![0, 1]);
        assert!(!p.find_next_negative());
    }

    #[test]
    fn test_cursor_restore_bounds() {
        let mut p = prop();
        assert!(p.set_cursors(2, 4));
        assert_eq!(p.current_positive(), Some(3));
        assert!(!p.set_cursors(3, 0));
    }

    #[test]
    fn test_well_known_keys() {
        assert_eq!(PropId::from_key("stype"), Some(PropId::SOURCE_TYPE));
        assert_eq!(PropId::EQUIV_CLASS.key(), Some("equivclass"));
        assert_eq!(PropId(0x123).to_string(), "prop291");
        assert_eq!(PropId::from_key("bogus"), None);
    }
}
