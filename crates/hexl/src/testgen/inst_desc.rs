//! Property set of one instruction, split into primary and secondary lists.

use super::inst_set::InstructionSet;
use super::prop::{Prop, PropId, OPERAND_VAL_NULL};
use super::sample::InstFormat;
use crate::result::{HexlError, HexlResult};

/// Properties of one opcode as supplied by the instruction set.
///
/// The order of the primary list is fixed at construction: a primary property
/// may depend on those before it, never on those after.
#[derive(Debug, Clone)]
pub struct InstDesc {
    opcode: String,
    format: InstFormat,
    primary: Vec<Prop>,
    secondary: Vec<Prop>,
}

impl InstDesc {
    /// Build the description of `opcode`
    ///
    /// # Errors
    ///
    /// Returns [`HexlError::UnknownOpcode`] if the set does not describe the
    /// opcode, or [`HexlError::UnknownProperty`] if a declared property has
    /// no values.
    pub fn new<S: InstructionSet + ?Sized>(set: &S, opcode: &str) -> HexlResult<Self> {
        let unknown = || HexlError::UnknownOpcode {
            opcode: opcode.to_string(),
        };
        let format = set.format(opcode).ok_or_else(unknown)?;
        let (primary_ids, secondary_ids) = set.props(opcode).ok_or_else(unknown)?;

        let make = |id: PropId| -> HexlResult<Prop> {
            let valid = set.valid_values(opcode, id);
            let mut all = set.all_values(opcode, id);
            if valid.is_empty() || all.is_empty() {
                return Err(HexlError::UnknownProperty {
                    opcode: opcode.to_string(),
                    prop: id.0,
                });
            }
            // A property that only admits "no operand" gets no negative candidates
            if valid == [OPERAND_VAL_NULL] {
                all.clone_from(&valid);
            }
            Ok(Prop::new(id, valid, all))
        };

        Ok(Self {
            opcode: opcode.to_string(),
            format,
            primary: primary_ids.into_iter().map(make).collect::<HexlResult<_>>()?,
            secondary: secondary_ids.into_iter().map(make).collect::<HexlResult<_>>()?,
        })
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

    pub(crate) fn set_format(&mut self, format: InstFormat) {
        self.format = format;
    }

    /// Primary properties in dependency order
    #[must_use]
    pub fn primary(&self) -> &[Prop] {
        &self.primary
    }

    /// Secondary properties
    #[must_use]
    pub fn secondary(&self) -> &[Prop] {
        &self.secondary
    }

    pub(crate) fn primary_mut(&mut self) -> &mut [Prop] {
        &mut self.primary
    }

    pub(crate) fn secondary_mut(&mut self) -> &mut [Prop] {
        &mut self.secondary
    }

    /// Remove `prop`, looking in the primary list first. Returns whether it was present.
    pub fn remove_prop(&mut self, prop: PropId) -> bool {
        for list in [&mut self.primary, &mut self.secondary] {
            if let Some(i) = list.iter().position(|p| p.id() == prop) {
                list.remove(i);
                return true;
            }
        }
        false
    }
}
