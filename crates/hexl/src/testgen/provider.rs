//! Positive and negative test search over an instruction's properties.
//!
//! Primary properties are searched exhaustively with backtracking, validating
//! each property as soon as it is assigned so that most invalid combinations
//! are cut off early. Every primary combination must admit at least one
//! assignment of the secondary properties; the secondaries are then varied
//! either independently ([`SearchMode::Optimal`]) or as a full cross-product
//! ([`SearchMode::Exhaustive`]).
//!
//! Negative tests are single-property mutants of the current positive sample.

use super::dump::dump_sample;
use super::inst_desc::InstDesc;
use super::inst_set::InstructionSet;
use super::prop::{Prop, PropId};
use super::sample::{InstFormat, Sample};
use super::state::{PropCursor, SearchState};
use crate::result::{HexlError, HexlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Modifier properties that the base format of a Mod instruction lacks
pub const BASIC_REMOVED_PROPS: [PropId; 3] = [PropId::FTZ, PropId::ROUND, PropId::PACK];

/// How secondary properties are enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Drive each secondary property through its values on its own
    #[default]
    Optimal,
    /// Full cross-product of secondary values
    Exhaustive,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => f.write_str("optimal"),
            Self::Exhaustive => f.write_str("exhaustive"),
        }
    }
}

/// Search engine for one (opcode, format variant) pair
#[derive(Debug)]
pub struct TestGen<'a, S: InstructionSet + ?Sized> {
    set: &'a S,
    desc: InstDesc,
    mode: SearchMode,
    basic: bool,
    implicit: Vec<PropId>,
    positive: Sample,
    negative: Sample,
    primary_current: usize,
    primary_pos: usize,
    secondary_pos: usize,
}

impl<'a, S: InstructionSet + ?Sized> TestGen<'a, S> {
    /// Create a search for `opcode`.
    ///
    /// With `basic`, the base-format variant of a Mod instruction is searched:
    /// the ftz, round and pack properties are removed from the search and their
    /// implicit defaults are re-validated against every primary combination.
    ///
    /// # Errors
    ///
    /// Returns [`HexlError::UnknownOpcode`] for an opcode the set does not
    /// describe and [`HexlError::NoBaseVariant`] when `basic` is requested for
    /// an opcode whose format is not Mod.
    pub fn create(set: &'a S, opcode: &str, basic: bool, mode: SearchMode) -> HexlResult<Self> {
        let mut desc = InstDesc::new(set, opcode)?;
        if basic && desc.format() != InstFormat::Mod {
            return Err(HexlError::NoBaseVariant {
                opcode: opcode.to_string(),
                format: desc.format().to_string(),
            });
        }

        let format = if basic {
            InstFormat::Basic
        } else {
            desc.format()
        };
        let mut positive = Sample::new(opcode, format);

        let mut implicit = Vec::new();
        if basic {
            desc.set_format(InstFormat::Basic);
            for prop in BASIC_REMOVED_PROPS {
                if desc.remove_prop(prop) {
                    if let Some(value) = set.implicit_value(opcode, prop) {
                        positive.set(prop, value);
                        implicit.push(prop);
                    }
                }
            }
        }

        debug!(
            opcode,
            basic,
            %mode,
            primary = desc.primary().len(),
            secondary = desc.secondary().len(),
            "created test search"
        );

        Ok(Self {
            set,
            desc,
            mode,
            basic,
            implicit,
            negative: positive.clone(),
            positive,
            primary_current: 0,
            primary_pos: 0,
            secondary_pos: 0,
        })
    }

    /// Property description being searched
    #[must_use]
    pub const fn desc(&self) -> &InstDesc {
        &self.desc
    }

    /// Secondary search mode
    #[must_use]
    pub const fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Whether this is the base-format variant of a Mod instruction
    #[must_use]
    pub const fn is_basic_variant(&self) -> bool {
        self.basic
    }

    /// Current valid combination
    #[must_use]
    pub const fn positive_sample(&self) -> &Sample {
        &self.positive
    }

    /// Last negative mutant produced
    #[must_use]
    pub const fn negative_sample(&self) -> &Sample {
        &self.negative
    }

    /// Render the current positive sample
    #[must_use]
    pub fn dump(&self) -> String {
        dump_sample(self.set, &self.positive)
    }

    // ---------------------------------------------------------------------
    // Positive search
    // ---------------------------------------------------------------------

    /// Advance to the next valid combination of primary properties and give
    /// every secondary property its first valid value.
    ///
    /// `start` begins a new pass. Returns false when the primary space is
    /// exhausted.
    pub fn next_primary_set(&mut self, start: bool) -> bool {
        let mut start = start;
        loop {
            if !self.set_all_primary(start) {
                debug!(opcode = self.desc.opcode(), "primary combinations exhausted");
                return false;
            }
            if self.set_all_secondary() {
                break;
            }
            debug!(
                opcode = self.desc.opcode(),
                "primary combination admits no secondary completion"
            );
            // Retry continues from the rejected combination
            start = false;
        }
        self.secondary_pos = 0;
        trace!(opcode = self.desc.opcode(), "primary set found");
        true
    }

    /// Advance to the next combination of secondary properties for the
    /// current primary set, using the configured mode
    pub fn next_secondary_set(&mut self) -> bool {
        match self.mode {
            SearchMode::Optimal => self.next_secondary_set_optimal(),
            SearchMode::Exhaustive => self.next_secondary_set_exhaustive(),
        }
    }

    /// Vary one secondary property at a time, restoring each to its first
    /// valid value once its values are used up
    pub fn next_secondary_set_optimal(&mut self) -> bool {
        let count = self.desc.secondary().len();
        while self.secondary_pos < count {
            let idx = self.secondary_pos;
            if self.next_positive_secondary(idx) {
                return true;
            }
            self.desc.secondary_mut()[idx].reset_positive();
            let found = self.next_positive_secondary(idx);
            debug_assert!(found, "secondary property lost its first valid value");
            self.secondary_pos += 1;
        }
        false
    }

    /// Step the full cross-product of secondary values
    pub fn next_secondary_set_exhaustive(&mut self) -> bool {
        let count = self.desc.secondary().len();
        if count == 0 {
            return false;
        }
        let mut idx = count - 1;
        let mut found = self.next_positive_secondary(idx);
        loop {
            while found && idx + 1 < count {
                idx += 1;
                self.desc.secondary_mut()[idx].reset_positive();
                found = self.next_positive_secondary(idx);
            }
            if found {
                return true;
            }
            while !found && idx > 0 {
                idx -= 1;
                found = self.next_positive_secondary(idx);
            }
            if !found {
                // The failed candidates are left in the sample; put back the first completion
                let restored = self.set_all_secondary();
                debug_assert!(restored, "secondary completion lost for the current primary set");
                return false;
            }
        }
    }

    fn set_all_primary(&mut self, start: bool) -> bool {
        let mut start = start;
        if start {
            if let Some(first) = self.desc.primary_mut().first_mut() {
                first.reset_positive();
            }
        }
        // Base-format variants drop combinations whose implicit modifiers are invalid
        while self.set_explicit_primary(start) {
            if !self.basic || self.validate_basic_props() {
                return true;
            }
            start = false;
        }
        false
    }

    fn set_explicit_primary(&mut self, start: bool) -> bool {
        let count = self.desc.primary().len();
        if count == 0 {
            return start;
        }
        let mut idx = if start { 0 } else { count - 1 };
        let mut found = self.next_positive_primary(idx);
        loop {
            // Forward: fill every later property from its first candidate
            while found && idx + 1 < count {
                idx += 1;
                self.desc.primary_mut()[idx].reset_positive();
                found = self.next_positive_primary(idx);
            }
            if found {
                return true;
            }
            // Backward: advance the nearest earlier property that has candidates left
            while !found && idx > 0 {
                idx -= 1;
                found = self.next_positive_primary(idx);
            }
            if !found {
                return false;
            }
        }
    }

    fn set_all_secondary(&mut self) -> bool {
        for idx in 0..self.desc.secondary().len() {
            self.desc.secondary_mut()[idx].reset_positive();
            if !self.next_positive_secondary(idx) {
                return false;
            }
        }
        true
    }

    fn validate_basic_props(&self) -> bool {
        debug_assert!(self.basic);
        self.implicit
            .iter()
            .all(|prop| self.set.is_valid_prop(&self.positive, *prop))
    }

    fn next_positive_primary(&mut self, idx: usize) -> bool {
        while self.desc.primary_mut()[idx].find_next_positive() {
            if self.is_valid_primary(idx) {
                return true;
            }
        }
        false
    }

    fn next_positive_secondary(&mut self, idx: usize) -> bool {
        while self.desc.secondary_mut()[idx].find_next_positive() {
            if self.is_valid_secondary(idx) {
                return true;
            }
        }
        false
    }

    fn is_valid_primary(&mut self, idx: usize) -> bool {
        debug_assert!(
            idx <= self.primary_current + 1,
            "primary property {idx} validated out of order"
        );
        self.primary_current = idx;

        let primary = self.desc.primary();
        let prop = primary[idx].id();
        let Some(value) = primary[idx].current_positive() else {
            return false;
        };
        // Later primaries still hold values from an earlier combination
        for later in &primary[idx + 1..] {
            self.positive.unset(later.id());
        }
        self.positive.set(prop, value);
        self.set.is_valid_prop(&self.positive, prop)
    }

    fn is_valid_secondary(&mut self, idx: usize) -> bool {
        let p = &self.desc.secondary()[idx];
        let prop = p.id();
        let Some(value) = p.current_positive() else {
            return false;
        };
        self.positive.set(prop, value);
        self.set.is_valid_prop(&self.positive, prop)
    }

    // ---------------------------------------------------------------------
    // Negative search
    // ---------------------------------------------------------------------

    /// Rewind every negative cursor; call once per positive sample before
    /// sweeping with [`next_negative_set`](Self::next_negative_set)
    pub fn reset_negative_set(&mut self) {
        for p in self.desc.primary_mut() {
            p.reset_negative();
        }
        for p in self.desc.secondary_mut() {
            p.reset_negative();
        }
        self.primary_pos = 0;
        self.secondary_pos = 0;
    }

    /// Next (property, invalid value) pair. The mutant is left in
    /// [`negative_sample`](Self::negative_sample). `None` ends the sweep.
    pub fn next_negative_set(&mut self) -> Option<(PropId, u32)> {
        while self.primary_pos < self.desc.primary().len() {
            let idx = self.primary_pos;
            if self.next_negative_primary(idx) {
                let p = &self.desc.primary()[idx];
                trace!(prop = %p.id(), "negative primary value");
                return p.current_negative().map(|v| (p.id(), v));
            }
            self.primary_pos += 1;
        }
        while self.secondary_pos < self.desc.secondary().len() {
            let idx = self.secondary_pos;
            if self.next_negative_secondary(idx) {
                let p = &self.desc.secondary()[idx];
                trace!(prop = %p.id(), "negative secondary value");
                return p.current_negative().map(|v| (p.id(), v));
            }
            self.secondary_pos += 1;
        }
        None
    }

    fn next_negative_primary(&mut self, idx: usize) -> bool {
        while self.desc.primary_mut()[idx].find_next_negative() {
            if self.is_invalid_primary(idx) {
                return true;
            }
        }
        false
    }

    fn next_negative_secondary(&mut self, idx: usize) -> bool {
        while self.desc.secondary_mut()[idx].find_next_negative() {
            if self.is_invalid_secondary(idx) {
                return true;
            }
        }
        false
    }

    fn is_invalid_primary(&mut self, idx: usize) -> bool {
        debug_assert!(idx <= self.primary_current);
        debug_assert!(self.set.is_valid_inst(&self.positive));

        let p = &self.desc.primary()[idx];
        let Some(value) = p.current_negative() else {
            return false;
        };
        self.negative.copy_from(&self.positive);
        self.negative.set(p.id(), value);
        // Primary mutants are checked with the primary-only validator
        !self.set.validate_primary_props(&self.negative)
    }

    fn is_invalid_secondary(&mut self, idx: usize) -> bool {
        debug_assert!(self.set.is_valid_inst(&self.positive));

        let p = &self.desc.secondary()[idx];
        let prop = p.id();
        let Some(value) = p.current_negative() else {
            return false;
        };
        self.negative.copy_from(&self.positive);
        self.negative.set(prop, value);
        !self.set.is_valid_prop(&self.negative, prop)
    }

    // ---------------------------------------------------------------------
    // Checkpointing
    // ---------------------------------------------------------------------

    /// Snapshot of the search position
    #[must_use]
    pub fn checkpoint(&self) -> SearchState {
        let cursors = |props: &[Prop]| -> Vec<PropCursor> {
            props
                .iter()
                .map(|p| {
                    let (positive, negative) = p.cursors();
                    PropCursor {
                        prop: p.id(),
                        positive,
                        negative,
                    }
                })
                .collect()
        };
        SearchState {
            opcode: self.desc.opcode().to_string(),
            basic: self.basic,
            mode: self.mode,
            primary_current: self.primary_current,
            primary_pos: self.primary_pos,
            secondary_pos: self.secondary_pos,
            primary: cursors(self.desc.primary()),
            secondary: cursors(self.desc.secondary()),
        }
    }

    /// Resume from a snapshot taken with [`checkpoint`](Self::checkpoint).
    ///
    /// The positive sample is rebuilt from the restored cursors.
    ///
    /// # Errors
    ///
    /// Returns [`HexlError::StateMismatch`] if the snapshot was taken for a
    /// different opcode, variant or property layout.
    pub fn restore(&mut self, state: &SearchState) -> HexlResult<()> {
        let mismatch = |message: String| HexlError::StateMismatch { message };

        if state.opcode != self.desc.opcode() || state.basic != self.basic {
            return Err(mismatch(format!(
                "state is for {}{}, search is for {}{}",
                state.opcode,
                if state.basic { " (basic)" } else { "" },
                self.desc.opcode(),
                if self.basic { " (basic)" } else { "" },
            )));
        }

        let layout_matches = |props: &[Prop], cursors: &[PropCursor]| {
            props.len() == cursors.len()
                && props.iter().zip(cursors).all(|(p, c)| p.id() == c.prop)
        };
        if !layout_matches(self.desc.primary(), &state.primary)
            || !layout_matches(self.desc.secondary(), &state.secondary)
        {
            return Err(mismatch("property layout differs".to_string()));
        }

        for (p, c) in self.desc.primary_mut().iter_mut().zip(&state.primary) {
            if !p.set_cursors(c.positive, c.negative) {
                return Err(mismatch(format!("cursor out of range for {}", c.prop)));
            }
        }
        for (p, c) in self.desc.secondary_mut().iter_mut().zip(&state.secondary) {
            if !p.set_cursors(c.positive, c.negative) {
                return Err(mismatch(format!("cursor out of range for {}", c.prop)));
            }
        }

        self.mode = state.mode;
        self.primary_current = state.primary_current;
        self.primary_pos = state.primary_pos;
        self.secondary_pos = state.secondary_pos;

        for p in self.desc.primary().iter().chain(self.desc.secondary()) {
            match p.current_positive() {
                Some(v) => self.positive.set(p.id(), v),
                None => self.positive.unset(p.id()),
            }
        }
        debug!(opcode = self.desc.opcode(), "search state restored");
        Ok(())
    }
}
