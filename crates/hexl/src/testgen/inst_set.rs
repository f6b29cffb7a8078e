//! Boundary between the search engine and the instruction-set description.

use super::prop::PropId;
use super::sample::{InstFormat, Sample};

/// Description and validation of an instruction set.
///
/// The search engine treats implementations as black boxes: it only asks for
/// property partitions, candidate values and validity verdicts on samples.
pub trait InstructionSet {
    /// Opcodes described by this set
    fn opcodes(&self) -> Vec<String>;

    /// Encoding format of `opcode`
    fn format(&self, opcode: &str) -> Option<InstFormat>;

    /// Primary properties (ordered, mutually constraining) and secondary
    /// properties (dependent on primaries only) of `opcode`
    fn props(&self, opcode: &str) -> Option<(Vec<PropId>, Vec<PropId>)>;

    /// Values `prop` may take for `opcode`
    fn valid_values(&self, opcode: &str, prop: PropId) -> Vec<u32>;

    /// Every value of `prop`
    fn all_values(&self, opcode: &str, prop: PropId) -> Vec<u32>;

    /// Whether the value of `prop` in `sample` is valid given the other
    /// properties assigned so far
    fn is_valid_prop(&self, sample: &Sample, prop: PropId) -> bool;

    /// Whether the primary properties of `sample` are consistent on their own
    fn validate_primary_props(&self, sample: &Sample) -> bool;

    /// Whether `sample` is a valid instruction
    fn is_valid_inst(&self, sample: &Sample) -> bool;

    /// Default value a base-format variant implies for a removed modifier
    fn implicit_value(&self, opcode: &str, prop: PropId) -> Option<u32>;

    /// Display name of `prop`
    fn prop_name(&self, prop: PropId) -> String {
        prop.to_string()
    }

    /// Display name of `value` of `prop`
    fn value_name(&self, prop: PropId, value: u32) -> Option<String>;
}
