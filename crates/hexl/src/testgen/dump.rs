//! Text rendering of generated instructions.

use super::inst_set::InstructionSet;
use super::prop::PropId;
use super::sample::Sample;
use std::fmt::Write;

const SEPARATOR: &str = "==========================================";
const NAME_WIDTH: usize = 10;

fn push_line(out: &mut String, name: &str, value: &str) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "{name:<width$}= {value}", width = NAME_WIDTH);
}

/// Render the properties and operands of `sample`, one per line.
///
/// Value names come from `set`; a value with no name prints as `(value)`,
/// except equivalence classes, which are plain numbers.
#[must_use]
pub fn dump_sample<S: InstructionSet + ?Sized>(set: &S, sample: &Sample) -> String {
    let mut out = String::new();
    out.push_str(SEPARATOR);
    out.push('\n');

    for (prop, value) in sample.props() {
        let rendered = if prop == PropId::EQUIV_CLASS {
            value.to_string()
        } else {
            set.value_name(prop, value)
                .unwrap_or_else(|| format!("({value})"))
        };
        push_line(&mut out, &set.prop_name(prop), &rendered);
    }

    for (i, operand) in sample.operands().iter().enumerate() {
        push_line(&mut out, &format!("operand {i}"), &operand.to_string());
    }

    out.push('\n');
    out
}
