//! Rounding command handler

use crate::commands::{FloatArg, RoundingArgs};
use crate::error::{CliError, CliResult};
use hexl::boundary::{
    f16_rounding_tests_data, f32_rounding_tests_data, f64_rounding_tests_data, rounding_tests_num,
};
use hexl::{AluModifier, Rounding, ValueType};

/// Rendered source values: decimal and bit pattern
pub fn rounding_values(ty: ValueType, rounding: Rounding, float: FloatArg) -> CliResult<Vec<String>> {
    if ty.is_int() && rounding.int_rounding().is_none() {
        return Err(CliError::invalid_argument(format!(
            "{rounding} is not an integer rounding mode"
        )));
    }
    let alu = AluModifier::new(rounding);
    let lines = match float {
        FloatArg::F16 => f16_rounding_tests_data(ty, alu)
            .into_iter()
            .map(|v| format!("{v:<24} 0x{:04x}", v.to_bits()))
            .collect(),
        FloatArg::F32 => f32_rounding_tests_data(ty, alu)
            .into_iter()
            .map(|v| format!("{v:<24} 0x{:08x}", v.to_bits()))
            .collect(),
        FloatArg::F64 => f64_rounding_tests_data(ty, alu)
            .into_iter()
            .map(|v| format!("{v:<24} 0x{:016x}", v.to_bits()))
            .collect(),
    };
    Ok(lines)
}

/// Parse the arguments and render the numbered vector
pub fn execute_rounding(args: &RoundingArgs) -> CliResult<String> {
    let ty: ValueType = args.ty.parse()?;
    let rounding: Rounding = args.rounding.parse()?;
    let values = rounding_values(ty, rounding, args.float)?;
    debug_assert_eq!(values.len(), rounding_tests_num(ty));

    let mut out = String::new();
    for (i, line) in values.iter().enumerate() {
        out.push_str(&format!("{i:>2}  {line}\n"));
    }
    Ok(out)
}
