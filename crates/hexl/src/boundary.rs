//! Integer boundary tables and rounding-mode test data.
//!
//! Float boundaries are the nearest representable values that never lie
//! outside the true integer range, so conversion tests built on them never
//! straddle a boundary by accident.

use crate::types::{AluModifier, IntRounding, ValueType};
use half::f16;
use std::fmt;
use std::ops::{Add, Sub};

/// Number of rounding test values produced for an integer destination
pub const ROUNDING_TESTS_NUM: usize = 12;

/// Exact integer minimum (`low`) or maximum of `ty`, as two's complement bits.
///
/// Non-integer types trip a debug assertion and yield 0.
#[must_use]
pub fn int_boundary(ty: ValueType, low: bool) -> u64 {
    match (ty, low) {
        (ValueType::S8, true) => i64::from(i8::MIN) as u64,
        (ValueType::S8, false) => i8::MAX as u64,
        (ValueType::S16, true) => i64::from(i16::MIN) as u64,
        (ValueType::S16, false) => i16::MAX as u64,
        (ValueType::S32, true) => i64::from(i32::MIN) as u64,
        (ValueType::S32, false) => i32::MAX as u64,
        (ValueType::S64, true) => i64::MIN as u64,
        (ValueType::S64, false) => i64::MAX as u64,
        (ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64, true) => 0,
        (ValueType::U8, false) => u64::from(u8::MAX),
        (ValueType::U16, false) => u64::from(u16::MAX),
        (ValueType::U32, false) => u64::from(u32::MAX),
        (ValueType::U64, false) => u64::MAX,
        (ValueType::F16 | ValueType::F32 | ValueType::F64, _) => {
            debug_assert!(false, "no integer boundary for {ty}");
            0
        }
    }
}

const MAX_U32_F32: u32 = 0x4f7f_ffff;
const MAX_U64_F32: u32 = 0x5f7f_ffff;
const MAX_S32_F32: u32 = 0x4eff_ffff;
const MAX_S64_F32: u32 = 0x5eff_ffff;
const MIN_S32_F32: u32 = 0xcf00_0000;
const MIN_S64_F32: u32 = 0xdf00_0000;

const MAX_U64_F64: u64 = 0x43ef_ffff_ffff_ffff;
const MAX_S64_F64: u64 = 0x43df_ffff_ffff_ffff;
const MIN_S64_F64: u64 = 0xc3e0_0000_0000_0000;

const F16_MAX: f32 = 65504.0;

/// Boundary of integer type `ty` as an `f16`
#[must_use]
pub fn type_boundary_f16(ty: ValueType, low: bool) -> f16 {
    let value = match (ty, low) {
        (ValueType::S8, true) => -128.0,
        (ValueType::S8, false) => 127.0,
        (ValueType::S16, true) => -32768.0,
        (ValueType::S16, false) => 32767.0,
        (ValueType::S32 | ValueType::S64, true) => -F16_MAX,
        (ValueType::S32 | ValueType::S64, false) => F16_MAX,
        (ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64, true) => 0.0,
        (ValueType::U8, false) => 255.0,
        (ValueType::U16 | ValueType::U32 | ValueType::U64, false) => F16_MAX,
        (ValueType::F16 | ValueType::F32 | ValueType::F64, _) => {
            debug_assert!(false, "no float boundary for {ty}");
            0.0
        }
    };
    f16::from_f32(value)
}

/// Boundary of integer type `ty` as an `f32`
#[must_use]
pub fn type_boundary_f32(ty: ValueType, low: bool) -> f32 {
    match (ty, low) {
        (ValueType::S8, true) => -128.0,
        (ValueType::S8, false) => 127.0,
        (ValueType::S16, true) => -32768.0,
        (ValueType::S16, false) => 32767.0,
        (ValueType::S32, true) => f32::from_bits(MIN_S32_F32),
        (ValueType::S32, false) => f32::from_bits(MAX_S32_F32),
        (ValueType::S64, true) => f32::from_bits(MIN_S64_F32),
        (ValueType::S64, false) => f32::from_bits(MAX_S64_F32),
        (ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64, true) => 0.0,
        (ValueType::U8, false) => 255.0,
        (ValueType::U16, false) => 65535.0,
        (ValueType::U32, false) => f32::from_bits(MAX_U32_F32),
        (ValueType::U64, false) => f32::from_bits(MAX_U64_F32),
        (ValueType::F16 | ValueType::F32 | ValueType::F64, _) => {
            debug_assert!(false, "no float boundary for {ty}");
            0.0
        }
    }
}

/// Boundary of integer type `ty` as an `f64`
#[must_use]
pub fn type_boundary_f64(ty: ValueType, low: bool) -> f64 {
    match (ty, low) {
        (ValueType::S8, true) => -128.0,
        (ValueType::S8, false) => 127.0,
        (ValueType::S16, true) => -32768.0,
        (ValueType::S16, false) => 32767.0,
        (ValueType::S32, true) => -2_147_483_648.0,
        (ValueType::S32, false) => 2_147_483_647.0,
        (ValueType::S64, true) => f64::from_bits(MIN_S64_F64),
        (ValueType::S64, false) => f64::from_bits(MAX_S64_F64),
        (ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64, true) => 0.0,
        (ValueType::U8, false) => 255.0,
        (ValueType::U16, false) => 65535.0,
        (ValueType::U32, false) => 4_294_967_295.0,
        (ValueType::U64, false) => f64::from_bits(MAX_U64_F64),
        (ValueType::F16 | ValueType::F32 | ValueType::F64, _) => {
            debug_assert!(false, "no float boundary for {ty}");
            0.0
        }
    }
}

/// Float formats rounding test data can be produced in
pub trait TestFloat: Copy + PartialOrd + Add<Output = Self> + Sub<Output = Self> + fmt::Debug {
    /// Convert from `f64`, rounding to nearest
    fn from_f64(value: f64) -> Self;

    /// Boundary of integer type `ty` in this format
    fn type_boundary(ty: ValueType, low: bool) -> Self;

    /// Neighbouring representable value toward +infinity
    #[must_use]
    fn next_up(self) -> Self;

    /// Neighbouring representable value toward -infinity
    #[must_use]
    fn next_down(self) -> Self;
}

/// Step an IEEE bit pattern one ulp. `sign` is the sign-bit mask.
const fn step_bits(bits: u64, sign: u64, up: bool) -> u64 {
    let magnitude = bits & !sign;
    if magnitude == 0 {
        return if up { 1 } else { sign | 1 };
    }
    let negative = bits & sign != 0;
    if negative == up {
        bits - 1
    } else {
        bits + 1
    }
}

macro_rules! impl_test_float {
    ($float:ty, $bits:ty, $boundary:path, $from_f64:path) => {
        impl TestFloat for $float {
            fn from_f64(value: f64) -> Self {
                $from_f64(value)
            }

            fn type_boundary(ty: ValueType, low: bool) -> Self {
                $boundary(ty, low)
            }

            fn next_up(self) -> Self {
                step(self, true)
            }

            fn next_down(self) -> Self {
                step(self, false)
            }
        }

        impl Stepped for $float {
            const SIGN: u64 = 1 << (<$bits>::BITS - 1);

            fn bits(self) -> u64 {
                u64::from(self.to_bits())
            }

            fn from_raw(bits: u64) -> Self {
                <$float>::from_bits(bits as $bits)
            }

            fn is_nan(self) -> bool {
                <$float>::is_nan(self)
            }

            fn is_infinite(self) -> bool {
                <$float>::is_infinite(self)
            }
        }
    };
}

trait Stepped: Copy {
    const SIGN: u64;
    fn bits(self) -> u64;
    fn from_raw(bits: u64) -> Self;
    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
}

fn step<T: Stepped>(value: T, up: bool) -> T {
    if value.is_nan() {
        return value;
    }
    let bits = value.bits();
    let negative = bits & T::SIGN != 0;
    // Stepping outward from an infinity stays put
    if value.is_infinite() && negative != up {
        return value;
    }
    T::from_raw(step_bits(bits, T::SIGN, up))
}

#[allow(clippy::cast_possible_truncation)]
const fn f32_from_f64(value: f64) -> f32 {
    value as f32
}

const fn f64_from_f64(value: f64) -> f64 {
    value
}

impl_test_float!(f16, u16, type_boundary_f16, f16::from_f64);
impl_test_float!(f32, u32, type_boundary_f32, f32_from_f64);
impl_test_float!(f64, u64, type_boundary_f64, f64_from_f64);

/// Number of rounding test values for a destination type: 12 for integers, 1 otherwise
#[must_use]
pub const fn rounding_tests_num(dst_type: ValueType) -> usize {
    if dst_type.is_int() {
        ROUNDING_TESTS_NUM
    } else {
        1
    }
}

/// Source values bracketing both boundaries of integer type `dst_type` for a
/// conversion performed with `alu`.
///
/// The boundaries are pre-shifted by the rounding mode (+0.5 for nearest,
/// +1 for down, +1 on positive boundaries for zero, none for up) and then
/// bracketed by one unit and one ulp on each side. One ulp is taken toward
/// +/- infinity so the sequence is ordered whenever the format can resolve
/// the unit steps. Non-integer destinations get a single zero.
#[must_use]
pub fn rounding_tests_data<T: TestFloat>(dst_type: ValueType, alu: AluModifier) -> Vec<T> {
    let zero = T::from_f64(0.0);
    if rounding_tests_num(dst_type) == 1 {
        return vec![zero];
    }

    let one = T::from_f64(1.0);
    let half = T::from_f64(0.5);
    let mut lo = T::type_boundary(dst_type, true);
    let mut hi = T::type_boundary(dst_type, false);

    match alu.rounding.int_rounding() {
        Some(IntRounding::Near) => {
            lo = lo + half;
            hi = hi + half;
        }
        Some(IntRounding::Zero) => {
            if lo > zero {
                lo = lo + one;
            }
            if hi > zero {
                hi = hi + one;
            }
        }
        Some(IntRounding::Down) => {
            lo = lo + one;
            hi = hi + one;
        }
        Some(IntRounding::Up) => {}
        None => debug_assert!(false, "{} is not an integer rounding mode", alu.rounding),
    }

    vec![
        lo - one,
        (lo - one).next_up(),
        lo.next_down(),
        lo,
        lo.next_up(),
        lo + one,
        hi - one,
        hi.next_down(),
        hi,
        hi.next_up(),
        (hi + one).next_down(),
        hi + one,
    ]
}

/// Rounding test data in half precision
#[must_use]
pub fn f16_rounding_tests_data(dst_type: ValueType, alu: AluModifier) -> Vec<f16> {
    rounding_tests_data(dst_type, alu)
}

/// Rounding test data in single precision
#[must_use]
pub fn f32_rounding_tests_data(dst_type: ValueType, alu: AluModifier) -> Vec<f32> {
    rounding_tests_data(dst_type, alu)
}

/// Rounding test data in double precision
#[must_use]
pub fn f64_rounding_tests_data(dst_type: ValueType, alu: AluModifier) -> Vec<f64> {
    rounding_tests_data(dst_type, alu)
}
