//! Host execution of an atomicity test.

use super::behavior::{AtomicBehavior, Lane};
use super::test::{AtomicTest, TestKind, FLAG_DST, FLAG_MEM, FLAG_NONE, FLAG_VLD_DST, FLAG_VLD_MEM};
use super::{AtomicOp, AtomicType};
use std::fmt::Write;
use tracing::debug;

/// Apply `op` to a memory value and return the new value.
///
/// Inputs must already be truncated to the width of `ty`. `src1` is only read by `cas`.
#[must_use]
pub fn apply(op: AtomicOp, ty: AtomicType, mem: u64, src0: u64, src1: u64) -> u64 {
    let new = match op {
        AtomicOp::Add => mem.wrapping_add(src0),
        AtomicOp::Sub => mem.wrapping_sub(src0),
        AtomicOp::And => mem & src0,
        AtomicOp::Or => mem | src0,
        AtomicOp::Xor => mem ^ src0,
        AtomicOp::Exch | AtomicOp::St => src0,
        AtomicOp::Ld => mem,
        AtomicOp::Cas => {
            if mem == src0 {
                src1
            } else {
                mem
            }
        }
        AtomicOp::Max => {
            if greater(ty, src0, mem) {
                src0
            } else {
                mem
            }
        }
        AtomicOp::Min => {
            if greater(ty, mem, src0) {
                src0
            } else {
                mem
            }
        }
        AtomicOp::Wrapinc => {
            if mem >= src0 {
                0
            } else {
                mem + 1
            }
        }
        AtomicOp::Wrapdec => {
            if mem == 0 || mem > src0 {
                src0
            } else {
                mem - 1
            }
        }
    };
    new & ty.mask()
}

fn greater(ty: AtomicType, a: u64, b: u64) -> bool {
    if ty.is_signed() {
        to_signed(ty, a) > to_signed(ty, b)
    } else {
        a > b
    }
}

fn to_signed(ty: AtomicType, value: u64) -> i64 {
    if ty.bits() == 32 {
        i64::from(value as u32 as i32)
    } else {
        value as i64
    }
}

/// Raw values seen by each work-item, indexed by flat absolute id
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Trace {
    pub dst: Vec<u64>,
    pub observed: Vec<u64>,
    pub workgroup: Vec<u32>,
    pub final_value: u64,
}

/// Outcome of an emulated test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emulation {
    expected: u32,
    results: Vec<u32>,
    final_value: u64,
}

impl Emulation {
    /// Flags each slot should hold
    #[must_use]
    pub const fn expected(&self) -> u32 {
        self.expected
    }

    /// Result array, one slot per work-item
    #[must_use]
    pub fn results(&self) -> &[u32] {
        &self.results
    }

    /// Raw memory value after the last workgroup
    #[must_use]
    pub const fn final_value(&self) -> u64 {
        self.final_value
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(|&r| r == self.expected)
    }

    /// Slots holding something other than the expected flags
    #[must_use]
    pub fn mismatches(&self) -> Vec<(usize, u32)> {
        self.results
            .iter()
            .enumerate()
            .filter(|&(_, &r)| r != self.expected)
            .map(|(i, &r)| (i, r))
            .collect()
    }

    /// Human readable summary of the first few mismatching slots
    #[must_use]
    pub fn report(&self) -> String {
        const SHOWN: usize = 8;
        let mismatches = self.mismatches();
        if mismatches.is_empty() {
            return format!("all {} slots hold {:#x}", self.results.len(), self.expected);
        }
        let mut out = format!(
            "{} of {} slots differ from {:#x} (final memory {:#x})\n",
            mismatches.len(),
            self.results.len(),
            self.expected,
            self.final_value
        );
        for (slot, got) in mismatches.iter().take(SHOWN) {
            let _ = writeln!(out, "  slot {slot}: got {got:#x}");
        }
        if mismatches.len() > SHOWN {
            let _ = writeln!(out, "  ...");
        }
        out
    }
}

impl AtomicTest {
    /// Run the test on the host.
    ///
    /// Workgroups execute one after another in flat-id order and work-items
    /// within a workgroup in flat-id order. Each work-item observes the memory
    /// value left when its workgroup completes. Returns `None` for `ld`.
    #[must_use]
    pub fn emulate(&self) -> Option<Emulation> {
        let behavior = self.behavior()?;
        let trace = self.execute(behavior);
        let emulation = self.check(behavior, &trace);
        debug!(
            test = %self,
            passed = emulation.passed(),
            final_value = emulation.final_value,
            "Emulated atomic test"
        );
        Some(emulation)
    }

    fn lane(&self, id: u64) -> Lane {
        Lane::new(id, self.test_size(), self.ty().mask())
    }

    fn encode_if(&self, behavior: &AtomicBehavior, value: u64) -> u64 {
        if behavior.encryptable {
            self.encode(value)
        } else {
            value & self.ty().mask()
        }
    }

    pub(crate) fn execute(&self, behavior: &AtomicBehavior) -> Trace {
        let geometry = self.geometry();
        let size = self.test_size() as usize;
        let mut memory = self.encode_if(behavior, (behavior.initial_value)(&self.lane(0)));
        let mut trace = Trace {
            dst: vec![0; size],
            observed: vec![0; size],
            workgroup: vec![0; size],
            final_value: 0,
        };

        for wg in 0..geometry.total_grid_groups() {
            let mut members = Vec::new();
            for point in geometry.workgroup_begin(wg) {
                let id = geometry.workitem_flat_abs_id(point);
                let lane = self.lane(id);
                let src0 = self.encode_if(behavior, (behavior.operand)(&lane));
                let src1 = behavior
                    .operand1
                    .map_or(0, |operand1| self.encode_if(behavior, operand1(&lane)));
                trace.dst[id as usize] = memory;
                memory = apply(self.op(), self.ty(), memory, src0, src1);
                members.push(id as usize);
            }
            for id in members {
                trace.observed[id] = memory;
                trace.workgroup[id] = wg;
            }
        }
        trace.final_value = memory;
        trace
    }

    pub(crate) fn check(&self, behavior: &AtomicBehavior, trace: &Trace) -> Emulation {
        let mut results = vec![FLAG_NONE; trace.dst.len()];
        let mut set_flag = |index: u64, flag: u32| {
            debug_assert!((index as usize) < results.len(), "result index {index} out of range");
            if let Some(slot) = results.get_mut(index as usize) {
                *slot = slot.wrapping_add(flag);
            }
        };

        let agent = self.kind() == TestKind::Agent;
        let last_group = self.groups() - 1;
        let encoded = behavior.encryptable;
        let noret = self.is_noret();

        for (i, (&raw_dst, &raw_mem)) in trace.dst.iter().zip(&trace.observed).enumerate() {
            let id = i as u64;
            let lane = self.lane(id);

            let mut dst = raw_dst;
            let mut mem = raw_mem;
            if encoded {
                if !noret {
                    if self.verify(dst) {
                        set_flag(id, FLAG_VLD_DST);
                    }
                    dst = self.decode(dst);
                }
                if self.verify(mem) {
                    set_flag(id, FLAG_VLD_MEM);
                }
                mem = self.decode(mem);
            }

            if behavior.check_mem() {
                let cond = if agent && trace.workgroup[i] != last_group {
                    behavior.mem.cond_agent
                } else {
                    behavior.mem.cond
                };
                if cond(&lane, mem) {
                    set_flag((behavior.mem.index)(&lane), FLAG_MEM);
                }
            }

            if noret {
                continue;
            }
            if let Some(check) = behavior.dst {
                if (check.cond)(&lane, dst, mem) {
                    set_flag((check.index)(&lane, dst), FLAG_DST);
                }
            }
            if let Some(exch) = behavior.exch {
                let cond = if agent { exch.cond_agent } else { exch.cond };
                if cond(&lane, dst) {
                    set_flag((exch.index)(&lane, mem), FLAG_DST);
                }
            }
        }

        Emulation {
            expected: self.expected_result(),
            results,
            final_value: trace.final_value,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::atomic::{MemoryScope, Segment};
    use crate::grid::GridGeometry;
    use proptest::prelude::*;

    fn linear(grid: u32, group: u32) -> GridGeometry {
        GridGeometry::linear(grid, group).unwrap()
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn test_arithmetic_wraps_to_width() {
            assert_eq!(apply(AtomicOp::Add, AtomicType::U32, 0xFFFF_FFFF, 1, 0), 0);
            assert_eq!(apply(AtomicOp::Sub, AtomicType::U64, 0, 1, 0), u64::MAX);
        }

        #[test]
        fn test_signed_max_min() {
            let minus_one = 0xFFFF_FFFF;
            assert_eq!(apply(AtomicOp::Max, AtomicType::S32, minus_one, 1, 0), 1);
            assert_eq!(apply(AtomicOp::Max, AtomicType::U32, minus_one, 1, 0), minus_one);
            assert_eq!(apply(AtomicOp::Min, AtomicType::S32, 1, minus_one, 0), minus_one);
            assert_eq!(apply(AtomicOp::Min, AtomicType::U32, 1, minus_one, 0), 1);
        }

        #[test]
        fn test_cas_swaps_only_on_match() {
            assert_eq!(apply(AtomicOp::Cas, AtomicType::B32, 5, 5, 9), 9);
            assert_eq!(apply(AtomicOp::Cas, AtomicType::B32, 4, 5, 9), 4);
        }

        #[test]
        fn test_wrap_operations() {
            assert_eq!(apply(AtomicOp::Wrapinc, AtomicType::U32, 3, 3, 0), 0);
            assert_eq!(apply(AtomicOp::Wrapinc, AtomicType::U32, 2, 3, 0), 3);
            assert_eq!(apply(AtomicOp::Wrapdec, AtomicType::U32, 0, 3, 0), 3);
            assert_eq!(apply(AtomicOp::Wrapdec, AtomicType::U32, 7, 3, 0), 3);
            assert_eq!(apply(AtomicOp::Wrapdec, AtomicType::U32, 2, 3, 0), 1);
        }

        #[test]
        fn test_ld_leaves_memory() {
            assert_eq!(apply(AtomicOp::Ld, AtomicType::B64, 42, 7, 0), 42);
        }
    }

    mod emulation_tests {
        use super::*;

        #[test]
        fn test_add_wave_passes() {
            let test = AtomicTest::new(linear(64, 64), AtomicOp::Add, AtomicType::U32);
            let emulation = test.emulate().unwrap();
            assert!(emulation.passed(), "{}", emulation.report());
            assert_eq!(test.decode(emulation.final_value()), 64);
        }

        #[test]
        fn test_agent_kinds_pass() {
            for op in [AtomicOp::Add, AtomicOp::Sub, AtomicOp::Max, AtomicOp::Min, AtomicOp::Exch] {
                let ty = if op == AtomicOp::Exch {
                    AtomicType::B64
                } else {
                    AtomicType::S64
                };
                let test = AtomicTest::new(linear(1024, 256), op, ty).with_scope(MemoryScope::Agent);
                assert!(test.is_valid(), "{test}");
                let emulation = test.emulate().unwrap();
                assert!(emulation.passed(), "{test}: {}", emulation.report());
            }
        }

        #[test]
        fn test_bitwise_ops_pass() {
            for op in [AtomicOp::And, AtomicOp::Or, AtomicOp::Xor] {
                let test = AtomicTest::new(linear(32, 32), op, AtomicType::B32);
                let emulation = test.emulate().unwrap();
                assert!(emulation.passed(), "{test}: {}", emulation.report());
            }
        }

        #[test]
        fn test_st_noret_passes() {
            let test = AtomicTest::new(linear(256, 64), AtomicOp::St, AtomicType::B64)
                .with_noret(true)
                .with_segment(Segment::Flat);
            assert!(test.is_valid());
            assert!(test.emulate().unwrap().passed());
        }

        #[test]
        fn test_ld_has_no_emulation() {
            let test = AtomicTest::new(linear(32, 32), AtomicOp::Ld, AtomicType::B32);
            assert!(test.emulate().is_none());
        }

        #[test]
        fn test_duplicate_dst_detected() {
            let test = AtomicTest::new(linear(64, 64), AtomicOp::Add, AtomicType::U32);
            let behavior = test.behavior().unwrap();
            let mut trace = test.execute(behavior);
            // two work-items claim to have seen the same old value
            trace.dst[5] = trace.dst[4];
            let emulation = test.check(behavior, &trace);
            assert!(!emulation.passed());
            let slots: Vec<usize> = emulation.mismatches().iter().map(|&(i, _)| i).collect();
            assert_eq!(slots, vec![4, 5]);
            assert!(emulation.report().contains("slot 4"));
        }

        #[test]
        fn test_corrupt_encoding_detected() {
            let test = AtomicTest::new(linear(64, 64), AtomicOp::Max, AtomicType::U64);
            let behavior = test.behavior().unwrap();
            let mut trace = test.execute(behavior);
            trace.dst[10] ^= 1;
            let emulation = test.check(behavior, &trace);
            assert_eq!(emulation.results()[10] & FLAG_VLD_DST, 0);
        }

        #[test]
        fn test_stale_last_group_detected() {
            let test = AtomicTest::new(linear(512, 128), AtomicOp::Add, AtomicType::U32)
                .with_scope(MemoryScope::Agent);
            let behavior = test.behavior().unwrap();
            let mut trace = test.execute(behavior);
            // the last workgroup must see the final value, earlier ones need not
            trace.observed[0] = test.encode(1);
            assert!(test.check(behavior, &trace).passed());
            trace.observed[511] = test.encode(384);
            assert!(!test.check(behavior, &trace).passed());
        }
    }

    proptest! {
        #[test]
        fn prop_valid_tests_pass(
            op_index in 0usize..13,
            ty_index in 0usize..6,
            groups in 1u32..5,
            group_size in prop::sample::select(vec![16u32, 32, 64]),
            noret in any::<bool>(),
        ) {
            let op = AtomicOp::ALL[op_index];
            let ty = AtomicType::ALL[ty_index];
            let grid = linear(group_size * groups, group_size);
            let test = AtomicTest::new(grid, op, ty)
                .with_scope(MemoryScope::System)
                .with_noret(noret)
                .with_wave_size(32);
            prop_assume!(test.is_valid());
            let emulation = test.emulate().unwrap();
            prop_assert!(emulation.passed(), "{}: {}", test, emulation.report());
        }
    }
}
