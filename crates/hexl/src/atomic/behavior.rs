//! Per-operation test values and checks.
//!
//! Each [`AtomicBehavior`] is a table of pure functions over a [`Lane`]. All
//! values are unsigned and already decoded; "-1" means the all-ones value of
//! the operand width.

use super::AtomicOp;

/// View of the test from one work-item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    /// Flat absolute work-item id
    pub id: u64,
    /// Number of work-items taking part in the test
    pub test_size: u64,
    /// All-ones value of the operand width
    pub mask: u64,
}

impl Lane {
    #[must_use]
    pub const fn new(id: u64, test_size: u64, mask: u64) -> Self {
        Self {
            id,
            test_size,
            mask,
        }
    }

    const fn last(&self) -> u64 {
        self.test_size - 1
    }

    const fn clamp(&self, index: u64) -> u64 {
        if index < self.last() {
            index
        } else {
            self.last()
        }
    }

    const fn from_size(&self, value: u64) -> u64 {
        self.test_size.wrapping_sub(value) & self.mask
    }

    const fn bit(&self) -> u64 {
        (1u64 << (self.id & 63)) & self.mask
    }

    const fn popcount(value: u64) -> u64 {
        value.count_ones() as u64
    }
}

/// Check of the value returned to each work-item
#[derive(Debug, Clone, Copy)]
pub struct DstCheck {
    /// Result slot that receives the flag
    pub index: fn(&Lane, u64) -> u64,
    /// Condition on `(dst, mem)`
    pub cond: fn(&Lane, u64, u64) -> bool,
}

/// Check of the final memory value
#[derive(Debug, Clone, Copy)]
pub struct MemCheck {
    /// Result slot that receives the flag
    pub index: fn(&Lane) -> u64,
    /// Condition once every work-item has executed
    pub cond: fn(&Lane, u64) -> bool,
    /// Weaker condition for agent tests, where only the last workgroup
    /// is guaranteed to observe the final value
    pub cond_agent: fn(&Lane, u64) -> bool,
}

/// Extra check for `exch`, whose last written value is never returned
#[derive(Debug, Clone, Copy)]
pub struct ExchCheck {
    /// Result slot, computed from the memory value
    pub index: fn(&Lane, u64) -> u64,
    /// Condition on `dst` for workgroup and wave tests
    pub cond: fn(&Lane, u64) -> bool,
    /// Condition for agent tests
    pub cond_agent: fn(&Lane, u64) -> bool,
}

/// Test values and checks of one atomic operation
#[derive(Debug, Clone, Copy)]
pub struct AtomicBehavior {
    /// Whether test values are spread over the operand with the encoding key
    pub encryptable: bool,
    /// Initial memory value (before encoding)
    pub initial_value: fn(&Lane) -> u64,
    /// First source operand
    pub operand: fn(&Lane) -> u64,
    /// Second source operand (`cas` only)
    pub operand1: Option<fn(&Lane) -> u64>,
    /// Destination check; `None` when the operation never returns a value
    pub dst: Option<DstCheck>,
    pub mem: MemCheck,
    pub exch: Option<ExchCheck>,
}

impl AtomicBehavior {
    /// Behaviour record of `op`. `ld` is never the operation under test and has none.
    #[must_use]
    pub const fn of(op: AtomicOp) -> Option<&'static Self> {
        match op {
            AtomicOp::Add => Some(&ADD),
            AtomicOp::And => Some(&AND),
            AtomicOp::Cas => Some(&CAS),
            AtomicOp::Exch => Some(&EXCH),
            AtomicOp::Ld => None,
            AtomicOp::Max => Some(&MAX),
            AtomicOp::Min => Some(&MIN),
            AtomicOp::Or => Some(&OR),
            AtomicOp::St => Some(&ST),
            AtomicOp::Sub => Some(&SUB),
            AtomicOp::Wrapdec => Some(&WRAPDEC),
            AtomicOp::Wrapinc => Some(&WRAPINC),
            AtomicOp::Xor => Some(&XOR),
        }
    }

    #[must_use]
    pub const fn check_dst(&self) -> bool {
        self.dst.is_some()
    }

    #[must_use]
    pub const fn check_mem(&self) -> bool {
        true
    }

    #[must_use]
    pub const fn check_exch(&self) -> bool {
        self.exch.is_some()
    }
}

fn zero(_: &Lane) -> u64 {
    0
}

fn size(lane: &Lane) -> u64 {
    lane.test_size
}

fn ones(lane: &Lane) -> u64 {
    lane.mask
}

fn own_id(lane: &Lane) -> u64 {
    lane.id
}

fn dst_clamped(lane: &Lane, dst: u64) -> u64 {
    lane.clamp(dst)
}

fn dst_below_size(lane: &Lane, dst: u64, _mem: u64) -> bool {
    dst < lane.test_size
}

fn dst_from_size_clamped(lane: &Lane, dst: u64) -> u64 {
    lane.clamp(lane.from_size(dst))
}

fn dst_from_size_below_size(lane: &Lane, dst: u64, _mem: u64) -> bool {
    lane.from_size(dst) < lane.test_size
}

fn mem_below_size(lane: &Lane, mem: u64) -> bool {
    mem < lane.test_size
}

fn mem_is_size(lane: &Lane, mem: u64) -> bool {
    mem == lane.test_size
}

fn mem_is_zero(_: &Lane, mem: u64) -> bool {
    mem == 0
}

fn mem_in_counted_range(lane: &Lane, mem: u64) -> bool {
    mem > 0 && mem <= lane.test_size
}

fn popcount_clamped(lane: &Lane, dst: u64) -> u64 {
    lane.clamp(Lane::popcount(dst))
}

fn popcount_below_size(lane: &Lane, dst: u64, _mem: u64) -> bool {
    Lane::popcount(dst) < lane.test_size
}

fn mem_all_ones(lane: &Lane, mem: u64) -> bool {
    mem == lane.mask
}

fn mem_nonzero(_: &Lane, mem: u64) -> bool {
    mem != 0
}

static ADD: AtomicBehavior = AtomicBehavior {
    encryptable: true,
    initial_value: zero,
    operand: |_| 1,
    operand1: None,
    dst: Some(DstCheck {
        index: dst_clamped,
        cond: dst_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_is_size,
        cond_agent: mem_in_counted_range,
    },
    exch: None,
};

static SUB: AtomicBehavior = AtomicBehavior {
    encryptable: true,
    initial_value: size,
    operand: |_| 1,
    operand1: None,
    dst: Some(DstCheck {
        index: dst_from_size_clamped,
        cond: dst_from_size_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_is_zero,
        cond_agent: mem_below_size,
    },
    exch: None,
};

static OR: AtomicBehavior = AtomicBehavior {
    encryptable: false,
    initial_value: zero,
    operand: |lane| lane.bit(),
    operand1: None,
    dst: Some(DstCheck {
        index: popcount_clamped,
        cond: popcount_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_all_ones,
        cond_agent: mem_nonzero,
    },
    exch: None,
};

static XOR: AtomicBehavior = AtomicBehavior {
    encryptable: false,
    initial_value: zero,
    operand: |lane| lane.bit(),
    operand1: None,
    dst: Some(DstCheck {
        index: popcount_clamped,
        cond: popcount_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_all_ones,
        cond_agent: mem_nonzero,
    },
    exch: None,
};

static AND: AtomicBehavior = AtomicBehavior {
    encryptable: false,
    initial_value: ones,
    operand: |lane| !lane.bit() & lane.mask,
    operand1: None,
    dst: Some(DstCheck {
        index: |lane, dst| lane.clamp(lane.from_size(Lane::popcount(dst))),
        cond: |lane, dst, _| lane.from_size(Lane::popcount(dst)) < lane.test_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_is_zero,
        cond_agent: |lane, mem| mem != lane.mask,
    },
    exch: None,
};

static WRAPINC: AtomicBehavior = AtomicBehavior {
    encryptable: false,
    initial_value: zero,
    operand: ones,
    operand1: None,
    dst: Some(DstCheck {
        index: dst_clamped,
        cond: dst_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_is_size,
        cond_agent: mem_in_counted_range,
    },
    exch: None,
};

static WRAPDEC: AtomicBehavior = AtomicBehavior {
    encryptable: false,
    initial_value: size,
    operand: ones,
    operand1: None,
    dst: Some(DstCheck {
        index: dst_from_size_clamped,
        cond: dst_from_size_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_is_zero,
        cond_agent: mem_below_size,
    },
    exch: None,
};

static MAX: AtomicBehavior = AtomicBehavior {
    encryptable: true,
    initial_value: zero,
    operand: own_id,
    operand1: None,
    dst: Some(DstCheck {
        index: |lane, _| lane.id,
        cond: dst_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: |lane, mem| mem == lane.last(),
        cond_agent: |lane, mem| mem <= lane.last(),
    },
    exch: None,
};

static MIN: AtomicBehavior = AtomicBehavior {
    encryptable: true,
    initial_value: |lane| lane.last(),
    operand: own_id,
    operand1: None,
    dst: Some(DstCheck {
        index: |lane, _| lane.id,
        cond: dst_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_is_zero,
        cond_agent: mem_below_size,
    },
    exch: None,
};

static EXCH: AtomicBehavior = AtomicBehavior {
    encryptable: true,
    initial_value: size,
    operand: own_id,
    operand1: None,
    dst: Some(DstCheck {
        index: dst_clamped,
        cond: dst_below_size,
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_below_size,
        cond_agent: mem_below_size,
    },
    exch: Some(ExchCheck {
        index: dst_clamped,
        cond: |lane, dst| dst == lane.test_size,
        cond_agent: |lane, _| lane.id == lane.last(),
    }),
};

static CAS: AtomicBehavior = AtomicBehavior {
    encryptable: true,
    initial_value: size,
    operand: size,
    operand1: Some(own_id),
    dst: Some(DstCheck {
        index: |lane, _| lane.id,
        // mem is written once, so this also holds for agent tests
        cond: |lane, dst, mem| {
            (dst == lane.test_size && mem == lane.id) || (dst == mem && mem != lane.id)
        },
    }),
    mem: MemCheck {
        index: own_id,
        cond: mem_below_size,
        cond_agent: mem_below_size,
    },
    exch: None,
};

static ST: AtomicBehavior = AtomicBehavior {
    encryptable: true,
    initial_value: size,
    operand: own_id,
    operand1: None,
    dst: None,
    mem: MemCheck {
        index: own_id,
        cond: mem_below_size,
        cond_agent: mem_below_size,
    },
    exch: None,
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MASK32: u64 = 0xFFFF_FFFF;

    #[test]
    fn test_factory_covers_all_but_ld() {
        for op in AtomicOp::ALL {
            assert_eq!(AtomicBehavior::of(op).is_none(), op == AtomicOp::Ld, "{op}");
        }
    }

    #[test]
    fn test_flags() {
        let st = AtomicBehavior::of(AtomicOp::St).unwrap();
        assert!(!st.check_dst());
        assert!(st.check_mem());
        let exch = AtomicBehavior::of(AtomicOp::Exch).unwrap();
        assert!(exch.check_exch());
        assert!(exch.check_dst());
        assert!(AtomicBehavior::of(AtomicOp::Cas).unwrap().operand1.is_some());
    }

    #[test]
    fn test_encryptable_set() {
        let enc: Vec<AtomicOp> = AtomicOp::ALL
            .into_iter()
            .filter(|&op| AtomicBehavior::of(op).is_some_and(|b| b.encryptable))
            .collect();
        assert_eq!(
            enc,
            vec![
                AtomicOp::Add,
                AtomicOp::Cas,
                AtomicOp::Exch,
                AtomicOp::Max,
                AtomicOp::Min,
                AtomicOp::St,
                AtomicOp::Sub,
            ]
        );
    }

    #[test]
    fn test_sub_dst_index_reverses() {
        let sub = AtomicBehavior::of(AtomicOp::Sub).unwrap();
        let lane = Lane::new(0, 8, MASK32);
        let dst = sub.dst.unwrap();
        assert_eq!((dst.index)(&lane, 8), 0);
        assert_eq!((dst.index)(&lane, 1), 7);
        // a zero dst wraps around and is rejected
        assert!(!(dst.cond)(&lane, 0, 0));
    }

    #[test]
    fn test_and_operand_clears_own_bit() {
        let and = AtomicBehavior::of(AtomicOp::And).unwrap();
        let lane = Lane::new(3, 32, MASK32);
        assert_eq!((and.operand)(&lane), 0xFFFF_FFF7);
        assert_eq!((and.initial_value)(&lane), MASK32);
    }

    #[test]
    fn test_cas_dst_condition() {
        let cas = AtomicBehavior::of(AtomicOp::Cas).unwrap();
        let cond = cas.dst.unwrap().cond;
        // winner sees the initial value and its own id in memory
        assert!(cond(&Lane::new(2, 4, MASK32), 4, 2));
        // losers see the winner's id
        assert!(cond(&Lane::new(1, 4, MASK32), 2, 2));
        assert!(!cond(&Lane::new(1, 4, MASK32), 4, 2));
    }
}
