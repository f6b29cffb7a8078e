//! Instruction property search ("TestGen").
//!
//! An [`InstDesc`] splits an opcode's properties into an ordered primary list
//! and a secondary list. [`TestGen`] walks that description to produce every
//! valid instruction worth testing, and single-property mutants of each for
//! negative testing. Validity is decided by an [`InstructionSet`]; the
//! bundled [`TableInstSet`] reads its rules from YAML.
//!
//! ```
//! use hexl::testgen::{SearchMode, TableInstSet, TestGen};
//!
//! let set = TableInstSet::from_yaml_str(
//!     "opcodes:\n  - name: add\n    format: basic\n    primary:\n      - { prop: type, all: [s32, u32] }\n",
//! )
//! .unwrap();
//! let mut search = TestGen::create(&set, "add", false, SearchMode::Optimal).unwrap();
//! let mut count = 0;
//! let mut start = true;
//! while search.next_primary_set(start) {
//!     start = false;
//!     count += 1;
//! }
//! assert_eq!(count, 2);
//! ```

mod dump;
mod inst_desc;
mod inst_set;
mod prop;
mod provider;
mod sample;
mod state;
mod table;

pub use dump::dump_sample;
pub use inst_desc::InstDesc;
pub use inst_set::InstructionSet;
pub use prop::{Prop, PropId, OPERAND_VAL_NULL};
pub use provider::{SearchMode, TestGen, BASIC_REMOVED_PROPS};
pub use sample::{InstFormat, Operand, Sample};
pub use state::{PropCursor, SearchState};
pub use table::TableInstSet;
