//! Table-driven instruction set loaded from YAML.
//!
//! ```yaml
//! opcodes:
//!   - name: cvt
//!     format: mod
//!     primary:
//!       - { prop: type, all: [s8, u8, f16, f32] , valid: [s8, u8, f32] }
//!       - { prop: stype, all: [f16, f32, f64] }
//!     secondary:
//!       - { prop: ftz, all: [0, 1] }
//!     implicit: { ftz: 0 }
//!     rules:
//!       - when: { type: [f32] }
//!         prop: stype
//!         allowed: [f16, f64]
//! ```
//!
//! `valid` defaults to `all`. A rule restricts `prop` to `allowed` whenever every
//! `when` property is assigned one of the listed values. Rules may only be
//! conditioned on primary properties, and a rule on a primary property may only
//! look at primaries declared before it.

use super::inst_set::InstructionSet;
use super::prop::{PropId, OPERAND_VAL_NULL};
use super::sample::{InstFormat, Sample};
use crate::result::{HexlError, HexlResult};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableFile {
    opcodes: Vec<OpcodeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OpcodeEntry {
    name: String,
    format: InstFormat,
    #[serde(default)]
    primary: Vec<PropEntry>,
    #[serde(default)]
    secondary: Vec<PropEntry>,
    #[serde(default)]
    implicit: BTreeMap<String, ValueName>,
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropEntry {
    prop: String,
    all: Vec<ValueName>,
    #[serde(default)]
    valid: Option<Vec<ValueName>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    when: BTreeMap<String, Vec<ValueName>>,
    prop: String,
    allowed: Vec<ValueName>,
}

/// Value spelled in the table; YAML scalars of any kind are accepted
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValueName {
    Null,
    Bool(bool),
    Int(i64),
    Name(String),
}

impl fmt::Display for ValueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone)]
struct PropDesc {
    id: PropId,
    valid: Vec<u32>,
    all: Vec<u32>,
}

#[derive(Debug, Clone)]
struct Rule {
    when: Vec<(PropId, Vec<u32>)>,
    prop: PropId,
    allowed: Vec<u32>,
}

impl Rule {
    fn applies(&self, sample: &Sample) -> bool {
        self.when
            .iter()
            .all(|(p, values)| sample.get(*p).is_some_and(|v| values.contains(&v)))
    }
}

#[derive(Debug, Clone)]
struct OpcodeDesc {
    format: InstFormat,
    primary: Vec<PropDesc>,
    secondary: Vec<PropDesc>,
    implicit: BTreeMap<PropId, u32>,
    rules: Vec<Rule>,
}

impl OpcodeDesc {
    fn find(&self, prop: PropId) -> Option<&PropDesc> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .find(|p| p.id == prop)
    }

    fn primary_index(&self, prop: PropId) -> Option<usize> {
        self.primary.iter().position(|p| p.id == prop)
    }
}

/// Instruction set described by a YAML table
#[derive(Debug, Clone)]
pub struct TableInstSet {
    opcodes: BTreeMap<String, OpcodeDesc>,
    prop_ids: BTreeMap<String, PropId>,
    prop_names: BTreeMap<PropId, String>,
    values: Vec<String>,
    value_ids: HashMap<String, u32>,
}

impl TableInstSet {
    /// Parse a table from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the table is inconsistent.
    pub fn from_yaml_str(yaml: &str) -> HexlResult<Self> {
        let file: TableFile = serde_yaml_ng::from_str(yaml)?;
        let mut set = Self {
            opcodes: BTreeMap::new(),
            prop_ids: BTreeMap::new(),
            prop_names: BTreeMap::new(),
            values: Vec::new(),
            value_ids: HashMap::new(),
        };
        set.intern_value("null");

        for entry in file.opcodes {
            let name = entry.name.clone();
            let desc = set.compile_opcode(entry)?;
            if set.opcodes.insert(name.clone(), desc).is_some() {
                return Err(HexlError::invalid_table(format!("duplicate opcode '{name}'")));
            }
        }

        debug!(
            opcodes = set.opcodes.len(),
            values = set.values.len(),
            "loaded instruction table"
        );
        Ok(set)
    }

    /// Load a table from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> HexlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Id of the value spelled `name`, if the table mentions it
    #[must_use]
    pub fn value_id(&self, name: &str) -> Option<u32> {
        self.value_ids.get(name).copied()
    }

    /// Id of the property spelled `name`, if the table mentions it
    #[must_use]
    pub fn prop_id(&self, name: &str) -> Option<PropId> {
        self.prop_ids.get(name).copied()
    }

    fn intern_value(&mut self, name: &str) -> u32 {
        if let Some(id) = self.value_ids.get(name) {
            return *id;
        }
        let id = self.values.len() as u32;
        self.values.push(name.to_string());
        self.value_ids.insert(name.to_string(), id);
        id
    }

    fn intern_prop(&mut self, name: &str) -> PropId {
        if let Some(id) = self.prop_ids.get(name) {
            return *id;
        }
        let id = PropId::from_key(name).unwrap_or_else(|| {
            let custom = self
                .prop_names
                .keys()
                .filter(|p| p.0 >= PropId::FIRST_CUSTOM)
                .count() as u32;
            PropId(PropId::FIRST_CUSTOM + custom)
        });
        self.prop_ids.insert(name.to_string(), id);
        self.prop_names.insert(id, name.to_string());
        id
    }

    fn intern_values(&mut self, names: &[ValueName]) -> Vec<u32> {
        names
            .iter()
            .map(|n| self.intern_value(&n.to_string()))
            .collect()
    }

    fn compile_props(&mut self, opcode: &str, entries: &[PropEntry]) -> HexlResult<Vec<PropDesc>> {
        entries
            .iter()
            .map(|e| {
                let id = self.intern_prop(&e.prop);
                let all = self.intern_values(&e.all);
                let valid = match &e.valid {
                    Some(valid) => self.intern_values(valid),
                    None => all.clone(),
                };
                if all.is_empty() || valid.is_empty() {
                    return Err(HexlError::invalid_table(format!(
                        "{opcode}: property '{}' has no values",
                        e.prop
                    )));
                }
                if let Some(v) = valid
                    .iter()
                    .find(|v| **v != OPERAND_VAL_NULL && !all.contains(v))
                {
                    return Err(HexlError::invalid_table(format!(
                        "{opcode}: valid value '{}' of '{}' is not listed in all",
                        self.values[*v as usize], e.prop
                    )));
                }
                Ok(PropDesc { id, valid, all })
            })
            .collect()
    }

    fn compile_opcode(&mut self, entry: OpcodeEntry) -> HexlResult<OpcodeDesc> {
        let opcode = entry.name.as_str();
        let primary = self.compile_props(opcode, &entry.primary)?;
        let secondary = self.compile_props(opcode, &entry.secondary)?;

        let mut desc = OpcodeDesc {
            format: entry.format,
            primary,
            secondary,
            implicit: BTreeMap::new(),
            rules: Vec::new(),
        };

        let mut seen = Vec::new();
        for p in desc.primary.iter().chain(desc.secondary.iter()) {
            if seen.contains(&p.id) {
                return Err(HexlError::invalid_table(format!(
                    "{opcode}: property '{}' declared twice",
                    self.prop_name(p.id)
                )));
            }
            seen.push(p.id);
        }

        for (prop, value) in &entry.implicit {
            let id = self.intern_prop(prop);
            let value = self.intern_value(&value.to_string());
            desc.implicit.insert(id, value);
        }

        for rule in &entry.rules {
            let compiled = self.compile_rule(opcode, &desc, rule)?;
            desc.rules.push(compiled);
        }

        Ok(desc)
    }

    fn compile_rule(&mut self, opcode: &str, desc: &OpcodeDesc, rule: &RuleEntry) -> HexlResult<Rule> {
        let prop = self.intern_prop(&rule.prop);
        if desc.find(prop).is_none() {
            return Err(HexlError::invalid_table(format!(
                "{opcode}: rule restricts undeclared property '{}'",
                rule.prop
            )));
        }
        let target_index = desc.primary_index(prop);

        let mut when = Vec::new();
        for (name, values) in &rule.when {
            let id = self.intern_prop(name);
            let Some(index) = desc.primary_index(id) else {
                return Err(HexlError::invalid_table(format!(
                    "{opcode}: rule on '{}' depends on non-primary property '{name}'",
                    rule.prop
                )));
            };
            if target_index.is_some_and(|t| index >= t) {
                return Err(HexlError::invalid_table(format!(
                    "{opcode}: rule on primary '{}' depends on later property '{name}'",
                    rule.prop
                )));
            }
            when.push((id, self.intern_values(values)));
        }

        Ok(Rule {
            when,
            prop,
            allowed: self.intern_values(&rule.allowed),
        })
    }

    fn check(&self, desc: &OpcodeDesc, sample: &Sample, prop: PropId) -> bool {
        let Some(value) = sample.get(prop) else {
            return false;
        };
        let Some(pd) = desc.find(prop) else {
            return false;
        };
        if !pd.valid.contains(&value) {
            return false;
        }
        desc.rules
            .iter()
            .filter(|r| r.prop == prop && r.applies(sample))
            .all(|r| r.allowed.contains(&value))
    }
}

impl InstructionSet for TableInstSet {
    fn opcodes(&self) -> Vec<String> {
        self.opcodes.keys().cloned().collect()
    }

    fn format(&self, opcode: &str) -> Option<InstFormat> {
        self.opcodes.get(opcode).map(|d| d.format)
    }

    fn props(&self, opcode: &str) -> Option<(Vec<PropId>, Vec<PropId>)> {
        self.opcodes.get(opcode).map(|d| {
            (
                d.primary.iter().map(|p| p.id).collect(),
                d.secondary.iter().map(|p| p.id).collect(),
            )
        })
    }

    fn valid_values(&self, opcode: &str, prop: PropId) -> Vec<u32> {
        self.opcodes
            .get(opcode)
            .and_then(|d| d.find(prop))
            .map(|p| p.valid.clone())
            .unwrap_or_default()
    }

    fn all_values(&self, opcode: &str, prop: PropId) -> Vec<u32> {
        self.opcodes
            .get(opcode)
            .and_then(|d| d.find(prop))
            .map(|p| p.all.clone())
            .unwrap_or_default()
    }

    fn is_valid_prop(&self, sample: &Sample, prop: PropId) -> bool {
        self.opcodes
            .get(sample.opcode())
            .is_some_and(|d| self.check(d, sample, prop))
    }

    fn validate_primary_props(&self, sample: &Sample) -> bool {
        self.opcodes.get(sample.opcode()).is_some_and(|d| {
            d.primary
                .iter()
                .filter(|p| sample.get(p.id).is_some())
                .all(|p| self.check(d, sample, p.id))
        })
    }

    fn is_valid_inst(&self, sample: &Sample) -> bool {
        self.opcodes.get(sample.opcode()).is_some_and(|d| {
            d.primary.iter().all(|p| self.check(d, sample, p.id))
                && d.secondary
                    .iter()
                    .filter(|p| sample.get(p.id).is_some())
                    .all(|p| self.check(d, sample, p.id))
        })
    }

    fn implicit_value(&self, opcode: &str, prop: PropId) -> Option<u32> {
        self.opcodes
            .get(opcode)
            .and_then(|d| d.implicit.get(&prop).copied())
    }

    fn prop_name(&self, prop: PropId) -> String {
        self.prop_names
            .get(&prop)
            .cloned()
            .unwrap_or_else(|| prop.to_string())
    }

    fn value_name(&self, _prop: PropId, value: u32) -> Option<String> {
        self.values.get(value as usize).cloned()
    }
}
