//! # Parameter Graph
//!
//! Resolver for a set of named quantities where any one of several
//! equivalent quantities may be the source of truth. A spring's mean
//! diameter can be typed in, or follow from the external diameter and the
//! wire width, or from the internal diameter and the wire width; whichever
//! inputs the user supplied decide.
//!
//! ## Slots
//!
//! Every [`Slot`] is in one of three states:
//!
//! - **direct**: a value was assigned; it is its own source
//! - **derived**: the first of its [`Rule`]s whose inputs all resolve wins;
//!   the result remembers the direct slots it came from (its *defining set*)
//! - **undefined**: nothing applies (a declared default rule or default
//!   value is used if present)
//!
//! Assigning a slot that currently derives from other slots is refused with
//! [`CalcError::AlreadyDefined`], naming those slots. The caller deletes one
//! of them first. Values computed from a default count as defaults
//! themselves and may be overwritten.
//!
//! ## Cycles
//!
//! Rules may reference each other in both directions (`a` from `b`, `b` from
//! `a`). A slot reached again while it is being resolved prunes only the rule
//! path that reached it; a pure cycle with no direct value resolves to
//! undefined rather than failing.
//!
//! ## Caching
//!
//! Top-level resolutions are cached together with the logical clock at
//! evaluation time. The clock advances on every assignment and deletion. An
//! entry is reused until one of the direct slots it consulted changes, or a
//! slot becomes defined or undefined anywhere in the graph.
//!
//! ## Dimension Groups
//!
//! A [`DimensionGroup`] binds three slots by `total = inner + span` and keeps
//! at most two of them assigned. See [`ParameterGraph::assign`].
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::graph::{ParameterGraph, Rule, Slot};
//!
//! let mut graph = ParameterGraph::new("demo");
//! graph.declare(Slot::input("a").rule(Rule::compute("2b", &["b"], |v| 2.0 * v[0]))).unwrap();
//! graph.declare(Slot::input("b").rule(Rule::compute("a/2", &["a"], |v| v[0] / 2.0))).unwrap();
//!
//! assert!(graph.resolve("a").is_none());
//! graph.assign("b", 3.0).unwrap();
//! assert_eq!(graph.value("a").unwrap(), 6.0);
//! assert!(graph.assign("a", 1.0).is_err());
//! ```

mod group;
mod slot;

pub use group::DimensionGroup;
pub use slot::{Formula, Rule, Slot, SlotKind, Validator};

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Resolution results
// ============================================================================

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    Direct,
    Derived { rule: String },
    Default,
}

/// A resolved slot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolved {
    pub value: f64,
    /// Directly assigned slots this value ultimately depends on
    pub defining_set: BTreeSet<String>,
    pub origin: Origin,
}

impl Resolved {
    pub fn sources(&self) -> Vec<String> {
        self.defining_set.iter().cloned().collect()
    }
}

/// One line of [`ParameterGraph::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotReport {
    pub name: String,
    pub kind: SlotKind,
    pub value: Option<f64>,
    pub origin: Option<Origin>,
    pub defining_set: Vec<String>,
}

/// A slot reached again while it was being resolved.
#[derive(Debug)]
struct CircularReference {
    slot: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    resolved: Resolved,
    /// Direct slots read while computing the entry
    consulted: BTreeSet<String>,
    computed_at: u64,
}

#[derive(Default)]
struct ResolveContext {
    visiting: HashSet<String>,
    consulted: BTreeSet<String>,
}

// ============================================================================
// Graph
// ============================================================================

/// Named slots with lazy, cached, cycle-guarded resolution.
///
/// Not `Sync`: the cache uses interior mutability so that resolution works
/// through `&self`.
#[derive(Debug, Clone)]
pub struct ParameterGraph {
    name: String,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
    groups: Vec<DimensionGroup>,
    clock: u64,
    availability_epoch: u64,
    cache: RefCell<HashMap<String, CacheEntry>>,
}

impl ParameterGraph {
    pub fn new(name: impl Into<String>) -> Self {
        ParameterGraph {
            name: name.into(),
            slots: Vec::new(),
            index: HashMap::new(),
            groups: Vec::new(),
            clock: 0,
            availability_epoch: 0,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value of the logical clock.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Add a slot. Slot names are unique within a graph.
    pub fn declare(&mut self, slot: Slot) -> CalcResult<&mut Self> {
        if self.index.contains_key(slot.name()) {
            return Err(CalcError::invalid_input(
                "slot",
                slot.name(),
                format!("Already declared on '{}'", self.name),
            ));
        }
        self.index.insert(slot.name().to_string(), self.slots.len());
        self.slots.push(slot);
        self.cache.get_mut().clear();
        Ok(self)
    }

    /// Append a rule to an existing slot.
    pub fn add_rule(&mut self, name: &str, rule: Rule) -> CalcResult<()> {
        let index = self.index_of(name)?;
        self.slots[index].rules.push(rule);
        self.cache.get_mut().clear();
        Ok(())
    }

    /// Replace every rule of a slot that is not a dimension-group identity.
    pub fn replace_rules(&mut self, name: &str, rules: Vec<Rule>) -> CalcResult<()> {
        let index = self.index_of(name)?;
        let identities: Vec<Rule> = self
            .group_of(name)
            .map(|g| self.groups[g].identity_rules())
            .into_iter()
            .flatten()
            .filter(|(member, _)| member == name)
            .map(|(_, rule)| rule)
            .collect();
        self.slots[index].rules = rules.into_iter().chain(identities).collect();
        self.cache.get_mut().clear();
        Ok(())
    }

    /// Change the default of an existing slot.
    pub fn set_default(&mut self, name: &str, default: Option<f64>) -> CalcResult<()> {
        let index = self.index_of(name)?;
        self.slots[index].default = default;
        self.cache.get_mut().clear();
        Ok(())
    }

    /// Register a dimension group over three declared input slots and add
    /// its identity rules.
    pub fn add_group(&mut self, group: DimensionGroup) -> CalcResult<()> {
        for member in group.members() {
            let index = self.index_of(member)?;
            if self.slots[index].kind != SlotKind::Input {
                return Err(CalcError::ReadOnlySlot { slot: member.to_string() });
            }
            if self.group_of(member).is_some() {
                return Err(CalcError::invalid_input("group", group.name(), format!("'{}' already grouped", member)));
            }
            if self.slots[index].direct.is_some() {
                return Err(CalcError::invalid_input("group", group.name(), format!("'{}' already assigned", member)));
            }
        }
        for (member, rule) in group.identity_rules() {
            let index = self.index_of(&member)?;
            self.slots[index].rules.push(rule);
        }
        self.groups.push(group);
        self.cache.get_mut().clear();
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&DimensionGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    /// Lock a group member (or clear the lock). On a third assignment the
    /// locked member gives up its value if it is one of the two assigned.
    pub fn set_lock(&mut self, group: &str, member: Option<&str>) -> CalcResult<()> {
        let target = self
            .groups
            .iter_mut()
            .find(|g| g.name() == group)
            .ok_or_else(|| CalcError::invalid_input("group", group, "No such dimension group"))?;
        if let Some(member) = member {
            if !target.contains(member) {
                return Err(CalcError::invalid_input(
                    "lock",
                    member,
                    format!("Not a member of '{}'", group),
                ));
            }
        }
        target.set_lock(member);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// Directly assigned value, ignoring rules and defaults.
    pub fn direct_value(&self, name: &str) -> Option<f64> {
        self.slot(name).and_then(|s| s.direct)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolve a slot, or `None` when it is undefined or unknown.
    pub fn resolve(&self, name: &str) -> Option<Resolved> {
        if let Some(entry) = self.cache.borrow().get(name) {
            if self.is_fresh(entry) {
                debug!(slot = name, computed_at = entry.computed_at, "cache hit");
                return Some(entry.resolved.clone());
            }
            debug!(slot = name, clock = self.clock, "cache entry stale");
        }

        let mut context = ResolveContext::default();
        let resolved = self.evaluate(name, &mut context).ok().flatten();

        let mut cache = self.cache.borrow_mut();
        match &resolved {
            Some(r) if r.origin != Origin::Direct => {
                cache.insert(
                    name.to_string(),
                    CacheEntry {
                        resolved: r.clone(),
                        consulted: context.consulted,
                        computed_at: self.clock,
                    },
                );
            }
            _ => {
                cache.remove(name);
            }
        }
        resolved
    }

    /// Resolved value of a slot.
    pub fn value(&self, name: &str) -> CalcResult<f64> {
        if !self.contains(name) {
            return Err(CalcError::unknown_slot(name));
        }
        self.resolve(name)
            .map(|r| r.value)
            .ok_or_else(|| CalcError::not_defined(name))
    }

    /// Resolved values of several slots, failing on the first undefined one.
    pub fn values<const N: usize>(&self, names: [&str; N]) -> CalcResult<[f64; N]> {
        let mut out = [0.0; N];
        for (slot, name) in out.iter_mut().zip(names) {
            *slot = self.value(name)?;
        }
        Ok(out)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.computed_at >= self.availability_epoch
            && entry
                .consulted
                .iter()
                .all(|name| self.slot(name).map(|s| s.stamp <= entry.computed_at).unwrap_or(false))
    }

    fn evaluate(&self, name: &str, context: &mut ResolveContext) -> Result<Option<Resolved>, CircularReference> {
        let Some(slot) = self.slot(name) else {
            return Ok(None);
        };

        if let Some(value) = slot.direct {
            context.consulted.insert(name.to_string());
            return Ok(Some(Resolved {
                value,
                defining_set: BTreeSet::from([name.to_string()]),
                origin: Origin::Direct,
            }));
        }

        if !context.visiting.insert(name.to_string()) {
            return Err(CircularReference { slot: name.to_string() });
        }
        let derived = self.derive(slot, &slot.rules, context).or_else(|| {
            self.derive(slot, &slot.default_rules, context).map(|r| Resolved {
                origin: Origin::Default,
                ..r
            })
        });
        context.visiting.remove(name);

        Ok(derived.or_else(|| {
            slot.default.map(|value| {
                warn!(slot = name, value, "no rule applies, using default");
                Resolved {
                    value,
                    defining_set: BTreeSet::new(),
                    origin: Origin::Default,
                }
            })
        }))
    }

    fn derive(&self, slot: &Slot, rules: &[Rule], context: &mut ResolveContext) -> Option<Resolved> {
        'rules: for rule in rules {
            let mut values = Vec::with_capacity(rule.inputs().len());
            let mut defining_set = BTreeSet::new();
            let mut from_default = false;
            for input in rule.inputs() {
                match self.evaluate(input, context) {
                    Ok(Some(resolved)) => {
                        values.push(resolved.value);
                        defining_set.extend(resolved.defining_set);
                        from_default |= resolved.origin == Origin::Default;
                    }
                    Ok(None) => continue 'rules,
                    Err(cycle) => {
                        debug!(slot = %slot.name, rule = rule.name(), via = %cycle.slot, "circular reference, skipping rule");
                        continue 'rules;
                    }
                }
            }
            if let Some(value) = rule.evaluate(&values) {
                debug!(slot = %slot.name, rule = rule.name(), value, "derived");
                let origin = if from_default {
                    Origin::Default
                } else {
                    Origin::Derived {
                        rule: rule.name().to_string(),
                    }
                };
                return Some(Resolved {
                    value,
                    defining_set,
                    origin,
                });
            }
        }
        None
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Assign a direct value.
    ///
    /// Refused with [`CalcError::AlreadyDefined`] when one of the slot's rules
    /// currently derives it from other assigned slots. Default-backed values
    /// are simply replaced. Group members never conflict:
    /// assigning a third member evicts the locked member if it is one of the
    /// two assigned, otherwise the oldest, and the resulting geometry must
    /// satisfy `inner >= 0`, `span > 0`, `total > inner`.
    pub fn assign(&mut self, name: &str, value: f64) -> CalcResult<()> {
        let index = self.index_of(name)?;
        let slot = &self.slots[index];
        if slot.kind == SlotKind::Derived {
            return Err(CalcError::ReadOnlySlot { slot: name.to_string() });
        }
        if !value.is_finite() {
            return Err(CalcError::invalid_input(name, value.to_string(), "Value must be finite"));
        }
        if let Some(validator) = &slot.validator {
            validator
                .check(value)
                .map_err(|reason| CalcError::invalid_input(name, value.to_string(), reason))?;
        }

        if let Some(group) = self.group_of(name) {
            return self.assign_group_member(group, name, value);
        }

        if let Some(current) = self.resolve(name) {
            if matches!(current.origin, Origin::Derived { .. }) && !current.defining_set.is_empty() {
                return Err(CalcError::already_defined(name, current.sources()));
            }
        }
        self.store(index, Some(value));
        Ok(())
    }

    /// Clear a direct value.
    ///
    /// Deleting an undefined or default-backed slot does nothing. Deleting a
    /// slot derived from other slots fails with
    /// [`CalcError::ConflictingSource`].
    pub fn delete(&mut self, name: &str) -> CalcResult<()> {
        let index = self.index_of(name)?;
        if self.slots[index].kind == SlotKind::Derived {
            return Err(CalcError::ReadOnlySlot { slot: name.to_string() });
        }
        if self.slots[index].direct.is_some() {
            self.store(index, None);
            for group in &mut self.groups {
                group.forget(name);
            }
            return Ok(());
        }
        match self.resolve(name) {
            Some(current) if matches!(current.origin, Origin::Derived { .. }) && !current.defining_set.is_empty() => {
                Err(CalcError::conflicting_source(name, current.sources()))
            }
            _ => Ok(()),
        }
    }

    fn assign_group_member(&mut self, group: usize, name: &str, value: f64) -> CalcResult<()> {
        let members: Vec<usize> = self.groups[group]
            .members()
            .iter()
            .filter_map(|m| self.index.get(*m).copied())
            .collect();
        let saved_slots: Vec<(usize, Option<f64>, u64)> = members
            .iter()
            .map(|&i| (i, self.slots[i].direct, self.slots[i].stamp))
            .collect();
        let saved_order = self.groups[group].order().to_vec();
        let saved_clock = (self.clock, self.availability_epoch);

        if let Some(evicted) = self.groups[group].admit(name) {
            debug!(group = self.groups[group].name(), %evicted, incoming = name, "evicting group member");
            let evicted_index = self.index_of(&evicted)?;
            self.store(evicted_index, None);
        }
        let index = self.index_of(name)?;
        self.store(index, Some(value));

        if let Err(reason) = self.check_group(group) {
            for (i, direct, stamp) in saved_slots {
                self.slots[i].direct = direct;
                self.slots[i].stamp = stamp;
            }
            self.groups[group].restore_order(saved_order);
            (self.clock, self.availability_epoch) = saved_clock;
            return Err(CalcError::impossible_geometry(self.groups[group].name(), reason));
        }
        Ok(())
    }

    fn check_group(&self, group: usize) -> Result<(), String> {
        let group = &self.groups[group];
        if group.order().len() < 2 {
            return Ok(());
        }
        let [total, inner, span] = group
            .members()
            .map(|m| self.evaluate(m, &mut ResolveContext::default()).ok().flatten().map(|r| r.value));
        match (total, inner, span) {
            (Some(total), Some(inner), Some(span)) => group.validate(total, inner, span),
            _ => Ok(()),
        }
    }

    fn store(&mut self, index: usize, value: Option<f64>) {
        self.clock += 1;
        let slot = &mut self.slots[index];
        if slot.direct.is_some() != value.is_some() {
            self.availability_epoch = self.clock;
        }
        slot.direct = value;
        slot.stamp = self.clock;
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Every slot in declaration order with its current resolution.
    pub fn snapshot(&self) -> Vec<SlotReport> {
        self.slots
            .iter()
            .map(|slot| {
                let resolved = self.resolve(&slot.name);
                SlotReport {
                    name: slot.name.clone(),
                    kind: slot.kind,
                    value: resolved.as_ref().map(|r| r.value),
                    defining_set: resolved.as_ref().map(|r| r.sources()).unwrap_or_default(),
                    origin: resolved.map(|r| r.origin),
                }
            })
            .collect()
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    fn index_of(&self, name: &str) -> CalcResult<usize> {
        self.index.get(name).copied().ok_or_else(|| CalcError::unknown_slot(name))
    }

    fn group_of(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.contains(name))
    }
}
