//! Slot declarations: kinds, derivation rules, defaults and validators.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Formula of a derivation rule. Receives input values in the order the rule
/// lists them; `None` or a non-finite result means the rule does not apply.
pub type Formula = Arc<dyn Fn(&[f64]) -> Option<f64> + Send + Sync>;

/// Whether a slot accepts direct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// May be assigned directly or derived from other slots
    Input,
    /// Computed only
    Derived,
}

/// One way of computing a slot from other slots.
#[derive(Clone)]
pub struct Rule {
    name: String,
    inputs: Vec<String>,
    formula: Formula,
}

impl Rule {
    /// Rule whose formula may decline by returning `None`.
    pub fn new<F>(name: impl Into<String>, inputs: &[&str], formula: F) -> Self
    where
        F: Fn(&[f64]) -> Option<f64> + Send + Sync + 'static,
    {
        Rule {
            name: name.into(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            formula: Arc::new(formula),
        }
    }

    /// Rule with an infallible formula.
    pub fn compute<F>(name: impl Into<String>, inputs: &[&str], formula: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::new(name, inputs, move |v| Some(formula(v)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Evaluate the formula, rejecting non-finite results.
    pub(crate) fn evaluate(&self, values: &[f64]) -> Option<f64> {
        (self.formula)(values).filter(|v| v.is_finite())
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Acceptance check run before a direct value is stored.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(f64) -> Result<(), String> + Send + Sync>);

impl Validator {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(f64) -> Result<(), String> + Send + Sync + 'static,
    {
        Validator(Arc::new(check))
    }

    /// Accept values within `[min, max)`.
    pub fn half_open(min: f64, max: f64) -> Self {
        Self::new(move |v| {
            if v >= min && v < max {
                Ok(())
            } else {
                Err(format!("must satisfy {} <= value < {}", min, max))
            }
        })
    }

    /// Accept values `> 0`.
    pub fn positive() -> Self {
        Self::new(|v| if v > 0.0 { Ok(()) } else { Err("must be positive".to_string()) })
    }

    /// Accept values `>= 0`.
    pub fn non_negative() -> Self {
        Self::new(|v| if v >= 0.0 { Ok(()) } else { Err("must not be negative".to_string()) })
    }

    /// Accept whole numbers `>= min`.
    pub fn integer_at_least(min: f64) -> Self {
        Self::new(move |v| {
            if v.fract() != 0.0 {
                Err("must be an integer".to_string())
            } else if v < min {
                Err(format!("must be at least {}", min))
            } else {
                Ok(())
            }
        })
    }

    pub(crate) fn check(&self, value: f64) -> Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

/// Declaration and state of one named quantity.
#[derive(Debug, Clone)]
pub struct Slot {
    pub(crate) name: String,
    pub(crate) kind: SlotKind,
    pub(crate) rules: Vec<Rule>,
    pub(crate) default: Option<f64>,
    pub(crate) default_rules: Vec<Rule>,
    pub(crate) validator: Option<Validator>,
    pub(crate) direct: Option<f64>,
    pub(crate) stamp: u64,
}

impl Slot {
    /// A slot that accepts direct values.
    pub fn input(name: impl Into<String>) -> Self {
        Self::with_kind(name, SlotKind::Input)
    }

    /// A slot computed only from its rules.
    pub fn derived(name: impl Into<String>) -> Self {
        Self::with_kind(name, SlotKind::Derived)
    }

    fn with_kind(name: impl Into<String>, kind: SlotKind) -> Self {
        Slot {
            name: name.into(),
            kind,
            rules: Vec::new(),
            default: None,
            default_rules: Vec::new(),
            validator: None,
            direct: None,
            stamp: 0,
        }
    }

    /// Append a rule; earlier rules take priority.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Value used when no rule applies.
    pub fn default_value(mut self, value: f64) -> Self {
        self.default = Some(value);
        self
    }

    /// Computed fallback tried after the rules and before the default value.
    /// A value obtained this way counts as a default: assigning the slot
    /// replaces it without a conflict.
    pub fn default_rule(mut self, rule: Rule) -> Self {
        self.default_rules.push(rule);
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn default_rules(&self) -> &[Rule] {
        &self.default_rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_rejects_non_finite() {
        let rule = Rule::compute("ratio", &["a", "b"], |v| v[0] / v[1]);
        assert_eq!(rule.evaluate(&[6.0, 3.0]), Some(2.0));
        assert_eq!(rule.evaluate(&[1.0, 0.0]), None);
        assert_eq!(rule.inputs(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_validators() {
        assert!(Validator::half_open(0.0, 1.0).check(0.0).is_ok());
        assert!(Validator::half_open(0.0, 1.0).check(1.0).is_err());
        assert!(Validator::integer_at_least(1.0).check(2.0).is_ok());
        assert!(Validator::integer_at_least(1.0).check(1.5).is_err());
        assert!(Validator::integer_at_least(1.0).check(0.0).is_err());
        assert!(Validator::non_negative().check(-0.1).is_err());
        assert!(Validator::positive().check(0.0).is_err());
    }

    #[test]
    fn test_builder_keeps_rule_order() {
        let slot = Slot::input("mean")
            .rule(Rule::compute("first", &["a"], |v| v[0]))
            .rule(Rule::compute("second", &["b"], |v| v[0]))
            .default_value(1.0);
        let names: Vec<_> = slot.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(slot.kind(), SlotKind::Input);
    }
}
