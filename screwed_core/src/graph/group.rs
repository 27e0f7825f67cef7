//! Two-of-three dimension groups (`total = inner + span`).

use serde::{Deserialize, Serialize};

use super::slot::Rule;

/// Three slots bound by `total = inner + span`, at most two of which hold
/// direct values at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionGroup {
    name: String,
    total: String,
    inner: String,
    span: String,
    lock: Option<String>,
    /// Directly assigned members, oldest first
    order: Vec<String>,
}

impl DimensionGroup {
    pub fn new(name: impl Into<String>, total: &str, inner: &str, span: &str) -> Self {
        DimensionGroup {
            name: name.into(),
            total: total.to_string(),
            inner: inner.to_string(),
            span: span.to_string(),
            lock: None,
            order: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> [&str; 3] {
        [self.total.as_str(), self.inner.as_str(), self.span.as_str()]
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.members().contains(&slot)
    }

    pub fn lock(&self) -> Option<&str> {
        self.lock.as_deref()
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub(crate) fn set_lock(&mut self, member: Option<&str>) {
        self.lock = member.map(str::to_string);
    }

    /// Identity rules for each member, keyed by the member they compute.
    pub(crate) fn identity_rules(&self) -> [(String, Rule); 3] {
        let (total, inner, span) = (self.total.as_str(), self.inner.as_str(), self.span.as_str());
        [
            (
                self.total.clone(),
                Rule::compute(format!("{} + {}", inner, span), &[inner, span], |v| v[0] + v[1]),
            ),
            (
                self.inner.clone(),
                Rule::compute(format!("{} - {}", total, span), &[total, span], |v| v[0] - v[1]),
            ),
            (
                self.span.clone(),
                Rule::compute(format!("{} - {}", total, inner), &[total, inner], |v| v[0] - v[1]),
            ),
        ]
    }

    /// Record an assignment of `member` and return the member that has to
    /// give up its direct value, if any.
    pub(crate) fn admit(&mut self, member: &str) -> Option<String> {
        if let Some(index) = self.order.iter().position(|m| m == member) {
            let existing = self.order.remove(index);
            self.order.push(existing);
            return None;
        }
        let evicted = if self.order.len() >= 2 {
            let index = self
                .lock
                .as_ref()
                .and_then(|lock| self.order.iter().position(|m| m == lock))
                .unwrap_or(0);
            Some(self.order.remove(index))
        } else {
            None
        };
        self.order.push(member.to_string());
        evicted
    }

    pub(crate) fn forget(&mut self, member: &str) {
        self.order.retain(|m| m != member);
    }

    pub(crate) fn restore_order(&mut self, order: Vec<String>) {
        self.order = order;
    }

    /// Check a complete triple.
    pub(crate) fn validate(&self, total: f64, inner: f64, span: f64) -> Result<(), String> {
        if inner < 0.0 {
            return Err(format!("{} = {} is negative", self.inner, inner));
        }
        if span <= 0.0 {
            return Err(format!("{} = {} is not positive", self.span, span));
        }
        if total <= inner {
            return Err(format!("{} = {} does not exceed {} = {}", self.total, total, self.inner, inner));
        }
        Ok(())
    }
}
