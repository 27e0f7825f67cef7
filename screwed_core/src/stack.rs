//! # Stack Expressions
//!
//! Text syntax for a tolerance stack-up, evaluated with the worst-case
//! arithmetic of [`ToleranceValue`].
//!
//! ```text
//! expr := ['-'] term (('+' | '-') term)*
//! term := [INT '*'] '[' dimension ']'
//! ```
//!
//! Dimensions use the same forms as `ToleranceValue::from_str`.
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::stack::evaluate;
//!
//! let gap = evaluate("[40 +0.1/-0.1] - 2*[15 ±0.05]").unwrap();
//! assert!((gap.nominal() - 10.0).abs() < 1e-9);
//! assert!((gap.max_deviation() - 0.2).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::CalcResult;
use crate::scan::Scanner;
use crate::tolerance::{parse_dimension, CompareMode, ToleranceValue};

/// Sign of a term within a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Plus,
    Minus,
}

/// One parsed term: `count * [dimension]` with a sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackTerm {
    pub sign: Sign,
    pub count: u64,
    pub dimension: ToleranceValue,
}

/// A parsed stack expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackExpression {
    pub terms: Vec<StackTerm>,
}

impl StackExpression {
    /// Parse an expression without evaluating it.
    pub fn parse(input: &str) -> CalcResult<Self> {
        let mut scanner = Scanner::new(input);
        let mut terms = Vec::new();

        let mut sign = if scanner.eat('-') {
            Sign::Minus
        } else {
            scanner.eat('+');
            Sign::Plus
        };

        loop {
            terms.push(parse_term(&mut scanner, sign)?);
            sign = match scanner.eat_any(&['+', '-', '\u{2212}']) {
                Some('+') => Sign::Plus,
                Some(_) => Sign::Minus,
                None => break,
            };
        }

        if !scanner.is_at_end() {
            return Err(scanner.error("expected '+', '-' or end of expression"));
        }
        Ok(StackExpression { terms })
    }

    /// Accumulate every term into an empty value, left to right.
    pub fn evaluate(&self) -> CalcResult<ToleranceValue> {
        let mut total = ToleranceValue::default();
        for term in &self.terms {
            let mut contribution = term.dimension.clone();
            contribution.scale(term.count as f64)?;
            match term.sign {
                Sign::Plus => total.add(&contribution),
                Sign::Minus => total.subtract(&contribution),
            };
        }
        debug!(terms = self.terms.len(), result = %total, "evaluated stack");
        Ok(total)
    }
}

fn parse_term(scanner: &mut Scanner<'_>, sign: Sign) -> CalcResult<StackTerm> {
    scanner.skip_whitespace();
    let count = match scanner.peek() {
        Some(c) if c.is_ascii_digit() => {
            let count = scanner.integer().ok_or_else(|| scanner.error("expected repeat count"))?;
            if !scanner.eat('*') {
                return Err(scanner.error("expected '*' after repeat count"));
            }
            count
        }
        _ => 1,
    };
    if !scanner.eat('[') {
        return Err(scanner.error("expected '['"));
    }
    let dimension = parse_dimension(scanner)?;
    if !scanner.eat(']') {
        return Err(scanner.error("expected ']'"));
    }
    Ok(StackTerm {
        sign,
        count,
        dimension,
    })
}

/// Parse and evaluate a stack expression.
pub fn evaluate(input: &str) -> CalcResult<ToleranceValue> {
    StackExpression::parse(input)?.evaluate()
}

/// Input for a stored stack calculation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Gap at bearing seat",
///   "expression": "[40 +0.1/-0.1] - [25 +0.05/-0.05] - 2*[7 +0/-0.1]",
///   "requirement": "1 +0.35/-0.15",
///   "compare_mode": "equivalent"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackInput {
    #[serde(default)]
    pub label: String,
    pub expression: String,
    /// Dimension text, e.g. `1 +0.35/-0.15`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_mode: Option<CompareMode>,
}

/// Evaluate a stored stack. Without a compare mode, `exact` is used.
pub fn calculate(input: &StackInput) -> CalcResult<StackReport> {
    let requirement = input
        .requirement
        .as_deref()
        .map(str::parse::<ToleranceValue>)
        .transpose()?;
    let mut result = report(&input.expression, requirement, input.compare_mode.unwrap_or_default())?;
    result.label = input.label.clone();
    Ok(result)
}

/// Result of evaluating a stack, optionally checked against a requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackReport {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub expression: String,
    pub result: ToleranceValue,
    pub lower_bound: f64,
    pub upper_bound: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<ToleranceValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_mode: Option<CompareMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<bool>,
}

/// Evaluate `input` and, when given, compare the result against `requirement`.
pub fn report(input: &str, requirement: Option<ToleranceValue>, mode: CompareMode) -> CalcResult<StackReport> {
    let result = evaluate(input)?;
    let matches = requirement.as_ref().map(|r| result.compare(r, mode));
    Ok(StackReport {
        label: String::new(),
        expression: input.to_string(),
        lower_bound: result.lower_bound(),
        upper_bound: result.upper_bound(),
        compare_mode: requirement.as_ref().map(|_| mode),
        requirement,
        matches,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CalcError;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_term() {
        let value = evaluate("[5 +0.5/-0.2]").unwrap();
        assert!(close(value.nominal(), 5.0));
        assert_eq!(value.positive_terms().len(), 1);
    }

    #[test]
    fn test_subtraction_matches_method() {
        let value = evaluate("[5 +0.5/-0.2] - [3 +0.5/-0.2]").unwrap();
        assert!(close(value.nominal(), 2.0));
        assert!(close(value.min_deviation(), -0.7));
        assert!(close(value.max_deviation(), 0.7));
    }

    #[test]
    fn test_repeat_count() {
        let repeated = evaluate("3*[2 ±0.01]").unwrap();
        let spelled = evaluate("[2 ±0.01] + [2 ±0.01] + [2 ±0.01]").unwrap();
        assert!(repeated.compare(&spelled, CompareMode::Exact));
    }

    #[test]
    fn test_leading_minus() {
        let value = evaluate("-[4 +0.1/0] + [10 ±0.1]").unwrap();
        assert!(close(value.nominal(), 6.0));
        assert!(close(value.min_deviation(), -0.2));
        assert!(close(value.max_deviation(), 0.1));
    }

    #[test]
    fn test_parse_keeps_terms() {
        let expr = StackExpression::parse("[1] - 2*[0,5 ±0,1]").unwrap();
        assert_eq!(expr.terms.len(), 2);
        assert_eq!(expr.terms[1].sign, Sign::Minus);
        assert_eq!(expr.terms[1].count, 2);
        assert!(close(expr.terms[1].dimension.nominal(), 0.5));
    }

    #[test]
    fn test_syntax_errors_report_position() {
        match StackExpression::parse("[1] + [2").unwrap_err() {
            CalcError::ParseError { position, .. } => assert_eq!(position, 8),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(evaluate("").is_err());
        assert!(evaluate("[1] [2]").is_err());
        assert!(evaluate("2[1]").is_err());
    }

    #[test]
    fn test_report_with_requirement() {
        let requirement: ToleranceValue = "2 ±1".parse().unwrap();
        let result = report("[5 +0.5/-0.2] - [3 +0.5/-0.2]", Some(requirement), CompareMode::Linear(1.0)).unwrap();
        assert_eq!(result.matches, Some(true));
        assert!(close(result.upper_bound, 2.7));
    }

    #[test]
    fn test_calculate_stored_stack() {
        let input: StackInput = serde_json::from_str(
            r#"{
                "label": "Gap at bearing seat",
                "expression": "[40 +0.1/-0.1] - [25 +0.05/-0.05] - 2*[7 +0/-0.1]",
                "requirement": "1 +0.35/-0.15",
                "compare_mode": "equivalent"
            }"#,
        )
        .unwrap();
        let result = calculate(&input).unwrap();
        assert_eq!(result.label, "Gap at bearing seat");
        assert!(close(result.result.nominal(), 1.0));
        assert_eq!(result.matches, Some(true));

        let bad = StackInput {
            requirement: Some("not a dimension".to_string()),
            ..input
        };
        assert!(calculate(&bad).is_err());
    }
}
