//! # Tolerance Values
//!
//! A [`ToleranceValue`] is a nominal dimension with an asymmetric plus/minus
//! deviation. Values compound: adding, subtracting or scaling appends the
//! operand's *terms* to this value's term lists and recombines them, so the
//! full derivation history of a stack-up is kept.
//!
//! ## Worst-Case Model
//!
//! Deviations never cancel. A positive term contributes its deviations as-is;
//! a negative term contributes its *max* deviation to the lower side and its
//! *min* deviation to the upper side. Subtracting a dimension therefore widens
//! the resulting band exactly like adding it does.
//!
//! ```text
//! (5 +0.5/-0.2) - (3 +0.5/-0.2)  =  2 (+0.7/-0.7)
//! ```
//!
//! Root-sum-square ("statistical variation") combination is named in
//! [`CombinationModel`] but not implemented.
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::tolerance::ToleranceValue;
//!
//! let mut housing = ToleranceValue::new(5.0, 0.5, -0.2);
//! housing.add(&ToleranceValue::new(3.0, 0.1, -0.1));
//!
//! assert!((housing.nominal() - 8.0).abs() < 1e-12);
//! assert!((housing.max_deviation() - 0.6).abs() < 1e-12);
//! assert!((housing.min_deviation() + 0.3).abs() < 1e-12);
//! ```

use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::scan::Scanner;

/// Largest replication count accepted by [`ToleranceValue::scale`].
pub const MAX_SCALE_FACTOR: f64 = 1_000_000.0;

/// One elementary contribution to a compounded value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub nominal: f64,
    pub min_deviation: f64,
    pub max_deviation: f64,
}

/// How term lists are recombined into nominal and deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombinationModel {
    /// Sum of magnitudes, widest possible band
    #[default]
    WorstCase,
    /// Root-sum-square combination. Not implemented; selecting it fails.
    StatisticalVariation,
}

impl fmt::Display for CombinationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinationModel::WorstCase => write!(f, "worst-case"),
            CombinationModel::StatisticalVariation => write!(f, "statistical-variation"),
        }
    }
}

/// Rule used by [`ToleranceValue::matches`].
///
/// Textual forms: `exact`, `equivalent`, `linear.<digits>` where the digits
/// are the decimals of the required overlap ratio (`linear.5` = 50 %), or
/// `linear:<ratio>` for ratios that are not a plain fraction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CompareMode {
    /// Nominal and both deviations must match.
    /// `(5 +0.5/-0.2)` differs from `(5.2 +0.3/-0.4)`.
    #[default]
    Exact,
    /// Bound intervals must match.
    /// `(5 +0.5/-0.2)` equals `(5.2 +0.3/-0.4)`.
    Equivalent,
    /// Overlap of the two intervals, divided by the width of the value doing
    /// the comparison, must reach the ratio. Only tested in one direction, so
    /// `a` may match `b` while `b` does not match `a`.
    Linear(f64),
}

impl FromStr for CompareMode {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        match text.as_str() {
            "exact" => return Ok(CompareMode::Exact),
            "equivalent" => return Ok(CompareMode::Equivalent),
            _ => {}
        }
        let ratio = if let Some(digits) = text.strip_prefix("linear.") {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(CalcError::parse(s, 7, "expected digits after 'linear.'"));
            }
            format!("0.{}", digits).parse::<f64>().ok()
        } else if let Some(number) = text.strip_prefix("linear:") {
            number.parse::<f64>().ok()
        } else {
            return Err(CalcError::parse(s, 0, "expected 'exact', 'equivalent' or 'linear.<digits>'"));
        };
        match ratio {
            Some(r) if r.is_finite() && r >= 0.0 => Ok(CompareMode::Linear(r)),
            _ => Err(CalcError::parse(s, 7, "overlap ratio must be a non-negative number")),
        }
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareMode::Exact => write!(f, "exact"),
            CompareMode::Equivalent => write!(f, "equivalent"),
            CompareMode::Linear(ratio) => {
                let text = ratio.to_string();
                match text.strip_prefix("0.") {
                    Some(digits) => write!(f, "linear.{}", digits),
                    None => write!(f, "linear:{}", text),
                }
            }
        }
    }
}

impl TryFrom<String> for CompareMode {
    type Error = CalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CompareMode> for String {
    fn from(mode: CompareMode) -> Self {
        mode.to_string()
    }
}

/// Operators that may be requested through [`ToleranceValue::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    MatMul,
    Shift,
    Bitwise,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::FloorDivide => "floor-divide",
            ArithmeticOp::Modulo => "modulo",
            ArithmeticOp::Power => "power",
            ArithmeticOp::MatMul => "matmul",
            ArithmeticOp::Shift => "shift",
            ArithmeticOp::Bitwise => "bitwise",
        };
        write!(f, "{}", name)
    }
}

/// Right-hand side of an [`ArithmeticOp`].
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Dimension(&'a ToleranceValue),
    Scalar(f64),
}

impl Operand<'_> {
    fn kind(&self) -> String {
        match self {
            Operand::Dimension(d) => format!("dimension {}", d),
            Operand::Scalar(k) => format!("scalar {}", k),
        }
    }
}

/// A dimension with asymmetric tolerance and its compounding history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ToleranceRecord")]
pub struct ToleranceValue {
    nominal: f64,
    min_deviation: f64,
    max_deviation: f64,
    lower_bound: f64,
    upper_bound: f64,
    positive_terms: Vec<Term>,
    negative_terms: Vec<Term>,
    compare_mode: CompareMode,
    model: CombinationModel,
}

/// Serialized shape accepted on load; recombined values are recomputed.
#[derive(Deserialize)]
struct ToleranceRecord {
    positive_terms: Vec<Term>,
    #[serde(default)]
    negative_terms: Vec<Term>,
    #[serde(default)]
    compare_mode: CompareMode,
    #[serde(default)]
    model: CombinationModel,
}

impl TryFrom<ToleranceRecord> for ToleranceValue {
    type Error = CalcError;

    fn try_from(record: ToleranceRecord) -> Result<Self, Self::Error> {
        let mut value = ToleranceValue {
            positive_terms: record.positive_terms,
            negative_terms: record.negative_terms,
            compare_mode: record.compare_mode,
            ..ToleranceValue::default()
        }
        .with_model(record.model)?;
        value.recompute();
        Ok(value)
    }
}

impl Default for ToleranceValue {
    /// The empty accumulator: no terms, every value zero.
    fn default() -> Self {
        ToleranceValue {
            nominal: 0.0,
            min_deviation: 0.0,
            max_deviation: 0.0,
            lower_bound: 0.0,
            upper_bound: 0.0,
            positive_terms: Vec::new(),
            negative_terms: Vec::new(),
            compare_mode: CompareMode::default(),
            model: CombinationModel::default(),
        }
    }
}

impl ToleranceValue {
    /// Create a value from a nominal and two deviations, in either order.
    pub fn new(nominal: f64, deviation_a: f64, deviation_b: f64) -> Self {
        let term = Term {
            nominal,
            min_deviation: deviation_a.min(deviation_b),
            max_deviation: deviation_a.max(deviation_b),
        };
        let mut value = ToleranceValue {
            positive_terms: vec![term],
            ..ToleranceValue::default()
        };
        value.recompute();
        value
    }

    /// Create a value with a symmetric tolerance `±deviation`.
    pub fn symmetric(nominal: f64, deviation: f64) -> Self {
        Self::new(nominal, deviation, -deviation)
    }

    /// Set the comparison rule used by [`matches`](Self::matches).
    pub fn with_compare_mode(mut self, mode: CompareMode) -> Self {
        self.compare_mode = mode;
        self
    }

    /// Select the combination model.
    ///
    /// Only [`CombinationModel::WorstCase`] is implemented.
    pub fn with_model(mut self, model: CombinationModel) -> CalcResult<Self> {
        if model != CombinationModel::WorstCase {
            return Err(CalcError::unsupported("combine", format!("{} model", model)));
        }
        self.model = model;
        Ok(self)
    }

    pub fn set_compare_mode(&mut self, mode: CompareMode) {
        self.compare_mode = mode;
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn min_deviation(&self) -> f64 {
        self.min_deviation
    }

    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }

    /// `nominal + min_deviation`
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// `nominal + max_deviation`
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Width of the tolerance band.
    pub fn band(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    pub fn positive_terms(&self) -> &[Term] {
        &self.positive_terms
    }

    pub fn negative_terms(&self) -> &[Term] {
        &self.negative_terms
    }

    pub fn compare_mode(&self) -> CompareMode {
        self.compare_mode
    }

    pub fn model(&self) -> CombinationModel {
        self.model
    }

    /// Accumulate `other` into this value.
    pub fn add(&mut self, other: &ToleranceValue) -> &mut Self {
        self.positive_terms.extend_from_slice(&other.positive_terms);
        self.negative_terms.extend_from_slice(&other.negative_terms);
        self.recompute();
        self
    }

    /// Accumulate `other` into this value with opposite sign.
    pub fn subtract(&mut self, other: &ToleranceValue) -> &mut Self {
        self.positive_terms.extend_from_slice(&other.negative_terms);
        self.negative_terms.extend_from_slice(&other.positive_terms);
        self.recompute();
        self
    }

    /// Replicate every term `factor` times.
    ///
    /// Fails with [`CalcError::NonIntegralScale`] for fractional factors and
    /// leaves the value untouched.
    pub fn scale(&mut self, factor: f64) -> CalcResult<&mut Self> {
        if !factor.is_finite() || factor.fract() != 0.0 {
            return Err(CalcError::NonIntegralScale { factor });
        }
        if factor < 0.0 {
            return Err(CalcError::unsupported("scale", format!("negative factor {}", factor)));
        }
        if factor > MAX_SCALE_FACTOR {
            return Err(CalcError::invalid_input(
                "factor",
                factor.to_string(),
                format!("Scale factor exceeds {}", MAX_SCALE_FACTOR),
            ));
        }
        let count = factor as usize;
        self.positive_terms = self.positive_terms.repeat(count);
        self.negative_terms = self.negative_terms.repeat(count);
        self.recompute();
        Ok(self)
    }

    /// Apply an arbitrary operator. Only dimension `+`/`-` and integral
    /// scalar `*` are defined; anything else reports
    /// [`CalcError::UnsupportedOperation`] without touching the value.
    pub fn apply(&mut self, op: ArithmeticOp, operand: Operand<'_>) -> CalcResult<&mut Self> {
        match (op, operand) {
            (ArithmeticOp::Add, Operand::Dimension(other)) => Ok(self.add(other)),
            (ArithmeticOp::Subtract, Operand::Dimension(other)) => Ok(self.subtract(other)),
            (ArithmeticOp::Multiply, Operand::Scalar(factor)) => self.scale(factor),
            (op, operand) => Err(CalcError::unsupported(op.to_string(), operand.kind())),
        }
    }

    /// Recombine the term lists into nominal, deviations and bounds.
    pub fn recompute(&mut self) {
        match self.model {
            CombinationModel::WorstCase | CombinationModel::StatisticalVariation => {
                let mut nominal = 0.0;
                let mut min_deviation = 0.0;
                let mut max_deviation = 0.0;
                for term in &self.positive_terms {
                    nominal += term.nominal;
                    min_deviation += term.min_deviation;
                    max_deviation += term.max_deviation;
                }
                for term in &self.negative_terms {
                    nominal -= term.nominal;
                    min_deviation -= term.max_deviation;
                    max_deviation -= term.min_deviation;
                }
                self.nominal = nominal;
                self.min_deviation = min_deviation;
                self.max_deviation = max_deviation;
            }
        }
        self.lower_bound = self.nominal + self.min_deviation;
        self.upper_bound = self.nominal + self.max_deviation;
    }

    /// Compare against `other` using an explicit mode.
    pub fn compare(&self, other: &ToleranceValue, mode: CompareMode) -> bool {
        match mode {
            CompareMode::Exact => {
                approx_eq(self.nominal, other.nominal)
                    && approx_eq(self.min_deviation, other.min_deviation)
                    && approx_eq(self.max_deviation, other.max_deviation)
            }
            CompareMode::Equivalent => {
                approx_eq(self.lower_bound, other.lower_bound) && approx_eq(self.upper_bound, other.upper_bound)
            }
            CompareMode::Linear(ratio) => {
                let width = self.band();
                let overlap = self.upper_bound.min(other.upper_bound) - self.lower_bound.max(other.lower_bound);
                if approx_eq(width, 0.0) {
                    return other.contains(self.nominal);
                }
                overlap / width >= ratio
            }
        }
    }

    /// Compare against `other` using this value's own compare mode.
    pub fn matches(&self, other: &ToleranceValue) -> bool {
        self.compare(other, self.compare_mode)
    }

    /// Whether `value` lies within the bounds (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound - epsilon(self.lower_bound) && value <= self.upper_bound + epsilon(self.upper_bound)
    }
}

/// Equality within floating-point noise.
fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= epsilon(a.abs().max(b.abs()))
}

fn epsilon(scale: f64) -> f64 {
    1e-9 * scale.abs().max(1.0)
}

impl AddAssign<&ToleranceValue> for ToleranceValue {
    fn add_assign(&mut self, rhs: &ToleranceValue) {
        self.add(rhs);
    }
}

impl SubAssign<&ToleranceValue> for ToleranceValue {
    fn sub_assign(&mut self, rhs: &ToleranceValue) {
        self.subtract(rhs);
    }
}

impl fmt::Display for ToleranceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:+}/{:+})", self.nominal, self.max_deviation, self.min_deviation)
    }
}

impl FromStr for ToleranceValue {
    type Err = CalcError;

    /// Parse `5 +0.5/-0.2`, `5 +0.5 -0.2`, `5 (+0.5/-0.2)`, `5 ±0.1`,
    /// `5 +-0.1`, `5 +/-0.1` or a bare nominal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scanner = Scanner::new(s);
        let value = parse_dimension(&mut scanner)?;
        if !scanner.is_at_end() {
            return Err(scanner.error("unexpected trailing input"));
        }
        Ok(value)
    }
}

/// Read one dimension from `scanner`, stopping at the first character that
/// cannot continue it.
pub(crate) fn parse_dimension(scanner: &mut Scanner<'_>) -> CalcResult<ToleranceValue> {
    let nominal = scanner
        .signed_number()
        .ok_or_else(|| scanner.error("expected nominal value"))?;
    let parenthesized = scanner.eat('(');

    scanner.skip_whitespace();
    let symmetric = scanner.eat('\u{00B1}') || scanner.eat_word("+/-") || scanner.eat_word("+-");

    let value = if symmetric {
        let deviation = scanner
            .signed_number()
            .ok_or_else(|| scanner.error("expected deviation after '±'"))?;
        ToleranceValue::symmetric(nominal, deviation.abs())
    } else {
        match scanner.signed_number() {
            None => ToleranceValue::new(nominal, 0.0, 0.0),
            Some(first) => {
                scanner.eat('/');
                let second = scanner
                    .signed_number()
                    .ok_or_else(|| scanner.error("expected second deviation"))?;
                ToleranceValue::new(nominal, first, second)
            }
        }
    };

    if parenthesized && !scanner.eat(')') {
        return Err(scanner.error("expected ')'"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_construction_orders_deviations() {
        let dim = ToleranceValue::new(10.0, -0.1, 0.3);
        assert_eq!(dim.min_deviation(), -0.1);
        assert_eq!(dim.max_deviation(), 0.3);
        assert!(close(dim.lower_bound(), 9.9));
        assert!(close(dim.upper_bound(), 10.3));
        assert_eq!(dim.positive_terms().len(), 1);
        assert!(dim.negative_terms().is_empty());
    }

    #[test]
    fn test_symmetric_construction() {
        let dim = ToleranceValue::symmetric(4.0, 0.05);
        assert_eq!(dim.min_deviation(), -0.05);
        assert_eq!(dim.max_deviation(), 0.05);
    }

    #[test]
    fn test_same_sign_deviations_allowed() {
        let dim = ToleranceValue::new(20.0, 0.1, 0.3);
        assert_eq!(dim.min_deviation(), 0.1);
        assert!(close(dim.lower_bound(), 20.1));
    }

    #[test]
    fn test_add_sums_all_columns() {
        let mut a = ToleranceValue::new(5.0, 0.5, -0.2);
        a.add(&ToleranceValue::new(3.0, 0.1, -0.1));
        assert!(close(a.nominal(), 8.0));
        assert!(close(a.min_deviation(), -0.3));
        assert!(close(a.max_deviation(), 0.6));
        assert_eq!(a.positive_terms().len(), 2);
    }

    #[test]
    fn test_subtract_widens_band() {
        let mut a = ToleranceValue::new(5.0, 0.5, -0.2);
        a.subtract(&ToleranceValue::new(3.0, 0.5, -0.2));
        assert!(close(a.nominal(), 2.0));
        assert!(close(a.min_deviation(), -0.7));
        assert!(close(a.max_deviation(), 0.7));
        assert_eq!(a.negative_terms().len(), 1);
    }

    #[test]
    fn test_subtract_of_compound_swaps_term_lists() {
        let mut inner = ToleranceValue::new(10.0, 0.1, -0.1);
        inner.subtract(&ToleranceValue::new(4.0, 0.2, 0.0));
        let mut outer = ToleranceValue::new(20.0, 0.0, 0.0);
        outer.subtract(&inner);
        // 20 - (10 - 4) = 14, every deviation magnitude accumulates
        assert!(close(outer.nominal(), 14.0));
        assert!(close(outer.min_deviation(), -0.1));
        assert!(close(outer.max_deviation(), 0.3));
        assert_eq!(outer.positive_terms().len(), 2);
        assert_eq!(outer.negative_terms().len(), 1);
    }

    #[test]
    fn test_operator_traits() {
        let mut a = ToleranceValue::symmetric(10.0, 0.1);
        a += &ToleranceValue::symmetric(5.0, 0.1);
        a -= &ToleranceValue::symmetric(3.0, 0.1);
        assert!(close(a.nominal(), 12.0));
        assert!(close(a.max_deviation(), 0.3));
    }

    #[test]
    fn test_scale_matches_repeated_add() {
        let original = ToleranceValue::new(2.5, 0.05, -0.02);
        let mut scaled = original.clone();
        scaled.scale(3.0).unwrap();

        let mut accumulator = ToleranceValue::default();
        for _ in 0..3 {
            accumulator.add(&original);
        }
        assert!(scaled.compare(&accumulator, CompareMode::Exact));
        assert_eq!(scaled.positive_terms().len(), 3);
    }

    #[test]
    fn test_scale_zero_empties_value() {
        let mut dim = ToleranceValue::symmetric(7.0, 0.2);
        dim.scale(0.0).unwrap();
        assert!(dim.positive_terms().is_empty());
        assert_eq!(dim.nominal(), 0.0);
        assert_eq!(dim.band(), 0.0);
    }

    #[test]
    fn test_non_integral_scale_fails_without_mutation() {
        let mut dim = ToleranceValue::symmetric(7.0, 0.2);
        let err = dim.scale(1.5).unwrap_err();
        assert_eq!(err, CalcError::NonIntegralScale { factor: 1.5 });
        assert_eq!(dim.positive_terms().len(), 1);
        assert_eq!(dim.nominal(), 7.0);
    }

    #[test]
    fn test_negative_scale_unsupported() {
        let mut dim = ToleranceValue::symmetric(7.0, 0.2);
        assert_eq!(dim.scale(-2.0).unwrap_err().error_code(), "UNSUPPORTED_OPERATION");
    }

    #[test]
    fn test_apply_rejects_undefined_operators() {
        let mut a = ToleranceValue::symmetric(10.0, 0.1);
        let b = ToleranceValue::symmetric(2.0, 0.1);
        for op in [
            ArithmeticOp::Divide,
            ArithmeticOp::FloorDivide,
            ArithmeticOp::Modulo,
            ArithmeticOp::Power,
            ArithmeticOp::MatMul,
            ArithmeticOp::Shift,
            ArithmeticOp::Bitwise,
            ArithmeticOp::Multiply,
        ] {
            let err = a.apply(op, Operand::Dimension(&b)).unwrap_err();
            assert!(matches!(err, CalcError::UnsupportedOperation { .. }));
        }
        let err = a.apply(ArithmeticOp::Add, Operand::Scalar(2.0)).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(a.positive_terms().len(), 1);

        a.apply(ArithmeticOp::Multiply, Operand::Scalar(2.0)).unwrap();
        assert!(close(a.nominal(), 20.0));
    }

    #[test]
    fn test_statistical_model_not_available() {
        let result = ToleranceValue::symmetric(1.0, 0.1).with_model(CombinationModel::StatisticalVariation);
        assert!(matches!(result, Err(CalcError::UnsupportedOperation { .. })));
    }

    #[test]
    fn test_compare_exact_and_equivalent() {
        let a = ToleranceValue::new(5.0, 0.5, -0.2);
        let b = ToleranceValue::new(5.2, 0.3, -0.4);
        assert!(!a.compare(&b, CompareMode::Exact));
        assert!(a.compare(&b, CompareMode::Equivalent));
        assert!(a.compare(&a.clone(), CompareMode::Exact));
    }

    #[test]
    fn test_compare_linear_overlap() {
        let a = ToleranceValue::new(5.0, 0.5, -0.2).with_compare_mode("linear.5".parse().unwrap());
        let shifted = ToleranceValue::new(5.5, 0.2, -0.5);
        let far = ToleranceValue::new(5.5, 0.5, -0.2);
        assert!(a.matches(&shifted));
        assert!(!a.matches(&far));
    }

    #[test]
    fn test_compare_linear_is_directional() {
        let narrow = ToleranceValue::symmetric(10.0, 0.1);
        let wide = ToleranceValue::symmetric(10.5, 1.0);
        let mode = CompareMode::Linear(0.9);
        // narrow band lies fully inside wide band, not the other way round
        assert!(narrow.compare(&wide, mode));
        assert!(!wide.compare(&narrow, mode));
    }

    #[test]
    fn test_compare_mode_text_forms() {
        assert_eq!("exact".parse::<CompareMode>().unwrap(), CompareMode::Exact);
        assert_eq!("Equivalent".parse::<CompareMode>().unwrap(), CompareMode::Equivalent);
        assert_eq!("linear.75".parse::<CompareMode>().unwrap(), CompareMode::Linear(0.75));
        assert_eq!("linear:1".parse::<CompareMode>().unwrap(), CompareMode::Linear(1.0));
        assert_eq!(CompareMode::Linear(0.5).to_string(), "linear.5");
        assert_eq!(CompareMode::Linear(1.0).to_string(), "linear:1");
        assert!("linear.".parse::<CompareMode>().is_err());
        assert!("fuzzy".parse::<CompareMode>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ToleranceValue::new(5.0, 0.5, -0.2).to_string(), "5 (+0.5/-0.2)");
    }

    #[test]
    fn test_parse_forms() {
        let a: ToleranceValue = "5 +0.5/-0.2".parse().unwrap();
        assert_eq!(a.max_deviation(), 0.5);
        assert_eq!(a.min_deviation(), -0.2);

        let b: ToleranceValue = "5 (+0.5/-0.2)".parse().unwrap();
        assert!(a.compare(&b, CompareMode::Exact));

        let c: ToleranceValue = "12,5 ±0,1".parse().unwrap();
        assert_eq!(c.nominal(), 12.5);
        assert_eq!(c.max_deviation(), 0.1);

        let d: ToleranceValue = "3 +/-0.05".parse().unwrap();
        assert_eq!(d.min_deviation(), -0.05);

        let e: ToleranceValue = "8".parse().unwrap();
        assert_eq!(e.band(), 0.0);

        assert!("5 +0.5/".parse::<ToleranceValue>().is_err());
        assert!("abc".parse::<ToleranceValue>().is_err());
    }

    #[test]
    fn test_serialization_recomputes() {
        let mut stack = ToleranceValue::new(5.0, 0.5, -0.2);
        stack.subtract(&ToleranceValue::new(3.0, 0.5, -0.2));
        let json = serde_json::to_string(&stack).unwrap();
        assert!(json.contains("positive_terms"));

        let tampered = json.replace("\"nominal\":2.0", "\"nominal\":99.0");
        let roundtrip: ToleranceValue = serde_json::from_str(&tampered).unwrap();
        assert!(close(roundtrip.nominal(), 2.0));
        assert!(close(roundtrip.max_deviation(), 0.7));
    }
}
