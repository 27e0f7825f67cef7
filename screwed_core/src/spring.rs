//! # Helical Compression Spring
//!
//! Spring geometry as a parameter graph: any consistent subset of diameters,
//! wire size, coil angle/pitch/count, free height and elastic constants
//! defines the rest.
//!
//! ## Geometry Rules
//!
//! | Slot                | Derived from (priority order)                          |
//! |---------------------|--------------------------------------------------------|
//! | `mean_diameter`     | ext − w; int + w; p / (π tan α); H / (π n tan α)        |
//! | `external_diameter` | mean + w; int + 2w                                     |
//! | `internal_diameter` | mean − w; ext − 2w                                     |
//! | `wire_width`        | ext − mean; mean − int; (ext − int) / 2                |
//! | `coil_angle`        | atan(p / (π mean))                                     |
//! | `coil_pitch`        | π mean tan α; H / n                                    |
//! | `coil_count`        | H / p                                                  |
//! | `height`            | n · p                                                  |
//!
//! Elastic constants follow `G = E / (2 (1 + ν))` in every direction.
//!
//! ## Wire Shape
//!
//! Round wire has a single `wire_diameter` (stored as the wire width);
//! rectangular wire has an independent width and height. Mixing the two
//! on one spring is refused.
//!
//! ## Deflection and Shear (Roark)
//!
//! For outer diameter `D`, wire width `w`, wire height `h`, active coils `n`,
//! load `P`, shear modulus `G`, with `a = max(w,h)/2`, `b = min(w,h)/2`,
//! `R = (D − w)/2`, `c = R/b`:
//!
//! ```text
//! square/round:  f = 2.789 P R³ n / (G b⁴)
//!                τ = 4.8 P R / (8 b³) · K
//! rectangular:   f = 3π P R³ n / (8 G b⁴) / (a/b − 0.627 (tanh(π b / 2a) + 0.004))
//!                τ = P R (3b + 1.8a) / (8 b² a²) · K
//! K = 1 + 1.2/c + 0.56/c² + 0.5/c³
//! ```
//!
//! Valid for `c > 3`, and `c > 5` when the wire is flat (`w > h`).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CalcError, CalcResult};
use crate::graph::{ParameterGraph, Rule, Slot, SlotReport, Validator};
use crate::materials::Material;

/// Cross-section of the spring wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireShape {
    Round,
    Rectangular,
}

fn canonical_name(name: &str) -> &str {
    match name {
        "D" | "de" | "od" => "external_diameter",
        "di" | "id" => "internal_diameter",
        "dm" => "mean_diameter",
        "L0" | "h0" => "height",
        "n" => "coil_count",
        "p" => "coil_pitch",
        "v" | "nu" | "poissonsratio" => "poissons_ratio",
        "E" | "elasticitymodulus" => "elasticity_modulus",
        "G" | "rigiditymodulus" => "rigidity_modulus",
        other => other,
    }
}

/// Spring parameter graph plus wire shape.
#[derive(Debug, Clone)]
pub struct Spring {
    graph: ParameterGraph,
    wire_shape: Option<WireShape>,
}

impl Spring {
    pub fn new() -> CalcResult<Self> {
        let mut graph = ParameterGraph::new("spring");

        graph
            .declare(
                Slot::input("mean_diameter")
                    .validator(Validator::positive())
                    .rule(Rule::compute("ext - w", &["external_diameter", "wire_width"], |v| v[0] - v[1]))
                    .rule(Rule::compute("int + w", &["internal_diameter", "wire_width"], |v| v[0] + v[1]))
                    .rule(Rule::compute("p / (pi tan a)", &["coil_pitch", "coil_angle"], |v| {
                        v[0] / (PI * v[1].tan())
                    }))
                    .rule(Rule::compute(
                        "H / (pi n tan a)",
                        &["height", "coil_count", "coil_angle"],
                        |v| v[0] / (PI * v[1] * v[2].tan()),
                    )),
            )?
            .declare(
                Slot::input("external_diameter")
                    .validator(Validator::positive())
                    .rule(Rule::compute("mean + w", &["mean_diameter", "wire_width"], |v| v[0] + v[1]))
                    .rule(Rule::compute("int + 2w", &["internal_diameter", "wire_width"], |v| v[0] + 2.0 * v[1])),
            )?
            .declare(
                Slot::input("internal_diameter")
                    .validator(Validator::non_negative())
                    .rule(Rule::compute("mean - w", &["mean_diameter", "wire_width"], |v| v[0] - v[1]))
                    .rule(Rule::compute("ext - 2w", &["external_diameter", "wire_width"], |v| v[0] - 2.0 * v[1])),
            )?
            .declare(
                Slot::input("height")
                    .validator(Validator::positive())
                    .rule(Rule::compute("n p", &["coil_count", "coil_pitch"], |v| v[0] * v[1])),
            )?
            .declare(
                Slot::input("wire_width")
                    .validator(Validator::positive())
                    .rule(Rule::compute("ext - mean", &["external_diameter", "mean_diameter"], |v| v[0] - v[1]))
                    .rule(Rule::compute("mean - int", &["mean_diameter", "internal_diameter"], |v| v[0] - v[1]))
                    .rule(Rule::compute("(ext - int) / 2", &["external_diameter", "internal_diameter"], |v| {
                        (v[0] - v[1]) / 2.0
                    })),
            )?
            .declare(Slot::input("wire_height").validator(Validator::positive()))?
            .declare(
                Slot::input("coil_angle")
                    .validator(Validator::half_open(0.0, PI / 2.0))
                    .rule(Rule::compute("atan(p / (pi mean))", &["coil_pitch", "mean_diameter"], |v| {
                        (v[0] / (PI * v[1])).atan()
                    })),
            )?
            .declare(
                Slot::input("coil_pitch")
                    .validator(Validator::positive())
                    .rule(Rule::compute("pi mean tan a", &["mean_diameter", "coil_angle"], |v| {
                        PI * v[0] * v[1].tan()
                    }))
                    .rule(Rule::compute("H / n", &["height", "coil_count"], |v| v[0] / v[1])),
            )?
            .declare(
                Slot::input("coil_count")
                    .validator(Validator::positive())
                    .rule(Rule::compute("H / p", &["height", "coil_pitch"], |v| v[0] / v[1])),
            )?
            .declare(
                Slot::input("poissons_ratio")
                    .rule(Rule::compute("E / 2G - 1", &["elasticity_modulus", "rigidity_modulus"], |v| {
                        v[0] / (2.0 * v[1]) - 1.0
                    })),
            )?
            .declare(
                Slot::input("elasticity_modulus")
                    .validator(Validator::positive())
                    .rule(Rule::compute("2G (1 + v)", &["rigidity_modulus", "poissons_ratio"], |v| {
                        2.0 * v[0] * (1.0 + v[1])
                    })),
            )?
            .declare(
                Slot::input("rigidity_modulus")
                    .validator(Validator::positive())
                    .rule(Rule::compute("E / (2 (1 + v))", &["elasticity_modulus", "poissons_ratio"], |v| {
                        v[0] / (2.0 * (1.0 + v[1]))
                    })),
            )?;

        Ok(Spring {
            graph,
            wire_shape: None,
        })
    }

    pub fn graph(&self) -> &ParameterGraph {
        &self.graph
    }

    pub fn wire_shape(&self) -> Option<WireShape> {
        self.wire_shape
    }

    /// Assign a geometry or elastic parameter by slot name or alias.
    ///
    /// Wire dimensions go through [`set_wire_diameter`](Self::set_wire_diameter)
    /// or [`set_wire_width`](Self::set_wire_width) /
    /// [`set_wire_height`](Self::set_wire_height).
    pub fn assign(&mut self, name: &str, value: f64) -> CalcResult<()> {
        match canonical_name(name) {
            "wire_diameter" => self.set_wire_diameter(value),
            "wire_width" => self.set_wire_width(value),
            "wire_height" => self.set_wire_height(value),
            slot => self.graph.assign(slot, value),
        }
    }

    pub fn delete(&mut self, name: &str) -> CalcResult<()> {
        match canonical_name(name) {
            "wire_diameter" => self.delete_wire_diameter(),
            slot => self.graph.delete(slot),
        }
    }

    pub fn value(&self, name: &str) -> CalcResult<f64> {
        match canonical_name(name) {
            "wire_diameter" => self.wire_diameter(),
            "wire_height" => self.wire_height(),
            slot => self.graph.value(slot),
        }
    }

    /// Take elasticity modulus and Poisson's ratio from a material.
    pub fn set_material(&mut self, material: &Material) -> CalcResult<()> {
        if let Some(e) = material.elasticity_modulus {
            self.graph.assign("elasticity_modulus", e)?;
        }
        if let Some(v) = material.poissons_ratio {
            self.graph.assign("poissons_ratio", v)?;
        }
        Ok(())
    }

    pub fn set_wire_diameter(&mut self, value: f64) -> CalcResult<()> {
        if self.wire_shape == Some(WireShape::Rectangular) {
            return Err(CalcError::invalid_input(
                "wire_diameter",
                value.to_string(),
                "Unavailable, rectangular wire selected",
            ));
        }
        self.graph.assign("wire_width", value)?;
        self.wire_shape = Some(WireShape::Round);
        Ok(())
    }

    pub fn set_wire_width(&mut self, value: f64) -> CalcResult<()> {
        self.set_rectangular("wire_width", value)
    }

    pub fn set_wire_height(&mut self, value: f64) -> CalcResult<()> {
        self.set_rectangular("wire_height", value)
    }

    fn set_rectangular(&mut self, slot: &str, value: f64) -> CalcResult<()> {
        if self.wire_shape == Some(WireShape::Round) {
            return Err(CalcError::invalid_input(
                slot,
                value.to_string(),
                "'wire_width' and 'wire_height' unavailable, round wire selected",
            ));
        }
        self.graph.assign(slot, value)?;
        self.wire_shape = Some(WireShape::Rectangular);
        Ok(())
    }

    /// Clear the wire diameter and forget the wire shape.
    pub fn delete_wire_diameter(&mut self) -> CalcResult<()> {
        if self.wire_shape == Some(WireShape::Rectangular) {
            return Err(CalcError::not_defined("wire_diameter"));
        }
        self.graph.delete("wire_width")?;
        self.wire_shape = None;
        Ok(())
    }

    /// Wire diameter of a round-wire spring. A wire size derived from the
    /// diameters with no shape chosen is taken as round.
    pub fn wire_diameter(&self) -> CalcResult<f64> {
        match self.wire_shape {
            Some(WireShape::Rectangular) => Err(CalcError::not_defined("wire_diameter")),
            Some(WireShape::Round) => self.graph.value("wire_width"),
            None => {
                let width = self
                    .graph
                    .resolve("wire_width")
                    .ok_or_else(|| CalcError::not_defined("wire_diameter"))?;
                warn!(sources = ?width.defining_set, "wire_diameter derived from other parameters, assuming round wire");
                Ok(width.value)
            }
        }
    }

    /// Wire height; equals the diameter for round wire.
    pub fn wire_height(&self) -> CalcResult<f64> {
        match self.wire_shape {
            Some(WireShape::Rectangular) => self.graph.value("wire_height"),
            _ => self.wire_diameter(),
        }
    }

    /// Deflection and shear stress under `load`.
    pub fn load_case(&self, load: f64) -> CalcResult<LoadCase> {
        let [external_diameter, wire_width, coil_count, rigidity_modulus] = self.graph.values([
            "external_diameter",
            "wire_width",
            "coil_count",
            "rigidity_modulus",
        ])?;
        let wire_height = self.wire_height()?;
        deflection_and_shear(external_diameter, wire_width, wire_height, coil_count, load, rigidity_modulus)
    }

    pub fn snapshot(&self) -> Vec<SlotReport> {
        self.graph.snapshot()
    }
}

// ============================================================================
// Roark formulas
// ============================================================================

/// Deflection and maximum shear stress of one load case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadCase {
    pub load: f64,
    pub deflection: f64,
    pub shear_stress: f64,
    /// `load / deflection`
    pub rate: f64,
}

/// Closed-form deflection and shear stress of a helical spring with round,
/// square or rectangular wire.
///
/// `external_diameter` is the outer coil diameter.
pub fn deflection_and_shear(
    external_diameter: f64,
    wire_width: f64,
    wire_height: f64,
    coil_count: f64,
    load: f64,
    rigidity_modulus: f64,
) -> CalcResult<LoadCase> {
    if wire_width <= 0.0 || wire_height <= 0.0 || rigidity_modulus <= 0.0 {
        return Err(CalcError::calculation_failed(
            "spring",
            "Wire dimensions and rigidity modulus must be positive",
        ));
    }
    let a = wire_width.max(wire_height) / 2.0;
    let b = wire_width.min(wire_height) / 2.0;
    let r = (external_diameter - wire_width) / 2.0;
    let c = r / b;

    let limit = if wire_width > wire_height { 5.0 } else { 3.0 };
    if c <= limit {
        return Err(CalcError::calculation_failed(
            "spring",
            format!("Spring index {:.3} outside formula range (must exceed {})", c, limit),
        ));
    }
    let correction = 1.0 + 1.2 / c + 0.56 / c.powi(2) + 0.5 / c.powi(3);

    let (deflection, shear_stress) = if wire_width == wire_height {
        (
            2.789 * load * r.powi(3) * coil_count / (rigidity_modulus * b.powi(4)),
            4.8 * load * r / (8.0 * b.powi(3)) * correction,
        )
    } else {
        let shape = a / b - 0.627 * ((PI * b / (2.0 * a)).tanh() + 0.004);
        (
            3.0 * PI * load * r.powi(3) * coil_count / (8.0 * rigidity_modulus * b.powi(4)) / shape,
            load * r * (3.0 * b + 1.8 * a) / (8.0 * b.powi(2) * a.powi(2)) * correction,
        )
    };

    Ok(LoadCase {
        load,
        deflection,
        shear_stress,
        rate: load / deflection,
    })
}

/// Input for a deflection/stress table over wire sizes.
///
/// ## JSON Example
///
/// ```json
/// {
///   "external_diameter": 40.0,
///   "wire_widths": [3.0, 4.0, 5.0],
///   "wire_heights": [3.0, 4.0],
///   "coil_count": 8.0,
///   "load": 100.0,
///   "rigidity_modulus": 81500.0
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringTableInput {
    #[serde(default)]
    pub label: String,
    pub external_diameter: f64,
    pub wire_widths: Vec<f64>,
    pub wire_heights: Vec<f64>,
    pub coil_count: f64,
    pub load: f64,
    pub rigidity_modulus: f64,
}

/// Rows are wire heights, columns wire widths. Cells outside the formula
/// range are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringTable {
    pub wire_widths: Vec<f64>,
    pub wire_heights: Vec<f64>,
    pub cells: Vec<Vec<Option<LoadCase>>>,
}

pub fn spring_table(input: &SpringTableInput) -> CalcResult<SpringTable> {
    if input.wire_widths.is_empty() || input.wire_heights.is_empty() {
        return Err(CalcError::invalid_input(
            "wire_widths",
            format!("{} x {}", input.wire_widths.len(), input.wire_heights.len()),
            "At least one wire width and one wire height are required",
        ));
    }
    let cells = input
        .wire_heights
        .iter()
        .map(|&h| {
            input
                .wire_widths
                .iter()
                .map(|&w| {
                    match deflection_and_shear(input.external_diameter, w, h, input.coil_count, input.load, input.rigidity_modulus) {
                        Ok(case) => Some(case),
                        Err(e) => {
                            warn!(wire_width = w, wire_height = h, error = %e, "skipping table cell");
                            None
                        }
                    }
                })
                .collect()
        })
        .collect();
    Ok(SpringTable {
        wire_widths: input.wire_widths.clone(),
        wire_heights: input.wire_heights.clone(),
        cells,
    })
}

// ============================================================================
// Input / Result
// ============================================================================

/// Spring definition for a workbook item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpringInput {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coil_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coil_pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coil_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rigidity_modulus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
}

impl SpringInput {
    pub fn to_model(&self) -> CalcResult<Spring> {
        let mut spring = Spring::new()?;
        if let Some(material) = &self.material {
            spring.set_material(material)?;
        }
        let values = [
            ("external_diameter", self.external_diameter),
            ("internal_diameter", self.internal_diameter),
            ("mean_diameter", self.mean_diameter),
            ("wire_diameter", self.wire_diameter),
            ("wire_width", self.wire_width),
            ("wire_height", self.wire_height),
            ("height", self.height),
            ("coil_angle", self.coil_angle),
            ("coil_pitch", self.coil_pitch),
            ("coil_count", self.coil_count),
            ("rigidity_modulus", self.rigidity_modulus),
        ];
        for (name, value) in values {
            if let Some(value) = value {
                spring.assign(name, value)?;
            }
        }
        Ok(spring)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpringResult {
    pub label: String,
    pub wire_shape: Option<WireShape>,
    pub parameters: Vec<SlotReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_case: Option<LoadCase>,
}

/// Resolve every parameter and, when a load is given, the load case.
pub fn calculate(input: &SpringInput) -> CalcResult<SpringResult> {
    let spring = input.to_model()?;
    let load_case = match input.load {
        Some(load) => Some(spring.load_case(load)?),
        None => None,
    };
    Ok(SpringResult {
        label: input.label.clone(),
        wire_shape: spring.wire_shape(),
        parameters: spring.snapshot(),
        load_case,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_diameters_from_any_two() {
        let mut spring = Spring::new().unwrap();
        spring.assign("external_diameter", 40.0).unwrap();
        spring.set_wire_diameter(4.0).unwrap();
        assert!(close(spring.value("mean_diameter").unwrap(), 36.0));
        assert!(close(spring.value("internal_diameter").unwrap(), 32.0));

        let err = spring.assign("mean_diameter", 30.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'mean_diameter' already defined through: 'external_diameter', 'wire_width'"
        );
    }

    #[test]
    fn test_wire_width_from_diameters() {
        let mut spring = Spring::new().unwrap();
        spring.assign("D", 40.0).unwrap();
        spring.assign("di", 30.0).unwrap();
        assert!(close(spring.graph().value("wire_width").unwrap(), 5.0));
        assert!(close(spring.wire_diameter().unwrap(), 5.0));
        assert_eq!(spring.wire_shape(), None);
        assert!(close(spring.value("mean_diameter").unwrap(), 35.0));
    }

    #[test]
    fn test_coil_geometry() {
        let mut spring = Spring::new().unwrap();
        spring.assign("mean_diameter", 20.0).unwrap();
        spring.assign("coil_pitch", 5.0).unwrap();
        spring.assign("coil_count", 10.0).unwrap();
        assert!(close(spring.value("height").unwrap(), 50.0));
        let angle = spring.value("coil_angle").unwrap();
        assert!(close(angle, (5.0 / (PI * 20.0)).atan()));

        let mut other = Spring::new().unwrap();
        other.assign("coil_angle", angle).unwrap();
        other.assign("coil_pitch", 5.0).unwrap();
        assert!(close(other.value("mean_diameter").unwrap(), 20.0));
    }

    #[test]
    fn test_elastic_constants() {
        let mut spring = Spring::new().unwrap();
        spring.set_material(&Material::new("x").with_elasticity(260.0, 0.3)).unwrap();
        assert!(close(spring.value("G").unwrap(), 100.0));

        let mut other = Spring::new().unwrap();
        other.assign("E", 260.0).unwrap();
        other.assign("G", 100.0).unwrap();
        assert!(close(other.value("poissons_ratio").unwrap(), 0.3));
    }

    #[test]
    fn test_wire_shape_exclusive() {
        let mut round = Spring::new().unwrap();
        round.set_wire_diameter(3.0).unwrap();
        assert!(round.set_wire_width(3.0).is_err());
        assert!(close(round.wire_height().unwrap(), 3.0));
        round.delete("wire_diameter").unwrap();
        assert_eq!(round.wire_shape(), None);
        round.set_wire_width(4.0).unwrap();

        let mut flat = Spring::new().unwrap();
        flat.set_wire_width(6.0).unwrap();
        flat.set_wire_height(2.0).unwrap();
        assert_eq!(flat.wire_shape(), Some(WireShape::Rectangular));
        assert!(flat.set_wire_diameter(3.0).is_err());
        assert!(flat.wire_diameter().is_err());
        assert!(close(flat.wire_height().unwrap(), 2.0));
    }

    #[test]
    fn test_round_wire_formula() {
        let case = deflection_and_shear(44.0, 4.0, 4.0, 8.0, 100.0, 80_000.0).unwrap();
        let (r, b) = (20.0f64, 2.0f64);
        let c = r / b;
        let k = 1.0 + 1.2 / c + 0.56 / c.powi(2) + 0.5 / c.powi(3);
        assert!(close(case.deflection, 2.789 * 100.0 * r.powi(3) * 8.0 / (80_000.0 * b.powi(4))));
        assert!(close(case.shear_stress, 4.8 * 100.0 * r / (8.0 * b.powi(3)) * k));
        assert!(close(case.rate * case.deflection, 100.0));
    }

    #[test]
    fn test_formula_range() {
        // R = 5, b = 2: c = 2.5
        assert!(deflection_and_shear(14.0, 4.0, 4.0, 8.0, 100.0, 80_000.0).is_err());
        // flat wire needs c > 5: R = 9, b = 2 -> 4.5
        assert!(deflection_and_shear(24.0, 6.0, 4.0, 8.0, 100.0, 80_000.0).is_err());
        // tall wire only needs c > 3
        assert!(deflection_and_shear(22.0, 4.0, 6.0, 8.0, 100.0, 80_000.0).is_ok());
    }

    #[test]
    fn test_spring_table_marks_invalid_cells() {
        let table = spring_table(&SpringTableInput {
            label: String::new(),
            external_diameter: 30.0,
            wire_widths: vec![3.0, 8.0],
            wire_heights: vec![3.0, 8.0],
            coil_count: 6.0,
            load: 50.0,
            rigidity_modulus: 81_500.0,
        })
        .unwrap();
        assert_eq!(table.cells.len(), 2);
        assert!(table.cells[0][0].is_some());
        // w = h = 8: R = 11, b = 4, c = 2.75
        assert!(table.cells[1][1].is_none());
    }

    #[test]
    fn test_calculate_with_load() {
        let input = SpringInput {
            external_diameter: Some(44.0),
            wire_diameter: Some(4.0),
            coil_count: Some(8.0),
            rigidity_modulus: Some(80_000.0),
            load: Some(100.0),
            ..Default::default()
        };
        let result = calculate(&input).unwrap();
        assert_eq!(result.wire_shape, Some(WireShape::Round));
        let case = result.load_case.unwrap();
        let direct = deflection_and_shear(44.0, 4.0, 4.0, 8.0, 100.0, 80_000.0).unwrap();
        assert_eq!(case, direct);
        let mean = result.parameters.iter().find(|p| p.name == "mean_diameter").unwrap();
        assert_eq!(mean.value, Some(40.0));
    }
}
