//! # Thick-Walled Tube
//!
//! Cylinder under internal/external pressure, axial force, torsion and
//! bending, after Roark (thick-walled vessels) and the Lamé equations.
//!
//! ## Radial Dimensions
//!
//! External radius, internal radius and wall thickness form a
//! [`DimensionGroup`]: any two define the third. Assigning a third one evicts
//! the locked dimension (if set and currently assigned) or the oldest one.
//! Diameters are views on the radii: setting `diameter_external` writes
//! `radius_external = d / 2`.
//!
//! ## Sign Conventions
//!
//! - Pressures are positive when acting on the wall
//! - `force_axial` is positive in compression
//! - `torsion_radial` is a bending moment about a transverse axis; its
//!   stress is taken on the tension side
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::tube::{calculate, TubeInput};
//!
//! let input = TubeInput {
//!     diameter_external: Some(60.0),
//!     wallthickness: Some(5.0),
//!     pressure_internal: 20.0,
//!     ..Default::default()
//! };
//! let result = calculate(&input).unwrap();
//! assert!((result.radius_internal - 25.0).abs() < 1e-9);
//! assert!(result.inner.von_mises > result.outer.von_mises);
//! ```

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::graph::{DimensionGroup, ParameterGraph, Rule, Slot, SlotReport, Validator};
use crate::materials::Material;
use crate::stresses::{lame_wall_stresses, StressState};

/// Name of the radial dimension group.
pub const RADII: &str = "radii";

/// Members of the radial dimension group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TubeDimension {
    RadiusExternal,
    RadiusInternal,
    Wallthickness,
}

impl TubeDimension {
    pub fn slot(&self) -> &'static str {
        match self {
            TubeDimension::RadiusExternal => "radius_external",
            TubeDimension::RadiusInternal => "radius_internal",
            TubeDimension::Wallthickness => "wallthickness",
        }
    }
}

impl FromStr for TubeDimension {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical_name(s) {
            "radius_external" => Ok(TubeDimension::RadiusExternal),
            "radius_internal" => Ok(TubeDimension::RadiusInternal),
            "wallthickness" => Ok(TubeDimension::Wallthickness),
            _ => Err(CalcError::invalid_input(
                "lock",
                s,
                "Expected radius_external, radius_internal or wallthickness",
            )),
        }
    }
}

impl fmt::Display for TubeDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slot())
    }
}

/// Map short parameter names to slot names.
fn canonical_name(name: &str) -> &str {
    match name {
        "re" | "r_e" => "radius_external",
        "ri" | "r_i" => "radius_internal",
        "w" | "t" => "wallthickness",
        "de" | "d_e" => "diameter_external",
        "di" | "d_i" => "diameter_internal",
        "l" => "length",
        "pe" | "p_e" => "pressure_external",
        "pi" | "p_i" => "pressure_internal",
        "fa" | "f_a" => "force_axial",
        "ma" | "m_a" => "torsion_axial",
        "mr" | "m_r" => "torsion_radial",
        "e" | "E" => "elasticity_modulus",
        other => other,
    }
}

// ============================================================================
// Model
// ============================================================================

/// Tube parameter graph plus the non-numeric settings.
#[derive(Debug, Clone)]
pub struct Tube {
    graph: ParameterGraph,
    material: Material,
    capped: bool,
}

impl Tube {
    pub fn new(material: Material) -> CalcResult<Self> {
        let mut graph = ParameterGraph::new("tube");
        for name in ["radius_external", "radius_internal", "wallthickness", "length"] {
            graph.declare(Slot::input(name).validator(Validator::non_negative()))?;
        }
        for name in [
            "pressure_external",
            "pressure_internal",
            "force_axial",
            "torsion_axial",
            "torsion_radial",
        ] {
            graph.declare(Slot::input(name))?;
        }
        graph.declare(Slot::input("elasticity_modulus").validator(Validator::positive()))?;
        graph.add_group(DimensionGroup::new(
            RADII,
            "radius_external",
            "radius_internal",
            "wallthickness",
        ))?;

        graph
            .declare(Slot::derived("diameter_external").rule(Rule::compute("2 re", &["radius_external"], |v| 2.0 * v[0])))?
            .declare(Slot::derived("diameter_internal").rule(Rule::compute("2 ri", &["radius_internal"], |v| 2.0 * v[0])))?
            .declare(Slot::derived("pressure_net").rule(Rule::compute(
                "pi - pe",
                &["pressure_internal", "pressure_external"],
                |v| v[0] - v[1],
            )))?
            .declare(Slot::derived("area_wall").rule(Rule::compute(
                "annulus",
                &["radius_external", "radius_internal"],
                |v| PI * (v[0].powi(2) - v[1].powi(2)),
            )))?
            .declare(Slot::derived("area_core").rule(Rule::compute("core", &["radius_internal"], |v| PI * v[0].powi(2))))?
            .declare(Slot::derived("area_total").rule(Rule::compute("disc", &["radius_external"], |v| PI * v[0].powi(2))))?;

        for name in ["ix", "iy"] {
            graph.declare(Slot::derived(name).rule(Rule::compute(
                "pi/4 (re^4 - ri^4)",
                &["radius_external", "radius_internal"],
                |v| PI / 4.0 * (v[0].powi(4) - v[1].powi(4)),
            )))?;
        }
        graph.declare(Slot::derived("iz").rule(Rule::compute(
            "pi/2 (re^4 - ri^4)",
            &["radius_external", "radius_internal"],
            |v| PI / 2.0 * (v[0].powi(4) - v[1].powi(4)),
        )))?;

        graph
            .declare(Slot::derived("buckling_pressure_ratio").rule(Rule::new(
                "w / (3 (pe - pi) re^3 / E)^(1/3)",
                &["wallthickness", "pressure_external", "pressure_internal", "radius_external", "elasticity_modulus"],
                |v| buckling_pressure_ratio(v[0], v[1] - v[2], v[3], v[4]),
            )))?
            .declare(Slot::derived("buckling_force_ratio").rule(Rule::new(
                "w / (re - (re^4 - 4 F L^2 / (pi^3 E))^(1/4))",
                &["wallthickness", "radius_external", "force_axial", "length", "elasticity_modulus"],
                |v| buckling_force_ratio(v[0], v[1], v[2], v[3], v[4]),
            )))?
            .declare(
                Slot::derived("buckling_ratio")
                    .rule(Rule::compute(
                        "governing",
                        &["buckling_pressure_ratio", "buckling_force_ratio"],
                        |v| v[0].min(v[1]),
                    ))
                    .rule(Rule::compute("pressure", &["buckling_pressure_ratio"], |v| v[0]))
                    .rule(Rule::compute("force", &["buckling_force_ratio"], |v| v[0])),
            )?;

        let mut tube = Tube {
            graph,
            material: Material::default(),
            capped: true,
        };
        tube.set_material(material)?;
        Ok(tube)
    }

    pub fn graph(&self) -> &ParameterGraph {
        &self.graph
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Replace the material and its elasticity modulus.
    pub fn set_material(&mut self, material: Material) -> CalcResult<()> {
        self.graph.delete("elasticity_modulus")?;
        if let Some(e) = material.elasticity_modulus {
            self.graph.assign("elasticity_modulus", e)?;
        }
        self.material = material;
        Ok(())
    }

    pub fn capped(&self) -> bool {
        self.capped
    }

    /// Closed ends carry the pressure as axial stress.
    pub fn set_capped(&mut self, capped: bool) {
        self.capped = capped;
    }

    pub fn set_lock(&mut self, lock: Option<TubeDimension>) -> CalcResult<()> {
        self.graph.set_lock(RADII, lock.as_ref().map(TubeDimension::slot))
    }

    /// Assign a parameter by slot name or short alias (`re`, `d_i`, `p_e`, ...).
    pub fn assign(&mut self, name: &str, value: f64) -> CalcResult<()> {
        match canonical_name(name) {
            "diameter_external" => self.graph.assign("radius_external", value / 2.0),
            "diameter_internal" => self.graph.assign("radius_internal", value / 2.0),
            slot => self.graph.assign(slot, value),
        }
    }

    pub fn delete(&mut self, name: &str) -> CalcResult<()> {
        match canonical_name(name) {
            "diameter_external" => self.graph.delete("radius_external"),
            "diameter_internal" => self.graph.delete("radius_internal"),
            slot => self.graph.delete(slot),
        }
    }

    pub fn value(&self, name: &str) -> CalcResult<f64> {
        self.graph.value(canonical_name(name))
    }

    /// Optional value, for loads that may be absent.
    fn load(&self, name: &str) -> f64 {
        self.graph.resolve(name).map(|r| r.value).unwrap_or(0.0)
    }

    /// Stresses and Von Mises equivalent at the outer and inner wall.
    pub fn wall_stresses(&self) -> CalcResult<WallStresses> {
        let [re, ri] = self.graph.values(["radius_external", "radius_internal"])?;
        let lame = lame_wall_stresses(
            re,
            ri,
            self.load("pressure_internal"),
            self.load("pressure_external"),
            self.capped,
        )?;

        let [area, ix, iz] = self.graph.values(["area_wall", "ix", "iz"])?;
        let axial_force = -self.load("force_axial") / area;
        let bending = self.load("torsion_radial") / ix;
        let torsion = self.load("torsion_axial") / iz;
        debug!(re, ri, axial_force, "tube wall stresses");

        let wall = |radial: f64, hoop: f64, r: f64| {
            let state = StressState {
                sx: radial,
                sy: hoop,
                sz: lame.axial + axial_force + bending * r,
                tyz: torsion * r,
                ..Default::default()
            };
            WallStress {
                radial,
                hoop,
                axial: state.sz,
                shear: state.tyz,
                von_mises: state.von_mises(),
            }
        };

        Ok(WallStresses {
            outer: wall(lame.radial_outer, lame.hoop_outer, re),
            inner: wall(lame.radial_inner, lame.hoop_inner, ri),
        })
    }

    pub fn snapshot(&self) -> Vec<SlotReport> {
        self.graph.snapshot()
    }
}

fn buckling_pressure_ratio(wallthickness: f64, pressure_difference: f64, re: f64, e: f64) -> Option<f64> {
    if pressure_difference <= 0.0 {
        return None;
    }
    Some(wallthickness / (3.0 * pressure_difference * re.powi(3) / e).cbrt())
}

fn buckling_force_ratio(wallthickness: f64, re: f64, force: f64, length: f64, e: f64) -> Option<f64> {
    if force <= 0.0 {
        return None;
    }
    let remaining = re.powi(4) - 4.0 * force * length.powi(2) / (PI.powi(3) * e);
    if remaining < 0.0 {
        return None;
    }
    let critical = re - remaining.powf(0.25);
    (critical > 0.0).then(|| wallthickness / critical)
}

// ============================================================================
// Input / Result
// ============================================================================

/// Stress components at one wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallStress {
    pub radial: f64,
    pub hoop: f64,
    pub axial: f64,
    pub shear: f64,
    pub von_mises: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallStresses {
    pub outer: WallStress,
    pub inner: WallStress,
}

/// Input parameters for a tube calculation.
///
/// Two of the radial dimensions are required; diameters count as their
/// radius. Loads default to zero.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Cylinder barrel",
///   "diameter_external": 60.0,
///   "wallthickness": 5.0,
///   "pressure_internal": 20.0,
///   "capped": true,
///   "material": { "name": "S355J2", "yield_strength": 355.0, "elasticity_modulus": 210000.0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TubeInput {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_external: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_internal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallthickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_external: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter_internal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default)]
    pub pressure_internal: f64,
    #[serde(default)]
    pub pressure_external: f64,
    #[serde(default)]
    pub force_axial: f64,
    #[serde(default)]
    pub torsion_axial: f64,
    #[serde(default)]
    pub torsion_radial: f64,
    #[serde(default = "default_capped")]
    pub capped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<TubeDimension>,
    #[serde(default)]
    pub material: Material,
}

fn default_capped() -> bool {
    true
}

impl Default for TubeInput {
    fn default() -> Self {
        TubeInput {
            label: String::new(),
            radius_external: None,
            radius_internal: None,
            wallthickness: None,
            diameter_external: None,
            diameter_internal: None,
            length: None,
            pressure_internal: 0.0,
            pressure_external: 0.0,
            force_axial: 0.0,
            torsion_axial: 0.0,
            torsion_radial: 0.0,
            capped: true,
            lock: None,
            material: Material::default(),
        }
    }
}

impl TubeInput {
    pub fn validate(&self) -> CalcResult<()> {
        let given = [
            self.radius_external.or(self.diameter_external),
            self.radius_internal.or(self.diameter_internal),
            self.wallthickness,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count();
        if given < 2 {
            return Err(CalcError::invalid_input(
                "dimensions",
                given.to_string(),
                "Two of radius_external, radius_internal and wallthickness are required",
            ));
        }
        Ok(())
    }

    /// Build the model with every given value assigned.
    pub fn to_model(&self) -> CalcResult<Tube> {
        let mut tube = Tube::new(self.material.clone())?;
        tube.set_lock(self.lock)?;
        tube.set_capped(self.capped);

        let dimensions = [
            ("radius_external", self.radius_external),
            ("radius_internal", self.radius_internal),
            ("wallthickness", self.wallthickness),
            ("diameter_external", self.diameter_external),
            ("diameter_internal", self.diameter_internal),
            ("length", self.length),
        ];
        for (name, value) in dimensions {
            if let Some(value) = value {
                tube.assign(name, value)?;
            }
        }
        let loads = [
            ("pressure_internal", self.pressure_internal),
            ("pressure_external", self.pressure_external),
            ("force_axial", self.force_axial),
            ("torsion_axial", self.torsion_axial),
            ("torsion_radial", self.torsion_radial),
        ];
        for (name, value) in loads {
            tube.assign(name, value)?;
        }
        Ok(tube)
    }
}

/// Results of a tube calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TubeResult {
    pub label: String,
    pub radius_external: f64,
    pub radius_internal: f64,
    pub wallthickness: f64,
    pub diameter_external: f64,
    pub diameter_internal: f64,
    pub area_wall: f64,
    pub area_core: f64,
    pub area_total: f64,
    pub ix: f64,
    pub iy: f64,
    pub iz: f64,
    pub pressure_net: f64,
    /// `None` unless external pressure exceeds internal pressure
    pub buckling_pressure_ratio: Option<f64>,
    /// `None` without compressive force, length and elasticity modulus
    pub buckling_force_ratio: Option<f64>,
    pub outer: WallStress,
    pub inner: WallStress,
    pub max_von_mises: f64,
    /// Yield strength over the larger Von Mises stress
    pub safety_factor: Option<f64>,
}

impl TubeResult {
    /// Check if the wall stays below yield. Unknown without a yield strength.
    pub fn passes(&self) -> Option<bool> {
        self.safety_factor.map(|s| s >= 1.0)
    }
}

/// Calculate dimensions, section properties and wall stresses.
pub fn calculate(input: &TubeInput) -> CalcResult<TubeResult> {
    input.validate()?;
    let tube = input.to_model()?;
    let graph = tube.graph();
    let optional = |name: &str| graph.resolve(name).map(|r| r.value);

    let [radius_external, radius_internal, wallthickness] =
        graph.values(["radius_external", "radius_internal", "wallthickness"])?;
    let [diameter_external, diameter_internal, pressure_net] =
        graph.values(["diameter_external", "diameter_internal", "pressure_net"])?;
    let [area_wall, area_core, area_total, ix, iy, iz] =
        graph.values(["area_wall", "area_core", "area_total", "ix", "iy", "iz"])?;

    let stresses = tube.wall_stresses()?;
    let max_von_mises = stresses.outer.von_mises.max(stresses.inner.von_mises);

    Ok(TubeResult {
        label: input.label.clone(),
        radius_external,
        radius_internal,
        wallthickness,
        diameter_external,
        diameter_internal,
        area_wall,
        area_core,
        area_total,
        ix,
        iy,
        iz,
        pressure_net,
        buckling_pressure_ratio: optional("buckling_pressure_ratio"),
        buckling_force_ratio: optional("buckling_force_ratio"),
        outer: stresses.outer,
        inner: stresses.inner,
        max_von_mises,
        safety_factor: tube.material().safety_factor(max_von_mises),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steel() -> Material {
        Material::preset("s355").unwrap()
    }

    #[test]
    fn test_diameters_write_radii() {
        let mut tube = Tube::new(steel()).unwrap();
        tube.assign("d_e", 20.0).unwrap();
        tube.assign("diameter_internal", 16.0).unwrap();
        assert_eq!(tube.value("w").unwrap(), 2.0);
        assert_eq!(tube.value("diameter_external").unwrap(), 20.0);
        assert_eq!(tube.graph().direct_value("radius_external"), Some(10.0));

        tube.delete("de").unwrap();
        assert!(tube.value("radius_external").is_err());
    }

    #[test]
    fn test_derived_diameter_not_assignable_through_graph() {
        let mut tube = Tube::new(steel()).unwrap();
        let mut graph = tube.graph().clone();
        assert!(matches!(
            graph.assign("diameter_external", 10.0),
            Err(CalcError::ReadOnlySlot { .. })
        ));
        assert!(tube.assign("diameter_external", 10.0).is_ok());
    }

    #[test]
    fn test_lock_keeps_unlocked_dimension() {
        let mut tube = Tube::new(steel()).unwrap();
        tube.set_lock(Some(TubeDimension::RadiusInternal)).unwrap();
        tube.assign("re", 10.0).unwrap();
        tube.assign("ri", 8.0).unwrap();
        tube.assign("w", 1.0).unwrap();
        assert_eq!(tube.graph().direct_value("radius_external"), Some(10.0));
        assert_eq!(tube.value("ri").unwrap(), 9.0);
    }

    #[test]
    fn test_section_properties() {
        let mut tube = Tube::new(steel()).unwrap();
        tube.assign("re", 2.0).unwrap();
        tube.assign("ri", 1.0).unwrap();
        assert!((tube.value("area_wall").unwrap() - 3.0 * PI).abs() < 1e-9);
        assert!((tube.value("ix").unwrap() - 15.0 * PI / 4.0).abs() < 1e-9);
        assert_eq!(tube.value("ix").unwrap(), tube.value("iy").unwrap());
        assert!((tube.value("iz").unwrap() - 15.0 * PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_internal_pressure_open_ends() {
        let input = TubeInput {
            radius_external: Some(2.0),
            radius_internal: Some(1.0),
            pressure_internal: 30.0,
            capped: false,
            material: steel(),
            ..Default::default()
        };
        let result = calculate(&input).unwrap();
        assert!((result.inner.hoop - 50.0).abs() < 1e-9);
        assert!((result.inner.radial + 30.0).abs() < 1e-9);
        assert_eq!(result.inner.axial, 0.0);
        // plane stress: sqrt(σr² - σr σt + σt²)
        let expected = (30.0f64.powi(2) + 30.0 * 50.0 + 50.0f64.powi(2)).sqrt();
        assert!((result.inner.von_mises - expected).abs() < 1e-9);
        assert_eq!(result.buckling_pressure_ratio, None);
        assert!(result.passes().unwrap());
    }

    #[test]
    fn test_external_pressure_buckling() {
        let input = TubeInput {
            radius_external: Some(10.0),
            wallthickness: Some(1.0),
            pressure_external: 5.0,
            material: steel(),
            ..Default::default()
        };
        let result = calculate(&input).unwrap();
        let expected = 1.0 / (3.0 * 5.0 * 1000.0 / 210_000.0f64).cbrt();
        assert!((result.buckling_pressure_ratio.unwrap() - expected).abs() < 1e-9);
        assert!(result.outer.radial < 0.0);
    }

    #[test]
    fn test_axial_force_buckling_and_stress() {
        let input = TubeInput {
            radius_external: Some(10.0),
            radius_internal: Some(9.0),
            length: Some(100.0),
            force_axial: 1000.0,
            material: steel(),
            ..Default::default()
        };
        let result = calculate(&input).unwrap();
        let remaining = 10_000.0 - 4.0 * 1000.0 * 10_000.0 / (PI.powi(3) * 210_000.0);
        let expected = 1.0 / (10.0 - remaining.powf(0.25));
        assert!((result.buckling_force_ratio.unwrap() - expected).abs() < 1e-6);
        assert!((result.outer.axial + 1000.0 / (19.0 * PI)).abs() < 1e-9);
    }

    #[test]
    fn test_torsion_shear() {
        let input = TubeInput {
            radius_external: Some(2.0),
            radius_internal: Some(1.0),
            torsion_axial: 100.0,
            ..Default::default()
        };
        let result = calculate(&input).unwrap();
        let iz = 15.0 * PI / 2.0;
        assert!((result.outer.shear - 200.0 / iz).abs() < 1e-9);
        assert!((result.inner.shear - 100.0 / iz).abs() < 1e-9);
        assert_eq!(result.safety_factor, None);
    }

    #[test]
    fn test_impossible_input() {
        let input = TubeInput {
            radius_external: Some(5.0),
            radius_internal: Some(6.0),
            ..Default::default()
        };
        assert_eq!(calculate(&input).unwrap_err().error_code(), "IMPOSSIBLE_GEOMETRY");

        let input = TubeInput {
            radius_external: Some(5.0),
            ..Default::default()
        };
        assert!(matches!(calculate(&input), Err(CalcError::InvalidInput { .. })));
    }

    #[test]
    fn test_dimension_names() {
        assert_eq!("r_e".parse::<TubeDimension>().unwrap(), TubeDimension::RadiusExternal);
        assert_eq!("wallthickness".parse::<TubeDimension>().unwrap(), TubeDimension::Wallthickness);
        assert!("length".parse::<TubeDimension>().is_err());
    }

    #[test]
    fn test_input_json() {
        let json = r#"{"diameter_external": 60.0, "wallthickness": 5.0, "lock": "wallthickness"}"#;
        let input: TubeInput = serde_json::from_str(json).unwrap();
        assert!(input.capped);
        assert_eq!(input.lock, Some(TubeDimension::Wallthickness));
        let result = calculate(&input).unwrap();
        assert_eq!(result.radius_internal, 25.0);
    }
}
