//! # Materials
//!
//! Isotropic elastic material properties. Numbers carry no unit; the presets
//! are in N/mm².
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::materials::Material;
//!
//! let steel = Material::preset("s235").unwrap();
//! let g = steel.rigidity_modulus().unwrap();
//! assert!((g - 80_769.23).abs() < 0.01);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Material with optional strength and elastic constants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultimate_strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticity_modulus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poissons_ratio: Option<f64>,
}

/// Preset names accepted by [`Material::preset`].
pub const PRESETS: [&str; 4] = ["s235", "s355", "1.4301", "6061-t6"];

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Material {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_elasticity(mut self, elasticity_modulus: f64, poissons_ratio: f64) -> Self {
        self.elasticity_modulus = Some(elasticity_modulus);
        self.poissons_ratio = Some(poissons_ratio);
        self
    }

    pub fn with_strength(mut self, yield_strength: f64, ultimate_strength: f64) -> Self {
        self.yield_strength = Some(yield_strength);
        self.ultimate_strength = Some(ultimate_strength);
        self
    }

    /// Look up a common engineering material by name (case-insensitive).
    pub fn preset(name: &str) -> CalcResult<Self> {
        let material = match name.trim().to_ascii_lowercase().as_str() {
            "s235" | "s235jr" => Material::new("S235JR")
                .with_strength(235.0, 360.0)
                .with_elasticity(210_000.0, 0.3),
            "s355" | "s355j2" => Material::new("S355J2")
                .with_strength(355.0, 470.0)
                .with_elasticity(210_000.0, 0.3),
            "1.4301" | "304" | "x5crni18-10" => Material::new("1.4301")
                .with_strength(210.0, 520.0)
                .with_elasticity(200_000.0, 0.29),
            "6061-t6" | "6061" => Material::new("6061-T6")
                .with_strength(276.0, 310.0)
                .with_elasticity(68_900.0, 0.33),
            _ => {
                return Err(CalcError::invalid_input(
                    "material",
                    name,
                    format!("Unknown material, expected one of: {}", PRESETS.join(", ")),
                ))
            }
        };
        Ok(material)
    }

    /// Shear modulus `G = E / (2 (1 + ν))`.
    pub fn rigidity_modulus(&self) -> Option<f64> {
        match (self.elasticity_modulus, self.poissons_ratio) {
            (Some(e), Some(v)) => Some(e / (2.0 * (1.0 + v))),
            _ => None,
        }
    }

    pub fn require_elasticity(&self) -> CalcResult<f64> {
        self.elasticity_modulus.ok_or_else(|| {
            CalcError::invalid_input("material", self.name.clone(), "Elasticity modulus not defined")
        })
    }

    /// Ratio of yield strength to `stress`, if the yield strength is known.
    pub fn safety_factor(&self, stress: f64) -> Option<f64> {
        let stress = stress.abs();
        self.yield_strength.filter(|_| stress > 0.0).map(|y| y / stress)
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        for name in PRESETS {
            let material = Material::preset(name).unwrap();
            assert!(material.elasticity_modulus.is_some());
            assert!(material.yield_strength.is_some());
        }
        assert_eq!(Material::preset("S355").unwrap().name, "S355J2");
        assert!(Material::preset("unobtainium").is_err());
    }

    #[test]
    fn test_rigidity_modulus() {
        let m = Material::new("test").with_elasticity(260.0, 0.3);
        assert!((m.rigidity_modulus().unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(Material::new("bare").rigidity_modulus(), None);
    }

    #[test]
    fn test_safety_factor() {
        let m = Material::preset("s235").unwrap();
        assert!((m.safety_factor(-117.5).unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(m.safety_factor(0.0), None);
    }

    #[test]
    fn test_material_serialization() {
        let m = Material::preset("6061-t6").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let parsed: Material = serde_json::from_str(&json).unwrap();
        assert_eq!(m, parsed);

        let sparse: Material = serde_json::from_str(r#"{"name":"custom"}"#).unwrap();
        assert_eq!(sparse.elasticity_modulus, None);
    }
}
