//! # Stress Formulas
//!
//! Shared closed-form stress helpers used by the tube and thread models.
//!
//! ## Von Mises
//!
//! ```text
//! σv = sqrt(((σx-σy)² + (σy-σz)² + (σz-σx)² + 6(τxy² + τyz² + τxz²)) / 2)
//! ```
//!
//! ## Lamé
//!
//! Thick-walled cylinder under internal pressure `pi` and external pressure
//! `pe`, external radius `re`, internal radius `ri`:
//!
//! ```text
//! A  = (pi·ri² - pe·re²) / (re² - ri²)
//! B  = (pi - pe)·ri²·re² / (re² - ri²)
//! σr(r) = A - B/r²
//! σt(r) = A + B/r²
//! σa    = A              (closed ends only)
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Full stress tensor at a point. Components default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StressState {
    pub sx: f64,
    pub sy: f64,
    pub sz: f64,
    pub txy: f64,
    pub tyz: f64,
    pub txz: f64,
}

impl StressState {
    pub fn von_mises(&self) -> f64 {
        von_mises(self)
    }
}

/// Von Mises equivalent stress.
pub fn von_mises(s: &StressState) -> f64 {
    let normal = (s.sx - s.sy).powi(2) + (s.sy - s.sz).powi(2) + (s.sz - s.sx).powi(2);
    let shear = 6.0 * (s.txy.powi(2) + s.tyz.powi(2) + s.txz.powi(2));
    ((normal + shear) / 2.0).sqrt()
}

/// Lamé stresses at the inner and outer wall of a thick cylinder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LameStresses {
    pub radial_inner: f64,
    pub radial_outer: f64,
    pub hoop_inner: f64,
    pub hoop_outer: f64,
    /// Axial stress from end caps; zero for open ends
    pub axial: f64,
}

pub fn lame_wall_stresses(
    radius_external: f64,
    radius_internal: f64,
    pressure_internal: f64,
    pressure_external: f64,
    capped: bool,
) -> CalcResult<LameStresses> {
    if radius_internal < 0.0 || radius_external <= radius_internal {
        return Err(CalcError::calculation_failed(
            "lame",
            format!(
                "Impossible dimensional parameters: re = {}, ri = {}",
                radius_external, radius_internal
            ),
        ));
    }
    let re2 = radius_external.powi(2);
    let ri2 = radius_internal.powi(2);
    let a = (pressure_internal * ri2 - pressure_external * re2) / (re2 - ri2);
    let b = (pressure_internal - pressure_external) * ri2 * re2 / (re2 - ri2);

    // solid bar: stress is uniform, the 1/r² term vanishes
    let (radial_inner, hoop_inner) = if ri2 > 0.0 {
        (a - b / ri2, a + b / ri2)
    } else {
        (a, a)
    };

    Ok(LameStresses {
        radial_inner,
        radial_outer: a - b / re2,
        hoop_inner,
        hoop_outer: a + b / re2,
        axial: if capped { a } else { 0.0 },
    })
}
