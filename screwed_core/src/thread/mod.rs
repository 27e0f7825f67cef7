//! # Thread Flank Stresses
//!
//! Trapezoidal thread profile with independent lead and trail flank angles,
//! covering symmetric profiles (ISO metric, ACME) as well as buttress
//! profiles (DIN 513, ANSI). The load is carried by the first engaged turn
//! with the share given by [`LOAD_DISTRIBUTION`].
//!
//! ## Profile
//!
//! ```text
//! profile_height (ph) = pitch / (tan lead_angle + tan trail_angle)
//! h1 = ph/2 - offset - height/2      male crest
//! h2 = ph/2 - offset + height/2      male root
//! H1 = ph/2 + offset + height/2      female crest
//! H2 = ph/2 + offset - height/2      female root
//! width(h) = h · (tan lead_angle + tan trail_angle)
//! ```
//!
//! A profile where any of `h1`, `h2`, `H1`, `H2` is negative cannot be
//! manufactured; see [`Thread::check`].
//!
//! ## Angles
//!
//! `angle = lead_angle + trail_angle`. Symmetric standards set `angle` and
//! each flank follows as `angle / 2`; buttress standards set both flanks.
//! Angles are radians on the model and degrees on [`ThreadInput`].
//!
//! ## Example
//!
//! ```rust
//! use screwed_core::thread::Thread;
//!
//! let mut thread = Thread::from_designation("M10x1.5-6g").unwrap();
//! thread.assign("load", 1000.0).unwrap();
//! assert!(thread.check().unwrap());
//! let crest = thread.value("male_crest_width").unwrap();
//! assert!((crest - 1.5 / 8.0).abs() < 1e-9);
//! ```

pub mod designation;

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};
use crate::graph::{ParameterGraph, Rule, Slot, SlotReport, Validator};
use crate::materials::Material;
use crate::stresses::StressState;

pub use designation::{parse_designation, Engagement, ThreadDesignation};

/// Share of the load carried by each engaged turn, first turn first.
pub const LOAD_DISTRIBUTION: [f64; 5] = [0.6, 0.2, 0.1, 0.05, 0.025];

/// Load share of the most loaded turn.
fn peak_load_share() -> f64 {
    LOAD_DISTRIBUTION.iter().copied().fold(0.0, f64::max)
}

// ============================================================================
// Standards
// ============================================================================

/// Thread profile presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadStandard {
    /// ISO 261 metric, 60° symmetric
    Iso261,
    /// DIN 513 buttress, 3°/30°
    Din513,
    Din513Stub,
    /// ACME, 29° symmetric
    Acme,
    AcmeStub,
    /// ANSI B1.9 buttress, 7°/45°
    AnsiButtress,
}

impl ThreadStandard {
    pub const ALL: [ThreadStandard; 6] = [
        ThreadStandard::Iso261,
        ThreadStandard::Din513,
        ThreadStandard::Din513Stub,
        ThreadStandard::Acme,
        ThreadStandard::AcmeStub,
        ThreadStandard::AnsiButtress,
    ];

    /// Thread height as a fraction of the pitch. ISO derives it from the
    /// profile height instead.
    pub fn height_factor(&self) -> Option<f64> {
        match self {
            ThreadStandard::Iso261 => None,
            ThreadStandard::Din513 => Some(0.75),
            ThreadStandard::Din513Stub => Some(0.5),
            ThreadStandard::Acme => Some(0.5),
            ThreadStandard::AcmeStub => Some(0.3),
            ThreadStandard::AnsiButtress => Some(0.6),
        }
    }

    /// Preset angles in degrees: `(angle, None)` for symmetric profiles,
    /// `(lead, Some(trail))` for buttress profiles.
    fn angles(&self) -> (f64, Option<f64>) {
        match self {
            ThreadStandard::Iso261 => (60.0, None),
            ThreadStandard::Acme | ThreadStandard::AcmeStub => (29.0, None),
            ThreadStandard::Din513 | ThreadStandard::Din513Stub => (3.0, Some(30.0)),
            ThreadStandard::AnsiButtress => (7.0, Some(45.0)),
        }
    }
}

impl FromStr for ThreadStandard {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "iso" | "iso261" | "metric" => Ok(ThreadStandard::Iso261),
            "din513" => Ok(ThreadStandard::Din513),
            "din513stub" | "stubdin513" => Ok(ThreadStandard::Din513Stub),
            "acme" => Ok(ThreadStandard::Acme),
            "acmestub" | "stubacme" => Ok(ThreadStandard::AcmeStub),
            "ansibuttress" | "buttress" => Ok(ThreadStandard::AnsiButtress),
            _ => Err(CalcError::invalid_input(
                "standard",
                s,
                "Expected one of: ISO 261, DIN 513, DIN 513 stub, ACME, ACME stub, ANSI buttress",
            )),
        }
    }
}

impl fmt::Display for ThreadStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThreadStandard::Iso261 => "ISO 261",
            ThreadStandard::Din513 => "DIN 513",
            ThreadStandard::Din513Stub => "DIN 513 stub",
            ThreadStandard::Acme => "ACME",
            ThreadStandard::AcmeStub => "ACME stub",
            ThreadStandard::AnsiButtress => "ANSI buttress",
        };
        f.write_str(name)
    }
}

/// Map alternative parameter names to slot names.
fn canonical_name(name: &str) -> &str {
    match name {
        "d" => "diameter",
        "p" => "pitch",
        "n" => "starts",
        "leadangle" => "lead_angle",
        "trailangle" => "trail_angle",
        "pitchoffset" => "pitch_offset",
        "profileheight" => "profile_height",
        "f" | "force" => "load",
        other => other,
    }
}

fn flank_factor(lead_angle: f64, trail_angle: f64) -> f64 {
    lead_angle.tan() + trail_angle.tan()
}

fn shear_von_mises(sigma: f64, tau: f64) -> f64 {
    StressState {
        sx: sigma,
        txy: tau,
        ..Default::default()
    }
    .von_mises()
}

// ============================================================================
// Model
// ============================================================================

/// Thread parameter graph.
#[derive(Debug, Clone)]
pub struct Thread {
    graph: ParameterGraph,
    standard: Option<ThreadStandard>,
    name: Option<String>,
    designation: Option<ThreadDesignation>,
}

impl Thread {
    /// Empty thread, optionally preset to a standard profile.
    pub fn new(standard: Option<ThreadStandard>) -> CalcResult<Self> {
        let mut graph = ParameterGraph::new("thread");
        graph
            .declare(Slot::input("diameter").validator(Validator::positive()))?
            .declare(Slot::input("pitch").validator(Validator::positive()))?
            .declare(
                Slot::input("starts")
                    .validator(Validator::integer_at_least(1.0))
                    .default_value(1.0),
            )?
            .declare(Slot::input("taper").default_value(0.0))?
            .declare(
                Slot::input("angle")
                    .validator(Validator::half_open(0.0, PI))
                    .rule(Rule::compute("lead + trail", &["lead_angle", "trail_angle"], |v| v[0] + v[1])),
            )?
            .declare(
                Slot::input("lead_angle")
                    .validator(Validator::half_open(0.0, PI / 2.0))
                    .rule(Rule::compute("angle - trail", &["angle", "trail_angle"], |v| v[0] - v[1]))
                    .default_rule(Rule::compute("angle / 2", &["angle"], |v| v[0] / 2.0)),
            )?
            .declare(
                Slot::input("trail_angle")
                    .validator(Validator::half_open(0.0, PI / 2.0))
                    .rule(Rule::compute("angle - lead", &["angle", "lead_angle"], |v| v[0] - v[1]))
                    .default_rule(Rule::compute("angle / 2", &["angle"], |v| v[0] / 2.0)),
            )?
            .declare(Slot::input("load"))?;

        let mut height = Slot::input("height").validator(Validator::non_negative());
        let mut pitch_offset = Slot::input("pitch_offset").default_value(0.0);
        match standard.and_then(|s| s.height_factor()) {
            Some(factor) => {
                height = height.default_rule(Rule::compute(format!("{} pitch", factor), &["pitch"], move |v| factor * v[0]));
            }
            None if standard.is_some() => {
                height = height.default_rule(Rule::compute("5/8 ph", &["profile_height"], |v| 5.0 / 8.0 * v[0]));
                pitch_offset = pitch_offset.default_rule(Rule::compute("ph / 16", &["profile_height"], |v| v[0] / 16.0));
            }
            None => {}
        }
        graph.declare(height)?.declare(pitch_offset)?;

        Self::declare_profile(&mut graph)?;
        Self::declare_stresses(&mut graph)?;

        if let Some(standard) = standard {
            match standard.angles() {
                (angle, None) => graph.assign("angle", angle.to_radians())?,
                (lead, Some(trail)) => {
                    graph.assign("lead_angle", lead.to_radians())?;
                    graph.assign("trail_angle", trail.to_radians())?;
                }
            }
            if standard.height_factor().is_some() {
                graph.assign("pitch_offset", 0.0)?;
            }
            debug!(%standard, "thread preset applied");
        }

        Ok(Thread {
            graph,
            standard,
            name: None,
            designation: None,
        })
    }

    fn declare_profile(graph: &mut ParameterGraph) -> CalcResult<()> {
        let flanks = ["lead_angle", "trail_angle"];
        graph
            .declare(Slot::derived("lead").rule(Rule::compute("starts pitch", &["starts", "pitch"], |v| v[0] * v[1])))?
            .declare(Slot::derived("profile_height").rule(Rule::compute(
                "pitch / (tan lead + tan trail)",
                &["pitch", flanks[0], flanks[1]],
                |v| v[0] / flank_factor(v[1], v[2]),
            )))?;

        let levels: [(&str, f64, f64); 4] = [
            ("h1", -1.0, -1.0),
            ("h2", -1.0, 1.0),
            ("big_h1", 1.0, 1.0),
            ("big_h2", 1.0, -1.0),
        ];
        for (name, offset_sign, height_sign) in levels {
            graph.declare(Slot::derived(name).rule(Rule::compute(
                name,
                &["profile_height", "pitch_offset", "height"],
                move |v| v[0] / 2.0 + offset_sign * v[1] + height_sign * v[2] / 2.0,
            )))?;
        }

        let widths = [
            ("male_crest_width", "h1"),
            ("male_root_width", "h2"),
            ("female_crest_width", "big_h1"),
            ("female_root_width", "big_h2"),
        ];
        for (name, level) in widths {
            graph.declare(Slot::derived(name).rule(Rule::compute(
                format!("{} (tan lead + tan trail)", level),
                &[level, flanks[0], flanks[1]],
                |v| v[0] * flank_factor(v[1], v[2]),
            )))?;
        }

        graph
            .declare(Slot::derived("male_root_area").rule(Rule::compute(
                "width pi (d - 2 height)",
                &["male_root_width", "diameter", "height"],
                |v| v[0] * 2.0 * PI * ((v[1] - 2.0 * v[2]) / 2.0),
            )))?
            .declare(Slot::derived("female_crest_area").rule(Rule::compute(
                "width pi d",
                &["female_crest_width", "diameter"],
                |v| v[0] * 2.0 * PI * v[1] / 2.0,
            )))?;
        Ok(())
    }

    fn declare_stresses(graph: &mut ParameterGraph) -> CalcResult<()> {
        let peak = peak_load_share();
        for (side, width, area) in [
            ("male", "male_root_width", "male_root_area"),
            ("female", "female_crest_width", "female_crest_area"),
        ] {
            graph
                .declare(Slot::derived(format!("{}_tau", side)).rule(Rule::compute(
                    "peak share load / area",
                    &["load", area],
                    move |v| peak * v[0] / v[1],
                )))?
                .declare(Slot::derived(format!("{}_lead_sigma", side)).rule(Rule::compute(
                    "flank thrust and bending",
                    &["load", "lead_angle", "height", width, area],
                    |v| (-v[0] * v[1].tan() + v[0] * v[2] / ((2.0 / 3.0) * v[3])) / v[4],
                )))?
                .declare(Slot::derived(format!("{}_trail_sigma", side)).rule(Rule::compute(
                    "flank thrust",
                    &["load", "lead_angle", area],
                    |v| -v[0] * v[1].tan() / v[2],
                )))?;

            let tau = format!("{}_tau", side);
            for flank in ["lead", "trail"] {
                let sigma = format!("{}_{}_sigma", side, flank);
                graph.declare(Slot::derived(format!("{}_{}_von_mises", side, flank)).rule(Rule::compute(
                    "von mises",
                    &[sigma.as_str(), tau.as_str()],
                    |v| shear_von_mises(v[0], v[1]),
                )))?;
            }
        }
        Ok(())
    }

    /// ISO profile from a metric designation such as `M10x1.5-6g`.
    pub fn from_designation(text: &str) -> CalcResult<Self> {
        let designation = parse_designation(text)?;
        let mut thread = Thread::new(Some(ThreadStandard::Iso261))?;
        thread.apply_designation(designation)?;
        Ok(thread)
    }

    /// Assign diameter, pitch and starts from a designation.
    pub fn apply_designation(&mut self, designation: ThreadDesignation) -> CalcResult<()> {
        self.graph.assign("diameter", designation.diameter)?;
        self.graph.assign("pitch", designation.pitch)?;
        self.graph.assign("starts", f64::from(designation.starts()))?;
        self.designation = Some(designation);
        Ok(())
    }

    pub fn graph(&self) -> &ParameterGraph {
        &self.graph
    }

    pub fn standard(&self) -> Option<ThreadStandard> {
        self.standard
    }

    pub fn designation(&self) -> Option<&ThreadDesignation> {
        self.designation.as_ref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Given name, else the designation, else `<standard> <d>x<pitch>` when
    /// both are known.
    pub fn name(&self) -> Option<String> {
        if let Some(name) = &self.name {
            return Some(name.clone());
        }
        if let Some(designation) = &self.designation {
            return Some(designation.to_string());
        }
        let [d, p] = self.graph.values(["diameter", "pitch"]).ok()?;
        Some(match self.standard {
            Some(standard) => format!("{} {}x{}", standard, d, p),
            None => format!("{}x{}", d, p),
        })
    }

    /// Assign a parameter by slot name. Angles are radians.
    pub fn assign(&mut self, name: &str, value: f64) -> CalcResult<()> {
        self.graph.assign(canonical_name(name), value)
    }

    pub fn delete(&mut self, name: &str) -> CalcResult<()> {
        self.graph.delete(canonical_name(name))
    }

    pub fn value(&self, name: &str) -> CalcResult<f64> {
        self.graph.value(canonical_name(name))
    }

    /// Whether the profile can exist: all of `h1`, `h2`, `H1`, `H2` are
    /// non-negative.
    pub fn check(&self) -> CalcResult<bool> {
        let levels = self.graph.values(["h1", "h2", "big_h1", "big_h2"])?;
        let valid = levels.iter().all(|h| *h >= 0.0);
        if !valid {
            warn!(h1 = levels[0], h2 = levels[1], big_h1 = levels[2], big_h2 = levels[3], "impossible thread profile");
        }
        Ok(valid)
    }

    pub fn geometry(&self) -> CalcResult<ThreadGeometry> {
        let g = &self.graph;
        let [diameter, pitch, lead, starts] = g.values(["diameter", "pitch", "lead", "starts"])?;
        let [angle, lead_angle, trail_angle] = g.values(["angle", "lead_angle", "trail_angle"])?;
        let [profile_height, height, pitch_offset] = g.values(["profile_height", "height", "pitch_offset"])?;
        let [h1, h2, big_h1, big_h2] = g.values(["h1", "h2", "big_h1", "big_h2"])?;
        let [male_crest_width, male_root_width, female_crest_width, female_root_width] = g.values([
            "male_crest_width",
            "male_root_width",
            "female_crest_width",
            "female_root_width",
        ])?;
        let [male_root_area, female_crest_area] = g.values(["male_root_area", "female_crest_area"])?;

        Ok(ThreadGeometry {
            diameter,
            pitch,
            lead,
            starts: starts as u32,
            angle: angle.to_degrees(),
            lead_angle: lead_angle.to_degrees(),
            trail_angle: trail_angle.to_degrees(),
            profile_height,
            height,
            pitch_offset,
            minor_diameter: diameter - 2.0 * height,
            h1,
            h2,
            big_h1,
            big_h2,
            male_crest_width,
            male_root_width,
            male_root_area,
            female_crest_width,
            female_root_width,
            female_crest_area,
        })
    }

    /// Flank stresses of the most loaded turn. Requires `load`.
    pub fn stresses(&self) -> CalcResult<ThreadStresses> {
        let g = &self.graph;
        let [male_tau, female_tau] = g.values(["male_tau", "female_tau"])?;
        let [male_lead_sigma, male_trail_sigma, female_lead_sigma, female_trail_sigma] = g.values([
            "male_lead_sigma",
            "male_trail_sigma",
            "female_lead_sigma",
            "female_trail_sigma",
        ])?;
        let von_mises = g.values([
            "male_lead_von_mises",
            "male_trail_von_mises",
            "female_lead_von_mises",
            "female_trail_von_mises",
        ])?;
        let [male_lead_von_mises, male_trail_von_mises, female_lead_von_mises, female_trail_von_mises] = von_mises;

        Ok(ThreadStresses {
            male_tau,
            female_tau,
            male_lead_sigma,
            male_trail_sigma,
            female_lead_sigma,
            female_trail_sigma,
            male_lead_von_mises,
            male_trail_von_mises,
            female_lead_von_mises,
            female_trail_von_mises,
            max_von_mises: von_mises.iter().copied().fold(0.0, f64::max),
        })
    }

    pub fn snapshot(&self) -> Vec<SlotReport> {
        self.graph.snapshot()
    }
}

// ============================================================================
// Input / Result
// ============================================================================

/// Profile dimensions. Angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadGeometry {
    pub diameter: f64,
    pub pitch: f64,
    pub lead: f64,
    pub starts: u32,
    pub angle: f64,
    pub lead_angle: f64,
    pub trail_angle: f64,
    pub profile_height: f64,
    pub height: f64,
    pub pitch_offset: f64,
    /// `diameter - 2 height`
    pub minor_diameter: f64,
    pub h1: f64,
    pub h2: f64,
    pub big_h1: f64,
    pub big_h2: f64,
    pub male_crest_width: f64,
    pub male_root_width: f64,
    pub male_root_area: f64,
    pub female_crest_width: f64,
    pub female_root_width: f64,
    pub female_crest_area: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreadStresses {
    pub male_tau: f64,
    pub female_tau: f64,
    pub male_lead_sigma: f64,
    pub male_trail_sigma: f64,
    pub female_lead_sigma: f64,
    pub female_trail_sigma: f64,
    pub male_lead_von_mises: f64,
    pub male_trail_von_mises: f64,
    pub female_lead_von_mises: f64,
    pub female_trail_von_mises: f64,
    pub max_von_mises: f64,
}

/// Input parameters for a thread calculation.
///
/// Either a designation or `diameter` and `pitch` are required. Explicit
/// fields override what the designation and the standard provide. Angles in
/// degrees.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Spindle nut",
///   "designation": "M20x2.5-6H/6g",
///   "load": 12000.0,
///   "material": { "name": "S355J2", "yield_strength": 355.0 }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadInput {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    /// Defaults to ISO 261 when a designation is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<ThreadStandard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trail_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
    #[serde(default)]
    pub material: Material,
}

impl ThreadInput {
    pub fn validate(&self) -> CalcResult<()> {
        if self.designation.is_none() && (self.diameter.is_none() || self.pitch.is_none()) {
            return Err(CalcError::invalid_input(
                "thread",
                self.label.clone(),
                "Either a designation or diameter and pitch are required",
            ));
        }
        Ok(())
    }

    pub fn to_model(&self) -> CalcResult<Thread> {
        let standard = match (&self.designation, self.standard) {
            (Some(_), None) => Some(ThreadStandard::Iso261),
            (_, standard) => standard,
        };
        let mut thread = Thread::new(standard)?;
        if let Some(text) = &self.designation {
            thread.apply_designation(parse_designation(text)?)?;
        }
        thread.set_name(self.name.clone());

        let values = [
            ("diameter", self.diameter),
            ("pitch", self.pitch),
            ("starts", self.starts.map(f64::from)),
            ("angle", self.angle.map(f64::to_radians)),
            ("lead_angle", self.lead_angle.map(f64::to_radians)),
            ("trail_angle", self.trail_angle.map(f64::to_radians)),
            ("height", self.height),
            ("pitch_offset", self.pitch_offset),
            ("load", self.load),
        ];
        for (name, value) in values {
            if let Some(value) = value {
                thread.assign(name, value)?;
            }
        }
        Ok(thread)
    }
}

/// Results of a thread calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResult {
    pub label: String,
    pub name: Option<String>,
    pub standard: Option<ThreadStandard>,
    pub designation: Option<ThreadDesignation>,
    pub geometry: ThreadGeometry,
    /// `false` when the profile has a negative crest or root
    pub geometry_ok: bool,
    /// `None` without a load or with an impossible profile
    pub stresses: Option<ThreadStresses>,
    pub safety_factor: Option<f64>,
}

/// Calculate the thread profile and, given a load, the flank stresses.
pub fn calculate(input: &ThreadInput) -> CalcResult<ThreadResult> {
    input.validate()?;
    let thread = input.to_model()?;
    let geometry = thread.geometry()?;
    let geometry_ok = thread.check()?;

    let stresses = if geometry_ok && input.load.is_some() {
        Some(thread.stresses()?)
    } else {
        None
    };
    let safety_factor = stresses
        .as_ref()
        .and_then(|s| input.material.safety_factor(s.max_von_mises));

    Ok(ThreadResult {
        label: input.label.clone(),
        name: thread.name(),
        standard: thread.standard(),
        designation: thread.designation().cloned(),
        geometry,
        geometry_ok,
        stresses,
        safety_factor,
    })
}
