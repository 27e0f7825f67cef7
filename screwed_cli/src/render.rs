//! Plain-text rendering of calculation results.

use std::fmt::Write;

use screwed_core::spring::SpringResult;
use screwed_core::stack::StackReport;
use screwed_core::thread::{ThreadDesignation, ThreadResult};
use screwed_core::tube::{TubeResult, WallStress};
use screwed_core::workbook::{CalculationOutput, ItemOutcome};

const WIDTH: usize = 22;

fn line(out: &mut String, name: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{:<width$}{}", name, value, width = WIDTH);
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".to_string())
}

pub fn output(output: &CalculationOutput) -> String {
    match output {
        CalculationOutput::Stack(report) => stack(report),
        CalculationOutput::Tube(result) => tube(result),
        CalculationOutput::Spring(result) => spring(result),
        CalculationOutput::SpringTable(table) => {
            let mut out = String::new();
            line(&mut out, "spring table", format!("{} x {}", table.wire_heights.len(), table.wire_widths.len()));
            out
        }
        CalculationOutput::Thread(result) => thread(result),
    }
}

pub fn outcome(outcome: &ItemOutcome) -> String {
    let mut out = format!("\n== {} [{}]\n", outcome.label, outcome.calc_type);
    match (&outcome.output, &outcome.error) {
        (Some(result), _) => out.push_str(&output(result)),
        (None, Some(err)) => line(&mut out, "error", err),
        (None, None) => {}
    }
    out
}

pub fn stack(report: &StackReport) -> String {
    let mut out = String::new();
    line(&mut out, "result", &report.result);
    line(&mut out, "bounds", format!("{} .. {}", report.lower_bound, report.upper_bound));
    if let (Some(requirement), Some(matches)) = (&report.requirement, report.matches) {
        let mode = report.compare_mode.unwrap_or_default();
        line(&mut out, "requirement", format!("{} [{}]", requirement, mode));
        line(&mut out, "matches", if matches { "yes" } else { "NO" });
    }
    out
}

pub fn designation(d: &ThreadDesignation) -> String {
    let mut out = String::new();
    line(&mut out, "designation", d);
    line(&mut out, "diameter", d.diameter);
    line(&mut out, "pitch", d.pitch);
    line(&mut out, "lead", d.lead);
    line(&mut out, "starts", d.starts());
    let tolerance = |pitch: &Option<String>, other: &Option<String>| match (pitch, other) {
        (Some(p), Some(o)) if p != o => format!("{}{}", p, o),
        (Some(p), _) => p.clone(),
        (None, _) => "-".to_string(),
    };
    line(
        &mut out,
        "internal tolerance",
        tolerance(&d.internal_pitch_tolerance, &d.internal_minor_tolerance),
    );
    line(
        &mut out,
        "external tolerance",
        tolerance(&d.external_pitch_tolerance, &d.external_major_tolerance),
    );
    if let Some(engagement) = &d.engagement {
        line(&mut out, "engagement", engagement);
    }
    line(&mut out, "hand", if d.left_handed { "left" } else { "right" });
    out
}

pub fn thread(result: &ThreadResult) -> String {
    let mut out = String::new();
    if let Some(designation) = &result.designation {
        line(&mut out, "designation", designation);
    }
    if let Some(standard) = result.standard {
        line(&mut out, "standard", standard);
    }
    let g = &result.geometry;
    line(&mut out, "diameter", g.diameter);
    line(&mut out, "pitch", format!("{} (lead {}, {} start)", g.pitch, g.lead, g.starts));
    line(&mut out, "flank angles", format!("{:.1}° + {:.1}°", g.lead_angle, g.trail_angle));
    line(&mut out, "profile height", format!("{:.4}", g.profile_height));
    line(&mut out, "thread height", format!("{:.4}", g.height));
    line(&mut out, "minor diameter", format!("{:.4}", g.minor_diameter));
    line(&mut out, "male root area", format!("{:.3}", g.male_root_area));
    line(&mut out, "female crest area", format!("{:.3}", g.female_crest_area));
    if !result.geometry_ok {
        line(&mut out, "geometry", "IMPOSSIBLE (negative crest or root)");
    }
    if let Some(s) = &result.stresses {
        line(&mut out, "male shear", format!("{:.2}", s.male_tau));
        line(&mut out, "female shear", format!("{:.2}", s.female_tau));
        line(&mut out, "male Von Mises", format!("{:.2} / {:.2}", s.male_lead_von_mises, s.male_trail_von_mises));
        line(&mut out, "female Von Mises", format!("{:.2} / {:.2}", s.female_lead_von_mises, s.female_trail_von_mises));
        line(&mut out, "max Von Mises", format!("{:.2}", s.max_von_mises));
    }
    if result.stresses.is_some() {
        line(&mut out, "safety factor", optional(result.safety_factor));
    }
    out
}

fn wall(out: &mut String, name: &str, w: &WallStress) {
    line(
        out,
        name,
        format!(
            "radial {:.2}  hoop {:.2}  axial {:.2}  shear {:.2}  VM {:.2}",
            w.radial, w.hoop, w.axial, w.shear, w.von_mises
        ),
    );
}

pub fn tube(r: &TubeResult) -> String {
    let mut out = String::new();
    line(&mut out, "radii", format!("re {}  ri {}  w {}", r.radius_external, r.radius_internal, r.wallthickness));
    line(&mut out, "diameters", format!("de {}  di {}", r.diameter_external, r.diameter_internal));
    line(&mut out, "wall area", format!("{:.3}", r.area_wall));
    line(&mut out, "ix = iy", format!("{:.3}", r.ix));
    line(&mut out, "iz", format!("{:.3}", r.iz));
    line(&mut out, "net pressure", r.pressure_net);
    wall(&mut out, "outer wall", &r.outer);
    wall(&mut out, "inner wall", &r.inner);
    line(&mut out, "max Von Mises", format!("{:.2}", r.max_von_mises));
    line(&mut out, "buckling (pressure)", optional(r.buckling_pressure_ratio));
    line(&mut out, "buckling (force)", optional(r.buckling_force_ratio));
    line(&mut out, "safety factor", optional(r.safety_factor));
    out
}

pub fn spring(r: &SpringResult) -> String {
    let mut out = String::new();
    if let Some(shape) = r.wire_shape {
        line(&mut out, "wire", format!("{:?}", shape).to_lowercase());
    }
    for parameter in &r.parameters {
        if let Some(value) = parameter.value {
            line(&mut out, &parameter.name, format!("{:.4}", value));
        }
    }
    if let Some(case) = &r.load_case {
        line(&mut out, "deflection", format!("{:.3}", case.deflection));
        line(&mut out, "shear stress", format!("{:.2}", case.shear_stress));
        line(&mut out, "rate", format!("{:.3}", case.rate));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use screwed_core::stack::report;
    use screwed_core::tolerance::CompareMode;

    #[test]
    fn test_stack_lines() {
        let requirement = "0.5 ±0.2".parse().unwrap();
        let text = stack(&report("[40 ±0.1] - [39.5 ±0.05]", Some(requirement), CompareMode::Equivalent).unwrap());
        assert!(text.starts_with("result"));
        assert!(text.contains("[equivalent]"));
        assert!(text.lines().any(|l| l.starts_with("matches") && l.ends_with("NO")));
    }

    #[test]
    fn test_designation_lines() {
        let d: ThreadDesignation = "M10x1.25-5H6H/6g-LH".parse().unwrap();
        let text = designation(&d);
        assert!(text.lines().any(|l| l.starts_with("internal tolerance") && l.ends_with("5H6H")));
        assert!(text.lines().any(|l| l.starts_with("external tolerance") && l.ends_with("6g")));
        assert!(text.lines().any(|l| l.starts_with("hand") && l.ends_with("left")));
    }
}
