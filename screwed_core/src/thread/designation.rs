//! # Metric Thread Designations
//!
//! Reader and writer for ISO 965-1 style designations such as
//! `M10x1.5-6H/6g` or `M8xPh2.5P1.25 (two starts)-7H-LH`.
//!
//! ## Grammar
//!
//! ```text
//! designation := "M" diameter [sep pitch_part] ["-" tolerances] ["-" engagement] ["-" "LH"]
//! sep         := "x" | "X" | "×"
//! pitch_part  := ["Ph"] lead "P" pitch ["(" text ")"] | pitch
//! tolerances  := [grade [grade]] ["/"] [grade [grade]]      grade := digits letter
//! engagement  := "S" | "N" | "L"
//! ```
//!
//! Internal tolerances use upper-case letters, external ones lower-case. A
//! missing minor (internal) or major (external) tolerance repeats the pitch
//! tolerance. Letters are case-insensitive elsewhere and `,` is accepted as
//! the decimal separator. When the pitch is omitted the ISO 261 coarse pitch
//! of the diameter is used.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::scan::Scanner;

/// ISO 261 coarse pitch series, `(diameter, pitch)`.
const COARSE_PITCHES: [(f64, f64); 30] = [
    (1.0, 0.25),
    (1.2, 0.25),
    (1.6, 0.35),
    (2.0, 0.4),
    (2.5, 0.45),
    (3.0, 0.5),
    (4.0, 0.7),
    (5.0, 0.8),
    (6.0, 1.0),
    (8.0, 1.25),
    (10.0, 1.5),
    (12.0, 1.75),
    (14.0, 2.0),
    (16.0, 2.0),
    (18.0, 2.5),
    (20.0, 2.5),
    (22.0, 2.5),
    (24.0, 3.0),
    (27.0, 3.0),
    (30.0, 3.5),
    (33.0, 3.5),
    (36.0, 4.0),
    (39.0, 4.0),
    (42.0, 4.5),
    (45.0, 4.5),
    (48.0, 5.0),
    (52.0, 5.0),
    (56.0, 5.5),
    (60.0, 5.5),
    (64.0, 6.0),
];

/// Coarse pitch for a nominal diameter, if it is in the ISO 261 series.
pub fn coarse_pitch(diameter: f64) -> Option<f64> {
    COARSE_PITCHES
        .iter()
        .find(|(d, _)| (d - diameter).abs() < 1e-9)
        .map(|&(_, p)| p)
}

/// Length of thread engagement group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engagement {
    /// Short
    S,
    /// Normal
    N,
    /// Long
    L,
}

impl fmt::Display for Engagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Engagement::S => "S",
            Engagement::N => "N",
            Engagement::L => "L",
        };
        f.write_str(letter)
    }
}

/// Decoded thread designation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadDesignation {
    pub diameter: f64,
    pub pitch: f64,
    /// Axial advance per turn; equals the pitch for single-start threads
    pub lead: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_pitch_tolerance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_minor_tolerance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_pitch_tolerance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_major_tolerance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<Engagement>,
    #[serde(default)]
    pub left_handed: bool,
}

impl ThreadDesignation {
    /// Number of thread starts, `lead / pitch`.
    pub fn starts(&self) -> u32 {
        (self.lead / self.pitch).round() as u32
    }
}

impl FromStr for ThreadDesignation {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_designation(s)
    }
}

/// Parse a metric thread designation.
///
/// # Example
///
/// ```rust
/// use screwed_core::thread::designation::parse_designation;
///
/// let d = parse_designation("m8 X ph2,5p1,25(two starts) - 7H / 7g").unwrap();
/// assert_eq!(d.starts(), 2);
/// assert_eq!(d.to_string(), "M8xPh2.5P1.25-7H/7g");
/// ```
pub fn parse_designation(input: &str) -> CalcResult<ThreadDesignation> {
    let mut scanner = Scanner::new(input);
    if !scanner.eat('M') && !scanner.eat('m') {
        return Err(scanner.error("expected 'M'"));
    }
    scanner.skip_whitespace();
    let diameter = scanner
        .unsigned_number()
        .ok_or_else(|| scanner.error("expected nominal diameter"))?;

    let mut pitch = None;
    let mut lead = None;
    if scanner.eat_any(&['x', 'X', '\u{00D7}']).is_some() {
        scanner.skip_whitespace();
        let has_ph = scanner.eat_word("ph");
        scanner.skip_whitespace();
        let first = scanner
            .unsigned_number()
            .ok_or_else(|| scanner.error("expected pitch"))?;
        scanner.skip_whitespace();
        if scanner.eat_word("p") {
            scanner.skip_whitespace();
            let second = scanner
                .unsigned_number()
                .ok_or_else(|| scanner.error("expected pitch after 'P'"))?;
            lead = Some(first);
            pitch = Some(second);
            skip_remark(&mut scanner)?;
        } else if has_ph {
            return Err(scanner.error("expected 'P' after lead"));
        } else {
            pitch = Some(first);
        }
    }

    let pitch = match pitch {
        Some(p) => p,
        None => coarse_pitch(diameter)
            .ok_or_else(|| scanner.error(format!("no pitch given and M{} has no coarse pitch", diameter)))?,
    };
    if pitch <= 0.0 {
        return Err(scanner.error("pitch must be positive"));
    }
    let lead = lead.unwrap_or(pitch);
    let ratio = lead / pitch;
    if ratio < 1.0 - 1e-9 || (ratio - ratio.round()).abs() > 1e-9 * ratio.max(1.0) {
        return Err(scanner.error(format!(
            "lead {} is not an integer multiple of pitch {}",
            lead, pitch
        )));
    }

    let mut designation = ThreadDesignation {
        diameter,
        pitch,
        lead,
        internal_pitch_tolerance: None,
        internal_minor_tolerance: None,
        external_pitch_tolerance: None,
        external_major_tolerance: None,
        engagement: None,
        left_handed: false,
    };

    while scanner.eat('-') {
        scanner.skip_whitespace();
        if designation.left_handed {
            return Err(scanner.error("nothing may follow 'LH'"));
        }
        if matches!(scanner.peek(), Some(c) if c.is_ascii_digit()) {
            if designation.engagement.is_some() || has_tolerances(&designation) {
                return Err(scanner.error("tolerance class out of place"));
            }
            parse_tolerances(&mut scanner, &mut designation)?;
        } else if scanner.eat_word("lh") {
            designation.left_handed = true;
        } else if let Some(c) = scanner.eat_any(&['S', 's', 'N', 'n', 'L', 'l']) {
            if designation.engagement.is_some() {
                return Err(scanner.error("engagement given twice"));
            }
            designation.engagement = Some(match c.to_ascii_uppercase() {
                'S' => Engagement::S,
                'L' => Engagement::L,
                _ => Engagement::N,
            });
        } else {
            return Err(scanner.error("expected tolerance class, engagement or 'LH'"));
        }
    }

    if !scanner.is_at_end() {
        return Err(scanner.error("unexpected trailing input"));
    }
    Ok(designation)
}

/// Skip a parenthesised remark such as `(two starts)`.
fn skip_remark(scanner: &mut Scanner<'_>) -> CalcResult<()> {
    if !scanner.eat('(') {
        return Ok(());
    }
    while let Some(c) = scanner.advance() {
        if c == ')' {
            return Ok(());
        }
    }
    Err(scanner.error("unclosed '('"))
}

fn has_tolerances(d: &ThreadDesignation) -> bool {
    d.internal_pitch_tolerance.is_some() || d.external_pitch_tolerance.is_some()
}

/// Read up to two internal grades, an optional `/`, then up to two external
/// grades.
fn parse_tolerances(scanner: &mut Scanner<'_>, designation: &mut ThreadDesignation) -> CalcResult<()> {
    let mut internal: Vec<String> = Vec::new();
    let mut external: Vec<String> = Vec::new();
    loop {
        scanner.eat('/');
        scanner.skip_whitespace();
        if !matches!(scanner.peek(), Some(c) if c.is_ascii_digit()) {
            break;
        }
        let grade = scanner
            .integer()
            .ok_or_else(|| scanner.error("expected tolerance grade"))?;
        let letter = match scanner.peek() {
            Some(c) if c.is_ascii_alphabetic() => c,
            _ => return Err(scanner.error("expected tolerance position letter")),
        };
        scanner.advance();
        let class = format!("{}{}", grade, letter);
        if letter.is_ascii_uppercase() {
            if !external.is_empty() || internal.len() == 2 {
                return Err(scanner.error(format!("unexpected internal tolerance '{}'", class)));
            }
            internal.push(class);
        } else {
            if external.len() == 2 {
                return Err(scanner.error(format!("unexpected external tolerance '{}'", class)));
            }
            external.push(class);
        }
    }

    let mut internal = internal.into_iter();
    designation.internal_pitch_tolerance = internal.next();
    designation.internal_minor_tolerance = internal.next().or_else(|| designation.internal_pitch_tolerance.clone());
    let mut external = external.into_iter();
    designation.external_pitch_tolerance = external.next();
    designation.external_major_tolerance = external.next().or_else(|| designation.external_pitch_tolerance.clone());
    Ok(())
}

/// `pitch` followed by the second grade when it differs.
fn tolerance_class(pitch: &Option<String>, other: &Option<String>) -> Option<String> {
    pitch.as_ref().map(|p| match other {
        Some(o) if o != p => format!("{}{}", p, o),
        _ => p.clone(),
    })
}

impl fmt::Display for ThreadDesignation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.diameter)?;
        if self.starts() > 1 {
            write!(f, "xPh{}P{}", self.lead, self.pitch)?;
        } else {
            write!(f, "x{}", self.pitch)?;
        }

        let classes: Vec<String> = [
            tolerance_class(&self.internal_pitch_tolerance, &self.internal_minor_tolerance),
            tolerance_class(&self.external_pitch_tolerance, &self.external_major_tolerance),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !classes.is_empty() {
            write!(f, "-{}", classes.join("/"))?;
        }

        match self.engagement {
            Some(Engagement::N) | None => {}
            Some(engagement) => write!(f, "-{}", engagement)?,
        }
        if self.left_handed {
            f.write_str("-LH")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_designation() {
        let d = parse_designation("M10 \u{00D7} 1.5 - 7H/7g6g").unwrap();
        assert_eq!(d.diameter, 10.0);
        assert_eq!(d.pitch, 1.5);
        assert_eq!(d.lead, 1.5);
        assert_eq!(d.internal_pitch_tolerance.as_deref(), Some("7H"));
        assert_eq!(d.internal_minor_tolerance.as_deref(), Some("7H"));
        assert_eq!(d.external_pitch_tolerance.as_deref(), Some("7g"));
        assert_eq!(d.external_major_tolerance.as_deref(), Some("6g"));
        assert_eq!(d.engagement, None);
        assert!(!d.left_handed);
        assert_eq!(d.to_string(), "M10x1.5-7H/7g6g");
    }

    #[test]
    fn test_multi_start_loose_notation() {
        let d = parse_designation("m8 X ph2,5p1,25(two starts) - 7H / 7g").unwrap();
        assert_eq!(d.lead, 2.5);
        assert_eq!(d.pitch, 1.25);
        assert_eq!(d.starts(), 2);
        assert_eq!(d.to_string(), "M8xPh2.5P1.25-7H/7g");
    }

    #[test]
    fn test_engagement_and_left_hand() {
        let d = parse_designation("M20x2-5H6H-L-LH").unwrap();
        assert_eq!(d.internal_pitch_tolerance.as_deref(), Some("5H"));
        assert_eq!(d.internal_minor_tolerance.as_deref(), Some("6H"));
        assert_eq!(d.external_pitch_tolerance, None);
        assert_eq!(d.engagement, Some(Engagement::L));
        assert!(d.left_handed);
        assert_eq!(d.to_string(), "M20x2-5H6H-L-LH");

        let lh = parse_designation("M6-LH").unwrap();
        assert!(lh.left_handed);
        assert_eq!(lh.engagement, None);
    }

    #[test]
    fn test_external_only() {
        let d = parse_designation("M12x1.25-6g").unwrap();
        assert_eq!(d.internal_pitch_tolerance, None);
        assert_eq!(d.external_major_tolerance.as_deref(), Some("6g"));
        assert_eq!(d.to_string(), "M12x1.25-6g");
    }

    #[test]
    fn test_coarse_pitch_default() {
        let d = parse_designation("M10").unwrap();
        assert_eq!(d.pitch, 1.5);
        assert_eq!(d.to_string(), "M10x1.5");
        assert!(parse_designation("M11").is_err());
    }

    #[test]
    fn test_lead_must_be_multiple_of_pitch() {
        let err = parse_designation("M8xPh2P1.5").unwrap_err();
        assert_eq!(err.error_code(), "PARSE_ERROR");
        assert!(parse_designation("M8xPh1P1.5").is_err());
        assert!(parse_designation("M8xPh3P1.5").is_ok());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_designation("10x1.5").is_err());
        assert!(parse_designation("M10x").is_err());
        assert!(parse_designation("M10xPh3").is_err());
        assert!(parse_designation("M10x1.5-6h6H").is_err());
        assert!(parse_designation("M10x1.5-6H junk").is_err());
        assert!(parse_designation("M10x1.5-LH-6g").is_err());
        assert!(parse_designation("M8xPh2.5P1.25 (open").is_err());
    }

    #[test]
    fn test_from_str_and_serde() {
        let d: ThreadDesignation = "M16x2-6H/6g-S".parse().unwrap();
        assert_eq!(d.engagement, Some(Engagement::S));
        let json = serde_json::to_string(&d).unwrap();
        let back: ThreadDesignation = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
