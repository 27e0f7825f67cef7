//! # Screwed CLI
//!
//! Command-line front end for `screwed_core`.
//!
//! ## Commands
//!
//! - `screwed stack "[40 ±0.1] - [39.5 ±0.05]" --against "0.5 ±0.2"`
//! - `screwed thread parse M10x1.25-6H/6g`
//! - `screwed thread analyze M10 --load 5000 --material s355`
//! - `screwed tube --de 60 --w 5 --pi 20 --capped`
//! - `screwed spring table --external-diameter 40 --load 100 --coils 8 --modulus 81500 --wire 3 4 --height 3 4`
//! - `screwed run housing.scw`
//!
//! `--json` switches every command to JSON output. Logging goes to stderr;
//! the level comes from `RUST_LOG` (default `warn`), `-v` forces `debug`.

mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use screwed_core::materials::Material;
use screwed_core::spring::SpringTableInput;
use screwed_core::stack::StackInput;
use screwed_core::thread::{parse_designation, ThreadInput, ThreadStandard};
use screwed_core::tolerance::CompareMode;
use screwed_core::tube::{TubeDimension, TubeInput};
use screwed_core::workbook::CalculationOutput;
use screwed_core::{export, load_workbook, CalcError, CalcSettings, CalculationItem};

/// Tolerance stacks, tubes, springs and threads
#[derive(Parser)]
#[command(name = "screwed")]
#[command(about = "Mechanical design calculations", long_about = None)]
#[command(version)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Calculation settings (JSON file)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a tolerance stack such as "[40 ±0.1] - 2*[7 +0/-0.1]"
    Stack {
        #[arg(name = "EXPR", allow_hyphen_values = true)]
        expression: String,

        /// Compare mode: exact, equivalent or linear.<digits>
        #[arg(long, value_name = "MODE")]
        compare: Option<CompareMode>,

        /// Required dimension, e.g. "0.5 +0.2/-0.1"
        #[arg(long, value_name = "DIM", allow_hyphen_values = true)]
        against: Option<String>,
    },

    /// Metric thread designations and profiles
    Thread {
        #[command(subcommand)]
        command: ThreadCommand,
    },

    /// Thick-walled tube under pressure, axial force and torsion
    Tube(TubeArgs),

    /// Helical compression springs
    Spring {
        #[command(subcommand)]
        command: SpringCommand,
    },

    /// Calculate every item of a workbook
    Run {
        #[arg(name = "WORKBOOK")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ThreadCommand {
    /// Decode a designation such as "M8xPh2.5P1.25-7H/7g-LH"
    Parse {
        #[arg(name = "DESIGNATION")]
        designation: String,
    },

    /// Profile geometry and, given a load, flank stresses
    Analyze {
        #[arg(name = "DESIGNATION")]
        designation: String,

        /// Axial load carried by the thread
        #[arg(long)]
        load: Option<f64>,

        /// Profile standard (iso, din513, acme, ...); defaults to ISO 261
        #[arg(long)]
        standard: Option<ThreadStandard>,

        /// Material preset used for the safety factor
        #[arg(long)]
        material: Option<String>,
    },
}

#[derive(clap::Args)]
struct TubeArgs {
    /// External radius
    #[arg(long = "re")]
    radius_external: Option<f64>,

    /// Internal radius
    #[arg(long = "ri")]
    radius_internal: Option<f64>,

    /// Wall thickness
    #[arg(long = "w")]
    wallthickness: Option<f64>,

    /// External diameter
    #[arg(long = "de")]
    diameter_external: Option<f64>,

    /// Internal diameter
    #[arg(long = "di")]
    diameter_internal: Option<f64>,

    /// Length, needed for the buckling force ratio
    #[arg(long)]
    length: Option<f64>,

    /// Internal pressure
    #[arg(long = "pi", default_value_t = 0.0)]
    pressure_internal: f64,

    /// External pressure
    #[arg(long = "pe", default_value_t = 0.0)]
    pressure_external: f64,

    /// Axial force, positive in compression
    #[arg(long = "force", default_value_t = 0.0, allow_hyphen_values = true)]
    force_axial: f64,

    /// Torsion about the tube axis
    #[arg(long = "torsion", default_value_t = 0.0, allow_hyphen_values = true)]
    torsion_axial: f64,

    /// Closed ends carry the pressure axially
    #[arg(long)]
    capped: bool,

    /// Radial dimension kept when a third one is assigned
    #[arg(long, value_name = "MEMBER")]
    lock: Option<TubeDimension>,

    /// Material preset (s235, s355, 1.4301, 6061-t6)
    #[arg(long)]
    material: Option<String>,
}

#[derive(Subcommand)]
enum SpringCommand {
    /// Deflection and shear stress over a grid of wire sizes
    Table {
        /// Outer coil diameter
        #[arg(long)]
        external_diameter: f64,

        #[arg(long)]
        load: f64,

        /// Active coils
        #[arg(long)]
        coils: f64,

        /// Modulus of rigidity; taken from --material when omitted
        #[arg(long)]
        modulus: Option<f64>,

        #[arg(long)]
        material: Option<String>,

        /// Wire widths (columns)
        #[arg(long = "wire", num_args = 1.., required = true)]
        wire_widths: Vec<f64>,

        /// Wire heights (rows)
        #[arg(long = "height", num_args = 1.., required = true)]
        wire_heights: Vec<f64>,

        /// Write CSV to this file instead of stdout
        #[arg(long, value_name = "CSV")]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            report_error(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(err: &anyhow::Error, json: bool) {
    if json {
        if let Some(calc) = err.downcast_ref::<CalcError>() {
            let body = serde_json::json!({ "error": calc, "message": format!("{:#}", err) });
            eprintln!("{}", body);
            return;
        }
    }
    eprintln!("error: {:#}", err);
}

/// Dispatch one command. `Ok(false)` means the command ran but something in
/// it failed (a workbook item).
fn run(cli: &Cli) -> Result<bool> {
    let settings = match &cli.settings {
        Some(path) => CalcSettings::load(path).with_context(|| format!("loading settings {}", path.display()))?,
        None => CalcSettings::default(),
    };
    debug!(?settings, "settings");

    match &cli.command {
        Commands::Stack {
            expression,
            compare,
            against,
        } => {
            let item = CalculationItem::Stack(StackInput {
                label: String::new(),
                expression: expression.clone(),
                requirement: against.clone(),
                compare_mode: *compare,
            });
            calculate_and_print(&item, &settings, cli.json)
        }
        Commands::Thread {
            command: ThreadCommand::Parse { designation },
        } => {
            let parsed = parse_designation(designation)?;
            if cli.json {
                print_json(&parsed)?;
            } else {
                print!("{}", render::designation(&parsed));
            }
            Ok(true)
        }
        Commands::Thread {
            command:
                ThreadCommand::Analyze {
                    designation,
                    load,
                    standard,
                    material,
                },
        } => {
            let item = CalculationItem::Thread(ThreadInput {
                designation: Some(designation.clone()),
                standard: *standard,
                load: *load,
                material: material_preset(material.as_deref())?,
                ..Default::default()
            });
            calculate_and_print(&item, &settings, cli.json)
        }
        Commands::Tube(args) => {
            let item = CalculationItem::Tube(TubeInput {
                label: String::new(),
                radius_external: args.radius_external,
                radius_internal: args.radius_internal,
                wallthickness: args.wallthickness,
                diameter_external: args.diameter_external,
                diameter_internal: args.diameter_internal,
                length: args.length,
                pressure_internal: args.pressure_internal,
                pressure_external: args.pressure_external,
                force_axial: args.force_axial,
                torsion_axial: args.torsion_axial,
                torsion_radial: 0.0,
                capped: args.capped,
                lock: args.lock,
                material: material_preset(args.material.as_deref())?,
            });
            calculate_and_print(&item, &settings, cli.json)
        }
        Commands::Spring {
            command:
                SpringCommand::Table {
                    external_diameter,
                    load,
                    coils,
                    modulus,
                    material,
                    wire_widths,
                    wire_heights,
                    out,
                },
        } => {
            let rigidity_modulus = match (modulus, material) {
                (Some(g), _) => *g,
                (None, Some(name)) => match Material::preset(name)?.rigidity_modulus() {
                    Some(g) => g,
                    None => bail!("material {} has no elastic constants", name),
                },
                (None, None) => bail!("either --modulus or --material is required"),
            };
            let item = CalculationItem::SpringTable(SpringTableInput {
                label: String::new(),
                external_diameter: *external_diameter,
                wire_widths: wire_widths.clone(),
                wire_heights: wire_heights.clone(),
                coil_count: *coils,
                load: *load,
                rigidity_modulus,
            });
            let CalculationOutput::SpringTable(table) = item.calculate(&settings)? else {
                bail!("unexpected output for a spring table");
            };

            match out {
                Some(path) => {
                    export::save_spring_table(&table, &settings, path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    if !cli.json {
                        println!("wrote {}", path.display());
                    }
                }
                None if cli.json => print_json(&table)?,
                None => print!("{}", export::spring_table_to_string(&table, &settings)?),
            }
            Ok(true)
        }
        Commands::Run { path } => {
            let mut workbook = load_workbook(path).with_context(|| format!("loading workbook {}", path.display()))?;
            if cli.settings.is_some() {
                workbook.settings = settings;
            }
            let outcomes = workbook.run();
            let all_ok = outcomes.iter().all(|o| o.error.is_none());

            if cli.json {
                print_json(&outcomes)?;
            } else {
                println!("{} ({} items)", workbook.meta.title, outcomes.len());
                for outcome in &outcomes {
                    print!("{}", render::outcome(outcome));
                }
            }
            Ok(all_ok)
        }
    }
}

fn calculate_and_print(item: &CalculationItem, settings: &CalcSettings, json: bool) -> Result<bool> {
    let output = item.calculate(settings)?;
    if json {
        print_json(&output)?;
    } else {
        print!("{}", render::output(&output));
    }
    Ok(true)
}

fn material_preset(name: Option<&str>) -> Result<Material> {
    match name {
        Some(name) => Ok(Material::preset(name)?),
        None => Ok(Material::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stack_with_leading_minus() {
        let cli = Cli::try_parse_from(["screwed", "stack", "-[1 ±0.1] + [3 ±0.1]", "--compare", "linear.5"]).unwrap();
        match cli.command {
            Commands::Stack { expression, compare, .. } => {
                assert_eq!(expression, "-[1 ±0.1] + [3 ±0.1]");
                assert_eq!(compare, Some(CompareMode::Linear(0.5)));
            }
            _ => panic!("expected stack command"),
        }
    }

    #[test]
    fn test_parse_tube_lock() {
        let cli = Cli::try_parse_from(["screwed", "--json", "tube", "--re", "30", "--w", "5", "--lock", "w"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Tube(args) => {
                assert_eq!(args.lock, Some(TubeDimension::Wallthickness));
                assert!(!args.capped);
            }
            _ => panic!("expected tube command"),
        }
    }

    #[test]
    fn test_parse_spring_table_lists() {
        let cli = Cli::try_parse_from([
            "screwed", "spring", "table", "--external-diameter", "40", "--load", "100", "--coils", "8",
            "--modulus", "81500", "--wire", "3", "4", "--height", "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Spring {
                command: SpringCommand::Table { wire_widths, wire_heights, .. },
            } => {
                assert_eq!(wire_widths, vec![3.0, 4.0]);
                assert_eq!(wire_heights, vec![3.0]);
            }
            _ => panic!("expected spring table command"),
        }
    }

    #[test]
    fn test_unknown_standard_is_rejected() {
        assert!(Cli::try_parse_from(["screwed", "thread", "analyze", "M10", "--standard", "whitworth"]).is_err());
    }
}
