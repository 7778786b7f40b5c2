mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use juggle_pattern::{Coordinate, Hand, JmlNode, Pattern, PatternError};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, ExitStatus};

#[derive(Parser)]
#[command(name = "juggle", version, long_about = None)]
#[command(about = "Lay out and sample juggling patterns")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Lay a pattern out and print a summary
    Layout {
        /// Pattern document (JSON or YAML)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Write the laid-out pattern back as a document (JSON or YAML)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print evenly spaced samples of one path over a loop
    Sample {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// 1-based path number
        #[arg(short, long, default_value_t = 1)]
        path: usize,

        /// Number of samples
        #[arg(short, long, default_value_t = 20)]
        steps: usize,
    },
    /// Print a juggler's body pose at one instant
    Pose {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// 1-based juggler number
        #[arg(short, long, default_value_t = 1)]
        juggler: usize,

        /// Time in seconds; any value is reduced into the loop
        #[arg(short, long, default_value_t = 0.0)]
        time: f64,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                exit_code(ExitStatus::Usage)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            exit_code(e.status)
        }
    }
}

fn exit_code(status: ExitStatus) -> ExitCode {
    ExitCode::from(status as u8)
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Layout { input, output } => {
            let pattern = load(&input)?;
            print_json(&summary(&pattern)?);
            if let Some(output) = output {
                write_document(&pattern.to_document(), &output)
                    .map_err(|e| CliError::internal(format!("{e:#}")))?;
                info!(path = %output.display(), "wrote laid-out pattern");
            }
        }
        Command::Sample { input, path, steps } => {
            if steps == 0 {
                return Err(CliError::usage("--steps must be at least 1"));
            }
            let pattern = load(&input)?;
            print_json(&samples(&pattern, path, steps)?);
        }
        Command::Pose {
            input,
            juggler,
            time,
        } => {
            if !time.is_finite() {
                return Err(CliError::usage("--time must be a finite number"));
            }
            let pattern = load(&input)?;
            print_json(&pose(&pattern, juggler, time)?);
        }
    }
    Ok(())
}

/// Read, parse and lay out a pattern document.
fn load(path: &Path) -> Result<Pattern, CliError> {
    let root = read_document(path).map_err(|e| CliError::pattern(format!("{e:#}")))?;
    let mut pattern = Pattern::from_document(&root)?;
    debug!(
        jugglers = pattern.number_of_jugglers(),
        paths = pattern.number_of_paths(),
        events = pattern.events().len(),
        "pattern loaded"
    );
    pattern.layout()?;
    Ok(pattern)
}

fn is_json(path: &Path) -> Result<bool> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(true),
        Some("yaml" | "yml") => Ok(false),
        _ => bail!("unsupported document extension: {:?}", path),
    }
}

fn read_document(path: &Path) -> Result<JmlNode> {
    let json = is_json(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {:?}", path))?;
    let root = if json {
        JmlNode::from_json_str(&content)
    } else {
        JmlNode::from_yaml_str(&content)
    };
    root.with_context(|| format!("Failed to parse pattern document: {:?}", path))
}

fn write_document(root: &JmlNode, path: &Path) -> Result<()> {
    let text = if is_json(path)? {
        root.to_json_string()?
    } else {
        root.to_yaml_string()?
    };
    std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("error: {e}"),
    }
}

fn coord(c: Coordinate) -> Value {
    json!([c.x, c.y, c.z])
}

fn bounds(max: Option<Coordinate>, min: Option<Coordinate>) -> Value {
    json!({ "max": max.map(coord), "min": min.map(coord) })
}

fn summary(pattern: &Pattern) -> Result<Value, PatternError> {
    let paths = (1..=pattern.number_of_paths())
        .map(|p| Ok(bounds(pattern.path_max(p)?, pattern.path_min(p)?)))
        .collect::<Result<Vec<_>, PatternError>>()?;
    let jugglers = (1..=pattern.number_of_jugglers())
        .map(|j| {
            let mut hands = serde_json::Map::new();
            for hand in Hand::BOTH {
                hands.insert(
                    hand.name().to_string(),
                    bounds(pattern.hand_max(j, hand)?, pattern.hand_min(j, hand)?),
                );
            }
            Ok(json!({
                "max": coord(pattern.juggler_max(j)?),
                "min": coord(pattern.juggler_min(j)?),
                "hands": hands,
            }))
        })
        .collect::<Result<Vec<_>, PatternError>>()?;
    Ok(json!({
        "title": pattern.title(),
        "jugglers": pattern.number_of_jugglers(),
        "paths": pattern.number_of_paths(),
        "period": pattern.period()?,
        "loop_start": pattern.loop_start()?,
        "loop_end": pattern.loop_end()?,
        "bounce": pattern.is_bounce_pattern(),
        "path_bounds": paths,
        "juggler_bounds": jugglers,
    }))
}

fn samples(pattern: &Pattern, path: usize, steps: usize) -> Result<Value, PatternError> {
    let (start, end) = (pattern.loop_start()?, pattern.loop_end()?);
    let rows = (0..steps)
        .map(|k| {
            let t = start + (end - start) * k as f64 / steps as f64;
            Ok(json!({
                "t": t,
                "position": coord(pattern.path_coordinate(path, t)?),
                "in_hand": pattern.is_in_hand(path, t)?,
            }))
        })
        .collect::<Result<Vec<_>, PatternError>>()?;
    Ok(json!({ "path": path, "samples": rows }))
}

fn pose(pattern: &Pattern, juggler: usize, t: f64) -> Result<Value, PatternError> {
    let pose = pattern.juggler_pose(juggler, t)?;
    let mut arms = serde_json::Map::new();
    for hand in Hand::BOTH {
        let arm = pose.arm(hand);
        arms.insert(
            hand.name().to_string(),
            json!({
                "shoulder": coord(arm.shoulder),
                "elbow": coord(arm.elbow),
                "hand": coord(arm.hand),
            }),
        );
    }
    Ok(json!({
        "juggler": juggler,
        "t": t,
        "position": coord(pattern.juggler_position(juggler, t)?),
        "angle": pattern.juggler_angle(juggler, t)?,
        "arms": arms,
        "waist": [coord(pose.left_waist), coord(pose.right_waist)],
        "head": {
            "bottom": pose.head_bottom.map(coord),
            "top": pose.head_top.map(coord),
        },
    }))
}
