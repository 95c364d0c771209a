use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ps_core::{Clock, ClockRef, ManualClock, PointValue, SystemClock};
use ps_equipment::Equipment;
use ps_project::{Plant, ProjectResult, build_plant, load_yaml};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ps-cli")]
#[command(about = "plantsim CLI - HVAC equipment transient simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// List equipment in a project
    List {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Refresh every equipment at a fixed interval and print its readings
    Poll {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Time between samples in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Number of samples to take
        #[arg(long, default_value_t = 10)]
        samples: usize,
        /// Equipment to start before the first sample
        #[arg(long = "start", value_name = "NAME")]
        start: Vec<String>,
        /// Emit one JSON object per sample
        #[arg(long)]
        json: bool,
        /// Advance a simulated clock instead of waiting in real time
        #[arg(long)]
        fast: bool,
    },
}

fn main() -> ProjectResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::List { project_path } => cmd_list(&project_path),
        Commands::Poll {
            project_path,
            interval_ms,
            samples,
            start,
            json,
            fast,
        } => cmd_poll(
            &project_path,
            PollOptions {
                interval: Duration::from_millis(interval_ms),
                samples,
                start,
                json,
                fast,
            },
        ),
    }
}

fn cmd_validate(project_path: &Path) -> ProjectResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = load_yaml(project_path)?;
    println!(
        "✓ Project '{}' is valid ({} equipment)",
        project.name,
        project.equipment.len()
    );
    Ok(())
}

fn cmd_list(project_path: &Path) -> ProjectResult<()> {
    let project = load_yaml(project_path)?;

    if project.equipment.is_empty() {
        println!("No equipment found in project");
        return Ok(());
    }

    println!("Equipment in project:");
    for def in &project.equipment {
        let description = if def.description.is_empty() {
            String::new()
        } else {
            format!(" - {}", def.description)
        };
        println!("  {} ({}){}", def.id, def.kind.type_name(), description);
        for (reading, point) in &def.outputs {
            println!("      {} -> {}", reading, point);
        }
    }
    Ok(())
}

struct PollOptions {
    interval: Duration,
    samples: usize,
    start: Vec<String>,
    json: bool,
    fast: bool,
}

#[derive(Serialize)]
struct Sample<'a> {
    t: f64,
    equipment: BTreeMap<&'a str, BTreeMap<String, PointValue>>,
    points: BTreeMap<&'a str, PointValue>,
}

fn cmd_poll(project_path: &Path, options: PollOptions) -> ProjectResult<()> {
    let project = load_yaml(project_path)?;

    let manual = ManualClock::new(0.0);
    let clock: ClockRef = if options.fast {
        manual.handle()
    } else {
        SystemClock::shared()
    };
    let t_origin = clock.now();

    let mut plant = build_plant(&project, &clock)?;
    for name in &options.start {
        plant.registry.require_mut(name)?.start()?;
        info!(equipment = %name, "start requested");
    }

    for i in 0..options.samples {
        if i > 0 {
            if options.fast {
                manual.advance(options.interval.as_secs_f64());
            } else {
                std::thread::sleep(options.interval);
            }
        }
        plant.publish()?;
        let t = clock.now() - t_origin;
        if options.json {
            print_json(&plant, t)?;
        } else {
            print_table(&plant, t)?;
        }
    }
    Ok(())
}

fn collect(plant: &Plant) -> ProjectResult<BTreeMap<&str, BTreeMap<String, PointValue>>> {
    let mut equipment = BTreeMap::new();
    for e in plant.registry.iter() {
        let mut readings = BTreeMap::new();
        for key in e.reading_names() {
            let value = e.value(&key)?;
            readings.insert(key, value);
        }
        equipment.insert(e.name(), readings);
    }
    Ok(equipment)
}

fn print_json(plant: &Plant, t: f64) -> ProjectResult<()> {
    println!("{}", sample_json(plant, t)?);
    Ok(())
}

fn sample_json(plant: &Plant, t: f64) -> ProjectResult<String> {
    use ps_core::PointSource;

    let sample = Sample {
        t,
        equipment: collect(plant)?,
        points: plant
            .outputs
            .iter()
            .map(|b| (b.point.name(), b.point.current_value()))
            .collect(),
    };
    Ok(serde_json::to_string(&sample)?)
}

fn print_table(plant: &Plant, t: f64) -> ProjectResult<()> {
    println!("t = {:.1} s", t);
    for (name, readings) in collect(plant)? {
        let line: Vec<String> = readings
            .iter()
            .map(|(key, value)| match value {
                PointValue::Analog(v) => format!("{key}={v:.2}"),
                PointValue::Binary(b) => format!("{key}={b}"),
            })
            .collect();
        println!("  {:<16} {}", name, line.join("  "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = "
version: 1
name: sample
equipment:
  - id: SF-1
    kind:
      type: Fan
      start_command: true
    outputs:
      flow: SF-1-FLOW
";

    #[test]
    fn json_sample_lists_readings_and_points() {
        let project = ps_project::from_yaml_str(PROJECT).unwrap();
        let clock = ManualClock::new(0.0);
        let mut plant = build_plant(&project, &clock.handle()).unwrap();
        plant.publish().unwrap();

        let line = sample_json(&plant, 0.0).unwrap();
        let sample: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(sample["t"], 0.0);
        assert!(sample["equipment"]["SF-1"].get("flow").is_some());
        assert!(sample["equipment"]["SF-1"].get("status").is_some());
        assert!(sample["points"].get("SF-1-FLOW").is_some());
    }
}
