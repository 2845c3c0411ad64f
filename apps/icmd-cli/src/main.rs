mod config;
mod error;
mod logging;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use icmd_extract::{Catalog, CsvTable, PhaseTemperatureExtractor};
use icmd_plot::scheil::VOLUME_FRACTION_TITLE;
use icmd_plot::{
    Chart, PhasePlotOptions, phase_fraction_plot, phase_fraction_title, property_plot,
    scheil_plot,
};
use tracing::{debug, info};

use crate::config::{FileConfig, Overrides, Settings};
use crate::error::{CliError, CliResult};

#[derive(Parser, Debug)]
#[command(name = "icmd")]
#[command(version, about = "ICMD results CLI - Phase fractions, Scheil tables, studies and plots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// YAML file with default units, threshold and plot size
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List models with their kind and size
    Models {
        /// Path to the ICMD results JSON file
        results: PathBuf,
    },
    /// List the elements of the system
    Elements {
        /// Path to the ICMD results JSON file
        results: PathBuf,
    },
    /// List the flattened parameters of a model
    Params {
        /// Path to the ICMD results JSON file
        results: PathBuf,
        /// Model name
        model: String,
    },
    /// Export phase fractions against temperature
    Phases(TableArgs),
    /// Export the Scheil table (fraction solid and phase regions)
    Scheil(TableArgs),
    /// Export a scalar property of an equilibrium model
    Property {
        #[command(flatten)]
        table: TableArgs,
        /// Property to extract
        #[arg(value_enum)]
        property: PropertyKind,
    },
    /// Export volume fractions against temperature
    Volume(TableArgs),
    /// Export the temperature of each tool-reported solidification region
    Regions(TableArgs),
    /// Export element amounts inside phases
    Composition {
        #[command(flatten)]
        table: TableArgs,
        /// Phase to include (repeatable; all phases when omitted)
        #[arg(long = "phase", value_name = "NAME")]
        phases: Vec<String>,
    },
    /// Export the input composition of every sample of a parameter study
    Components {
        #[command(flatten)]
        table: TableArgs,
        /// Component to leave out, usually the balance element
        #[arg(long, value_name = "NAME")]
        exclude: Option<String>,
    },
    /// Export a parameter study, or the sample nearest to a composition
    Study {
        #[command(flatten)]
        table: TableArgs,
        /// Requested amount of a component (repeatable)
        #[arg(long = "at", value_name = "NAME=VALUE")]
        at: Vec<String>,
        /// Component that makes up the rest to 100
        #[arg(long, value_name = "NAME")]
        balance: Option<String>,
    },
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Path to the ICMD results JSON file
    results: PathBuf,
    /// Model name
    model: String,
    /// Output CSV file path (optional, defaults to stdout)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Also write a chart (.html or .json)
    #[arg(long, value_name = "PATH")]
    plot: Option<PathBuf>,
    /// Chart title
    #[arg(long, default_value = "")]
    title: String,
    /// Temperature unit (C or K)
    #[arg(long, value_name = "UNIT")]
    temp_unit: Option<String>,
    /// Pressure unit (Pa, atm or bar)
    #[arg(long, value_name = "UNIT")]
    pressure_unit: Option<String>,
    /// Fraction basis for dataset results (mole or mass)
    #[arg(long, value_name = "BASIS")]
    basis: Option<String>,
    /// Minimum fraction for a phase to count towards a phase region
    #[arg(long, value_name = "FLOAT")]
    threshold: Option<f64>,
    /// Use a linear y axis for phase fraction charts
    #[arg(long)]
    linear_y: bool,
}

impl TableArgs {
    fn settings(&self, file: &FileConfig) -> CliResult<Settings> {
        Settings::resolve(file, &self.overrides())
    }

    fn open(&self, settings: &Settings) -> CliResult<Catalog> {
        Ok(Catalog::open_with(&self.results, &settings.load_options())?)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            temperature_unit: self.temp_unit.clone(),
            pressure_unit: self.pressure_unit.clone(),
            basis: self.basis.clone(),
            threshold: self.threshold,
            linear_y: self.linear_y,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PropertyKind {
    Density,
    Enthalpy,
    Pressure,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    debug!("parsed arguments: {:?}", cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        Commands::Models { results } => cmd_models(&results),
        Commands::Elements { results } => cmd_elements(&results),
        Commands::Params { results, model } => cmd_params(&results, &model),
        Commands::Phases(args) => cmd_phases(&args, &args.settings(&file_config)?),
        Commands::Scheil(args) => cmd_scheil(&args, &args.settings(&file_config)?),
        Commands::Property { table, property } => {
            let settings = table.settings(&file_config)?;
            cmd_property(&table, property, &settings)
        }
        Commands::Volume(args) => cmd_volume(&args, &args.settings(&file_config)?),
        Commands::Regions(args) => cmd_regions(&args, &args.settings(&file_config)?),
        Commands::Composition { table, phases } => {
            let settings = table.settings(&file_config)?;
            cmd_composition(&table, &phases, &settings)
        }
        Commands::Components { table, exclude } => {
            let settings = table.settings(&file_config)?;
            cmd_components(&table, exclude.as_deref(), &settings)
        }
        Commands::Study { table, at, balance } => {
            let settings = table.settings(&file_config)?;
            cmd_study(&table, &at, balance.as_deref(), &settings)
        }
    }
}

fn cmd_models(results: &Path) -> CliResult<()> {
    let catalog = Catalog::open(results)?;
    let summaries = catalog.summaries();

    if summaries.is_empty() {
        println!("No models found in {}", results.display());
    } else {
        println!("Models:");
        for model in summaries {
            println!(
                "  {} - {} ({} steps, {} parameters)",
                model.name, model.kind, model.step_count, model.parameter_count
            );
        }
    }
    Ok(())
}

fn cmd_elements(results: &Path) -> CliResult<()> {
    let catalog = Catalog::open(results)?;
    for element in catalog.list_elements() {
        println!("{}", element);
    }
    Ok(())
}

fn cmd_params(results: &Path, model: &str) -> CliResult<()> {
    let catalog = Catalog::open(results)?;
    let view = catalog.get_model(model)?;

    println!("Parameters of '{}':", view.name());
    for name in view.parameter_names() {
        let param = view.parameter(name)?;
        println!("  {} ({} values)", name, param.len());
    }
    Ok(())
}

fn cmd_phases(args: &TableArgs, settings: &Settings) -> CliResult<()> {
    let catalog = args.open(settings)?;
    let table = catalog
        .solidification(&args.model)?
        .phases()
        .phase_fraction_table(settings.temperature_unit)?;

    write_table(&table, args.output.as_deref())?;

    if let Some(path) = &args.plot {
        let options = phase_plot_options(&args.title, settings);
        write_chart(phase_fraction_plot(&table, &options), path, settings)?;
    }
    Ok(())
}

fn cmd_scheil(args: &TableArgs, settings: &Settings) -> CliResult<()> {
    let catalog = args.open(settings)?;
    let table = catalog
        .solidification(&args.model)?
        .scheil_table(settings.temperature_unit, settings.scheil)?;

    write_table(&table, args.output.as_deref())?;

    if let Some(path) = &args.plot {
        write_chart(scheil_plot(&table, &args.title), path, settings)?;
    }
    Ok(())
}

fn cmd_property(args: &TableArgs, property: PropertyKind, settings: &Settings) -> CliResult<()> {
    let catalog = args.open(settings)?;
    let equilibrium = catalog.equilibrium(&args.model)?;
    let series = match property {
        PropertyKind::Density => equilibrium.system_density()?,
        PropertyKind::Enthalpy => equilibrium.enthalpy()?,
        PropertyKind::Pressure => equilibrium.pressure(settings.pressure_unit)?,
    };

    write_table(&series, args.output.as_deref())?;

    if let Some(path) = &args.plot {
        write_chart(property_plot(&series, &args.title), path, settings)?;
    }
    Ok(())
}

fn cmd_volume(args: &TableArgs, settings: &Settings) -> CliResult<()> {
    let catalog = args.open(settings)?;
    let table = PhaseTemperatureExtractor::volume_fractions(catalog.get_model(&args.model)?)?
        .phase_fraction_table(settings.temperature_unit)?;

    write_table(&table, args.output.as_deref())?;

    if let Some(path) = &args.plot {
        let options = PhasePlotOptions {
            y_title: VOLUME_FRACTION_TITLE.to_string(),
            ..phase_plot_options(&args.title, settings)
        };
        write_chart(phase_fraction_plot(&table, &options), path, settings)?;
    }
    Ok(())
}

fn cmd_regions(args: &TableArgs, settings: &Settings) -> CliResult<()> {
    no_chart(args, "regions")?;
    let catalog = args.open(settings)?;
    let table = catalog
        .solidification(&args.model)?
        .temperature_by_phase_region(settings.temperature_unit)?;
    write_table(&table, args.output.as_deref())
}

fn cmd_composition(args: &TableArgs, phases: &[String], settings: &Settings) -> CliResult<()> {
    no_chart(args, "composition")?;
    let catalog = args.open(settings)?;
    let phases: Vec<&str> = phases.iter().map(String::as_str).collect();
    let selection = (!phases.is_empty()).then_some(phases.as_slice());
    let table = catalog.composition(&args.model)?.composition(selection)?;
    write_table(&table, args.output.as_deref())
}

fn cmd_components(args: &TableArgs, exclude: Option<&str>, settings: &Settings) -> CliResult<()> {
    no_chart(args, "components")?;
    let catalog = args.open(settings)?;
    let table = catalog.composition(&args.model)?.components(exclude)?;
    write_table(&table, args.output.as_deref())
}

fn cmd_study(
    args: &TableArgs,
    at: &[String],
    balance: Option<&str>,
    settings: &Settings,
) -> CliResult<()> {
    let catalog = args.open(settings)?;
    let study = catalog
        .parameter_study(&args.model)?
        .table(settings.temperature_unit)?;

    if at.is_empty() {
        no_chart(args, "study without --at")?;
        return write_table(&study, args.output.as_deref());
    }

    let target = at
        .iter()
        .map(|s| parse_assignment(s))
        .collect::<CliResult<Vec<_>>>()?;
    let target: Vec<(&str, f64)> = target.iter().map(|(n, v)| (n.as_str(), *v)).collect();
    let slice = study.slice(&target, balance)?;
    info!(sample = slice.sample, "selected study sample");

    write_table(&slice.table, args.output.as_deref())?;

    if let Some(path) = &args.plot {
        let title = if args.title.is_empty() {
            format!("Composition: {}", slice.label())
        } else {
            args.title.clone()
        };
        let options = phase_plot_options(&title, settings);
        write_chart(phase_fraction_plot(&slice.table, &options), path, settings)?;
    }
    Ok(())
}

fn phase_plot_options(title: &str, settings: &Settings) -> PhasePlotOptions {
    PhasePlotOptions {
        title: title.to_string(),
        y_title: phase_fraction_title(settings.basis).to_string(),
        log_y: settings.log_y,
        ..PhasePlotOptions::default()
    }
}

fn no_chart(args: &TableArgs, command: &str) -> CliResult<()> {
    match &args.plot {
        Some(_) => Err(CliError::Argument(format!("{command} has no chart; drop --plot"))),
        None => Ok(()),
    }
}

/// `Mg=5` -> `("Mg", 5.0)`
fn parse_assignment(text: &str) -> CliResult<(String, f64)> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| CliError::Argument(format!("expected NAME=VALUE, got '{text}'")))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| CliError::Argument(format!("'{value}' is not a number in '{text}'")))?;
    let name = name.trim();
    if name.is_empty() || !value.is_finite() {
        return Err(CliError::Argument(format!("expected NAME=VALUE, got '{text}'")));
    }
    Ok((name.to_string(), value))
}

/// Writes the CSV, then reports dropped steps outside the log stream so
/// `--quiet` cannot hide them: on stdout after a file export, on stderr
/// when stdout carries the CSV.
fn write_table<T: CsvTable>(table: &T, output: Option<&Path>) -> CliResult<()> {
    let dropped = table.dropped();
    let summary = (!dropped.is_empty()).then(|| {
        let steps: Vec<String> = dropped.iter().map(ToString::to_string).collect();
        format!("Dropped {} steps: {}", dropped.len(), steps.join(", "))
    });

    match output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            table.write_csv(BufWriter::new(file))?;
            let rows = table.records().len();
            info!(path = %path.display(), rows, "wrote csv");
            println!("✓ Exported {} rows to {}", rows, path.display());
            if let Some(summary) = &summary {
                println!("! {summary}");
            }
        }
        None => {
            table.write_csv(io::stdout().lock())?;
            if let Some(summary) = &summary {
                eprintln!("Note: {summary}");
            }
        }
    }
    Ok(())
}

fn write_chart(mut chart: Chart, path: &Path, settings: &Settings) -> CliResult<()> {
    if let Some((width, height)) = settings.plot_size {
        chart = chart.with_size(width, height);
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("html") => chart.write_html(path)?,
        Some(ext) if ext.eq_ignore_ascii_case("json") => chart.write_json(path)?,
        _ => {
            return Err(CliError::Argument(format!(
                "plot path must end in .html or .json: {}",
                path.display()
            )));
        }
    }
    info!(path = %path.display(), "wrote chart");
    Ok(())
}
