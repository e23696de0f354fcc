mod config;
mod filament;
mod lexer;
mod parser;
mod process;
mod tracker;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::{ExtrusionMode, SpoolConfig, SpoolParams};
use filament::FilamentLibrary;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Input G-code file
    #[clap(required = true)]
    input: PathBuf,

    /// Output G-code file
    #[clap(short, long, value_parser, required = true)]
    output: PathBuf,

    /// Spool weight in grams; read from the G-code header when omitted
    #[clap(long, allow_hyphen_values = true)]
    spool_weight: Option<f64>,

    /// Filament diameter in mm (default: 1.75, or the material's)
    #[clap(long)]
    filament_diameter: Option<f64>,

    /// Filament density in g/cm^3 (default: 1.25, or the material's)
    #[clap(long)]
    filament_density: Option<f64>,

    /// Named filament material supplying density/diameter defaults (pla, petg, abs, ...)
    #[clap(long)]
    material: Option<String>,

    /// JSON filament library layered over the built-in materials
    #[clap(long)]
    filament_library: Option<PathBuf>,

    /// Extrusion mode: relative or absolute
    #[clap(long, default_value = "relative")]
    extrusion_mode: String,

    /// Command spliced into the output at the spool-change point
    #[clap(long, default_value = "M600")]
    pause_command: String,

    /// Fraction of the spool held in reserve when triggering
    #[clap(long, default_value_t = config::DEFAULT_SAFETY_MARGIN)]
    safety_margin: f64,

    /// Extrusion moves faster than this feedrate (mm/min) are not counted
    #[clap(long, default_value_t = config::DEFAULT_FEEDRATE_THRESHOLD)]
    feedrate_threshold: f64,

    /// Correction factor applied to the computed mass per mm
    #[clap(long, default_value_t = 1.0)]
    scale: f64,

    /// Defer the pause command to the next layer change marker
    #[clap(long)]
    layer_based: bool,

    /// Verbose
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = resolve_config(&args)?;
    debug!(
        mass_per_mm = config.mass_per_mm(),
        trigger_mass = config.trigger_mass(),
        "configuration resolved"
    );

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open file: {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("Failed to create file: {}", args.output.display()))?;
    let mut writer = BufWriter::new(output);

    let summary = process::process(BufReader::new(input), &mut writer, &config)?;

    match summary.injected_at {
        Some(line) => info!(
            "inserted {} at output line {} of {}",
            config.pause_command, line, args.output.display()
        ),
        None => info!("spool budget never crossed; output is an untouched copy"),
    }
    info!(
        "{:.2}g of filament over {:.1}mm, {} lines processed",
        summary.consumed_g, summary.extruded_mm, summary.lines_in
    );

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "spoolswap=debug" } else { "spoolswap=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

/// Turn CLI arguments into a validated run configuration.
///
/// Precedence for filament geometry: explicit flag, then the named material,
/// then the standard 1.75mm / 1.25 g/cm^3 defaults. The spool weight falls
/// back to a header-comment scan of the input file.
fn resolve_config(args: &Args) -> Result<SpoolConfig> {
    let mut library = FilamentLibrary::builtin();
    if let Some(path) = &args.filament_library {
        let user = FilamentLibrary::from_file(path)
            .with_context(|| format!("Failed to load filament library: {}", path.display()))?;
        library.extend(user);
    }

    let material = match &args.material {
        Some(name) => Some(
            library
                .get(name)
                .ok_or_else(|| anyhow!("unknown filament material: {name}"))?,
        ),
        None => None,
    };

    let diameter = args
        .filament_diameter
        .or(material.map(|m| m.diameter))
        .unwrap_or(config::DEFAULT_DIAMETER);
    let density = args
        .filament_density
        .or(material.map(|m| m.density))
        .unwrap_or(config::DEFAULT_DENSITY);

    let spool_mass = match args.spool_weight {
        Some(weight) => weight,
        None => {
            let header = File::open(&args.input)
                .with_context(|| format!("Failed to open file: {}", args.input.display()))?;
            parser::scan_spool_weight(BufReader::new(header))?.ok_or_else(|| {
                anyhow!("spool weight not given and not found in the G-code header; pass --spool-weight")
            })?
        }
    };

    let mode: ExtrusionMode = args.extrusion_mode.parse()?;

    Ok(SpoolConfig::resolve(SpoolParams {
        spool_mass,
        diameter,
        density,
        mode,
        scale: args.scale,
        safety_margin: args.safety_margin,
        feedrate_threshold: args.feedrate_threshold,
        pause_command: args.pause_command.clone(),
        layer_based: args.layer_based,
    })?)
}
