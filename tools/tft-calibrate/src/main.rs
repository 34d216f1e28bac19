//! TFT Calibration Tool
//!
//! Host-side companion for resistive touchscreen calibration. Computes the
//! integer affine matrix from measured samples, stores it in the 40-byte
//! calibration file format, and checks stored matrices against samples.
//!
//! # Usage
//!
//! ```bash
//! # Write a sample template for a panel, then fill in measured raw values
//! tft-calibrate init --panel xpt2046 -o samples.toml
//!
//! # Three-point calibration
//! tft-calibrate compute samples.toml -o panel.cal
//!
//! # Least-squares calibration over five or more samples
//! tft-calibrate compute samples.toml --fit -o panel.cal
//!
//! # Work with a stored matrix
//! tft-calibrate show panel.cal --hex
//! tft-calibrate map panel.cal 2048 2048
//! tft-calibrate verify panel.cal samples.toml --tolerance 2
//! ```

mod report;
mod samples;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use samples::{matrix_to_toml, SampleFile};
use tft_calibration::{compute_matrix, fit_matrix, get_profile, profile_names, storage, Point};

/// TFT Calibration Tool
///
/// Compute and check touchscreen calibration matrices
#[derive(Parser)]
#[command(name = "tft-calibrate")]
#[command(author = "Prasanna Gautam")]
#[command(version = "0.1.0")]
#[command(about = "Affine touchscreen calibration matrices for resistive TFT panels")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a calibration matrix from a sample file
    Compute {
        /// Sample file (TOML)
        samples: PathBuf,

        /// Write the calibration file here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Least-squares fit over three or more samples
        #[arg(long)]
        fit: bool,

        /// Print the matrix as TOML
        #[arg(long)]
        toml: bool,
    },

    /// Show a stored calibration matrix
    Show {
        /// Calibration file
        path: PathBuf,

        /// Dump the raw file bytes
        #[arg(long)]
        hex: bool,
    },

    /// Map one raw point through a stored matrix
    Map {
        /// Calibration file
        path: PathBuf,

        /// Raw X reading
        #[arg(allow_hyphen_values = true)]
        x: i32,

        /// Raw Y reading
        #[arg(allow_hyphen_values = true)]
        y: i32,
    },

    /// Check a stored matrix against a sample file
    Verify {
        /// Calibration file
        path: PathBuf,

        /// Sample file (TOML)
        samples: PathBuf,

        /// Largest acceptable error in pixels
        #[arg(short, long, default_value_t = 2)]
        tolerance: u32,
    },

    /// Panel profile operations
    #[command(subcommand)]
    Panels(PanelCommands),

    /// Generate a sample file template
    Init {
        /// Panel profile
        #[arg(short, long, default_value = "xpt2046")]
        panel: String,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PanelCommands {
    /// List built-in panel profiles
    List,

    /// Show a panel profile and its nominal matrix
    Show {
        /// Panel profile name (e.g., xpt2046, stmpe610)
        panel: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Compute { samples, output, fit, toml } => handle_compute(samples, output, fit, toml),
        Commands::Show { path, hex } => handle_show(path, hex),
        Commands::Map { path, x, y } => handle_map(path, x, y),
        Commands::Verify { path, samples, tolerance } => handle_verify(path, samples, tolerance),
        Commands::Panels(cmd) => handle_panels(cmd),
        Commands::Init { panel, output } => handle_init(panel, output),
    }
}

fn handle_compute(path: PathBuf, output: Option<PathBuf>, fit: bool, as_toml: bool) -> Result<()> {
    let file = SampleFile::load(&path)?;

    println!(
        "{} Computing {} calibration from {} samples in {}",
        "[*]".cyan().bold(),
        if fit { "least-squares" } else { "three-point" },
        file.samples.len(),
        path.display()
    );

    let matrix = if fit {
        fit_matrix(&file.samples)
    } else {
        compute_matrix(&file.samples)
    }
    .with_context(|| format!("Calibration failed for {}", path.display()))?;

    if as_toml {
        println!("{}", matrix_to_toml(&matrix)?);
    } else {
        report::print_matrix(&matrix);
    }
    report::print_residuals(&matrix, &file.samples);

    if let Some(out) = output {
        storage::save(&out, &matrix)
            .with_context(|| format!("Failed to write calibration file: {}", out.display()))?;
        println!(
            "{} Calibration written to {}",
            "[OK]".green().bold(),
            out.display()
        );
    }

    Ok(())
}

fn handle_show(path: PathBuf, hex: bool) -> Result<()> {
    let bytes = std::fs::read(&path)
        .with_context(|| format!("Failed to read calibration file: {}", path.display()))?;

    if hex {
        hexdump::hexdump(&bytes);
        println!();
    }

    let matrix = storage::decode(&bytes)
        .with_context(|| format!("Invalid calibration file: {}", path.display()))?;

    println!("{}: {}", "File".white().bold(), path.display());
    report::print_matrix(&matrix);
    Ok(())
}

fn handle_map(path: PathBuf, x: i32, y: i32) -> Result<()> {
    let matrix = storage::load(&path)
        .with_context(|| format!("Failed to load calibration file: {}", path.display()))?;

    let raw = Point::new(x, y);
    let mapped = matrix.transform(raw);
    log::debug!("Mapped {} -> {} with {}", raw, mapped, matrix);

    println!("{} -> {}", raw, mapped.to_string().white().bold());
    Ok(())
}

fn handle_verify(path: PathBuf, samples: PathBuf, tolerance: u32) -> Result<()> {
    let matrix = storage::load(&path)
        .with_context(|| format!("Failed to load calibration file: {}", path.display()))?;
    let file = SampleFile::load(&samples)?;

    println!(
        "{} Verifying {} against {} samples\n",
        "[*]".cyan().bold(),
        path.display(),
        file.samples.len()
    );

    let worst = report::print_residuals(&matrix, &file.samples);

    if worst <= tolerance {
        println!(
            "\n{} Worst error {} px is within tolerance ({} px)",
            "[OK]".green().bold(),
            worst,
            tolerance
        );
        Ok(())
    } else {
        eprintln!(
            "\n{} Worst error {} px exceeds tolerance ({} px), recalibrate the panel",
            "[ERROR]".red().bold(),
            worst,
            tolerance
        );
        std::process::exit(1);
    }
}

fn handle_panels(cmd: PanelCommands) -> Result<()> {
    match cmd {
        PanelCommands::List => {
            println!("{}", "=".repeat(60));
            println!("{}", "Supported Panel Profiles".cyan().bold());
            println!("{}", "=".repeat(60));

            for name in profile_names() {
                if let Some(profile) = get_profile(name) {
                    println!("\n  {}: {}", name.white().bold(), profile.description);
                    println!("    Display: {}x{}", profile.width, profile.height);
                }
            }

            println!("\n{}", "=".repeat(60));
            println!(
                "Use {} to see the nominal matrix",
                "tft-calibrate panels show <panel>".cyan()
            );
        }

        PanelCommands::Show { panel } => {
            let profile = get_profile(&panel).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown panel profile: {}. Use 'tft-calibrate panels list' to see available profiles.",
                    panel
                )
            })?;

            report::print_profile(profile)?;
        }
    }

    Ok(())
}

fn handle_init(panel: String, output: Option<PathBuf>) -> Result<()> {
    let profile = get_profile(&panel)
        .ok_or_else(|| anyhow::anyhow!("Unknown panel profile: {}", panel))?;

    let template = SampleFile::template(profile).to_toml()?;

    if let Some(path) = output {
        std::fs::write(&path, &template)
            .with_context(|| format!("Failed to write sample template: {}", path.display()))?;
        println!(
            "{} Sample template for {} written to {}",
            "[OK]".green().bold(),
            profile.name,
            path.display()
        );
    } else {
        println!("{}", template);
    }

    Ok(())
}
