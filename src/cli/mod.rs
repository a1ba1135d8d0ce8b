//! Command-line parsing for the class-promotion calculator.
//!
//! Argument parsing and command dispatch stay separate from the engine: this
//! module only describes the commands; `app` resolves configuration and runs
//! them.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "promocao", version, about = "Broadcast class-promotion valuation")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full calculation for an input form and print the summary.
    Calc(CalcArgs),
    /// Print the class order, groups and contour radii.
    Classes,
    /// Compare two classes: time-to-promotion, change kind and payment.
    Tcp(TcpArgs),
    /// Fetch the IPCA series and print the accumulated factor.
    Ipca(IpcaArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CalcArgs {
    /// Input form (JSON with the process and station fields).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Census-sector GeoJSON. Defaults to `PROMOCAO_SECTORS` or `data/setores.geojson`.
    #[arg(long)]
    pub sectors: Option<PathBuf>,

    /// State-name JSON. Defaults to `PROMOCAO_STATES` or `data/uf_code.json`.
    #[arg(long)]
    pub states: Option<PathBuf>,

    /// Bundled IPCA series used when the remote source fails.
    /// Defaults to `PROMOCAO_IPCA_FALLBACK` or `data/ipca.json`; create it with
    /// `promocao ipca --save`.
    #[arg(long = "ipca-fallback")]
    pub ipca_fallback: Option<PathBuf>,

    /// Skip the remote IPCA source and use the bundled series.
    #[arg(long)]
    pub offline: bool,

    /// Do not apply the IPCA correction.
    #[arg(long = "no-index")]
    pub no_index: bool,

    /// Write the result record as JSON.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export the covered municipalities as CSV.
    #[arg(long = "export-covered")]
    pub export_covered: Option<PathBuf>,

    /// Keep the temporary coverage map instead of deleting it after the run.
    #[arg(long = "keep-map")]
    pub keep_map: bool,
}

#[derive(Debug, Args, Clone)]
pub struct TcpArgs {
    /// Current class (e.g. B2).
    pub current: String,
    /// Proposed class (e.g. A1).
    pub proposed: String,
}

#[derive(Debug, Args, Clone)]
pub struct IpcaArgs {
    /// Value to correct.
    #[arg(long, default_value_t = 1.0)]
    pub value: f64,

    /// Bundled series path. Defaults to `PROMOCAO_IPCA_FALLBACK` or `data/ipca.json`.
    #[arg(long = "ipca-fallback")]
    pub ipca_fallback: Option<PathBuf>,

    /// Use the bundled series only.
    #[arg(long)]
    pub offline: bool,

    /// Save the fetched remote series as the bundled fallback.
    #[arg(long)]
    pub save: bool,
}
