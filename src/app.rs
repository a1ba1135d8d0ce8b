//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments and initializes logging
//! - resolves dataset paths (flags, then `.env`/environment, then defaults)
//! - runs the calculation pipeline
//! - prints the summary and writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CalcArgs, Cli, Command, IpcaArgs, TcpArgs};
use crate::data::IpcaClient;
use crate::domain::CalcConfig;
use crate::error::{AppError, EngineError};

pub mod pipeline;

pub const SECTORS_ENV: &str = "PROMOCAO_SECTORS";
pub const STATES_ENV: &str = "PROMOCAO_STATES";
pub const IPCA_FALLBACK_ENV: &str = "PROMOCAO_IPCA_FALLBACK";

const DEFAULT_SECTORS: &str = "data/setores.geojson";
const DEFAULT_STATES: &str = "data/uf_code.json";
const DEFAULT_IPCA_FALLBACK: &str = "data/ipca.json";

/// Entry point for the `promocao` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Calc(args) => handle_calc(&args),
        Command::Classes => {
            println!("{}", crate::report::format_class_table());
            Ok(())
        }
        Command::Tcp(args) => handle_tcp(&args),
        Command::Ipca(args) => handle_ipca(&args),
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_calc(args: &CalcArgs) -> Result<(), AppError> {
    let config = calc_config_from_args(args, |key| std::env::var(key).ok());
    tracing::debug!(?config, "resolved configuration");

    let run = pipeline::run_calculation(&config).map_err(calc_error)?;
    println!("{}", crate::report::format_summary(&run.report));

    // Optional exports.
    if let Some(path) = &config.output {
        crate::io::write_report_json(path, &run.report)?;
        tracing::info!(path = %path.display(), "wrote result record");
    }
    if let Some(path) = &config.export_covered {
        crate::io::write_covered_csv(path, &run.report.covered)?;
        tracing::info!(path = %path.display(), "wrote covered municipalities");
    }

    // The map is a temporary artifact for the renderer.
    if let Some(map) = &run.map_path {
        if config.keep_map {
            println!("Mapa mantido em {}", map.display());
        } else if let Err(e) = std::fs::remove_file(map) {
            tracing::warn!(path = %map.display(), error = %e, "could not delete temporary map");
        }
    }

    Ok(())
}

/// `AppError` for a failed calculation; a missing index series points at the
/// two ways out.
fn calc_error(err: EngineError) -> AppError {
    if !matches!(err, EngineError::IndexCorrection(_)) {
        return err.into();
    }
    AppError::new(
        err.exit_code(),
        format!(
            "{err}\nhint: run `promocao ipca --save` once to store the series locally, \
             or pass --no-index to skip the correction"
        ),
    )
}

fn handle_tcp(args: &TcpArgs) -> Result<(), AppError> {
    let current = args.current.trim().to_uppercase();
    let proposed = args.proposed.trim().to_uppercase();
    // Unknown codes are an error here, unlike inside the comparison helpers.
    crate::tables::class_group(&current)?;
    crate::tables::class_group(&proposed)?;

    println!("{}", crate::report::format_class_change(&current, &proposed));
    Ok(())
}

fn handle_ipca(args: &IpcaArgs) -> Result<(), AppError> {
    let fallback = resolve_path(
        args.ipca_fallback.as_deref(),
        IPCA_FALLBACK_ENV,
        DEFAULT_IPCA_FALLBACK,
        |key| std::env::var(key).ok(),
    );
    let client = IpcaClient::new(&fallback, args.offline);

    if args.save {
        if args.offline {
            return Err(AppError::new(2, "--save needs the remote source; drop --offline"));
        }
        let observations = client.fetch_observations()?;
        crate::data::ipca::write_bundled(&fallback, &observations)?;
        println!("{} observações salvas em {}", observations.len(), fallback.display());
    }

    let correction = client.correct(args.value)?;
    println!("Fator IPCA acumulado: {:.6}", correction.factor);
    println!("Data do índice: {}", correction.index_date.format("%d/%m/%Y"));
    println!("Fonte: {:?}", correction.source);
    println!("Valor corrigido: R$ {:.2}", correction.value);
    Ok(())
}

/// Build the run configuration. `env` looks up environment variables
/// (`.env` has already been loaded into the process environment).
pub fn calc_config_from_args(args: &CalcArgs, env: impl Fn(&str) -> Option<String>) -> CalcConfig {
    CalcConfig {
        input: args.input.clone(),
        sectors_path: resolve_path(args.sectors.as_deref(), SECTORS_ENV, DEFAULT_SECTORS, &env),
        states_path: resolve_path(args.states.as_deref(), STATES_ENV, DEFAULT_STATES, &env),
        ipca_fallback_path: resolve_path(
            args.ipca_fallback.as_deref(),
            IPCA_FALLBACK_ENV,
            DEFAULT_IPCA_FALLBACK,
            &env,
        ),
        offline: args.offline,
        skip_index: args.no_index,
        output: args.output.clone(),
        export_covered: args.export_covered.clone(),
        keep_map: args.keep_map,
    }
}

fn resolve_path(flag: Option<&Path>, key: &str, default: &str, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}
