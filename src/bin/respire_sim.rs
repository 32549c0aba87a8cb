//! Respire simulation CLI
//!
//! Reads a simulation request (JSON) from a file or stdin, runs it through
//! the simulation service and prints the result.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use respire::transport::encode_json;
use respire::{
    error_response, BaselineState, CatalogVariant, InMemoryBaselineProvider, Pollutants,
    RespireConfig, RespireError, RespireResult, StationReading,
};

/// Command-line options layered over the environment config.
struct Args {
    catalog: Option<CatalogVariant>,
    seed: Option<u64>,
    pretty: bool,
    readings: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn usage() {
    println!("respire-sim - Air-quality intervention impact simulator");
    println!();
    println!("USAGE:");
    println!("    respire-sim [OPTIONS] [FILE]");
    println!();
    println!("Reads a request like {{\"zoneId\":\"zone_001\",\"interventions\":{{...}}}}");
    println!("from FILE, or from stdin when FILE is omitted.");
    println!();
    println!("OPTIONS:");
    println!("    -c, --catalog <NAME>    Intervention catalog: weighted | selection [default: weighted]");
    println!("    -s, --seed <N>          Enable presentation jitter with this seed");
    println!("    -r, --readings <FILE>   Station readings (JSON array); alert zones become simulatable");
    println!("        --pretty            Pretty-print the result JSON");
    println!("    -h, --help              Print help information");
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        catalog: None,
        seed: None,
        pretty: false,
        readings: None,
        input: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--catalog" | "-c" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("error: --catalog requires a value");
                    std::process::exit(2);
                };
                parsed.catalog = Some(value.parse().unwrap_or_else(|e| {
                    eprintln!("error: {e}");
                    std::process::exit(2);
                }));
                i += 2;
            }
            "--seed" | "-s" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("error: --seed requires a value");
                    std::process::exit(2);
                };
                parsed.seed = Some(value.parse().unwrap_or_else(|_| {
                    eprintln!("error: invalid seed: {value}");
                    std::process::exit(2);
                }));
                i += 2;
            }
            "--readings" | "-r" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("error: --readings requires a value");
                    std::process::exit(2);
                };
                parsed.readings = Some(PathBuf::from(value));
                i += 2;
            }
            "--pretty" => {
                parsed.pretty = true;
                i += 1;
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') && arg != "-" => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(2);
            }
            path => {
                if path != "-" {
                    parsed.input = Some(PathBuf::from(path));
                }
                i += 1;
            }
        }
    }

    parsed
}

/// The demo zone every run is seeded with.
fn reference_baseline() -> BaselineState {
    BaselineState::new(220.0)
        .with_pollutants(Pollutants {
            pm25: Some(105.0),
            pm10: Some(150.0),
            no2: Some(55.0),
            o3: Some(30.0),
            ..Pollutants::default()
        })
        .with_population(12_000)
}

fn read_input(input: Option<&PathBuf>) -> RespireResult<Vec<u8>> {
    let mut body = Vec::new();
    match input {
        Some(path) => {
            body = std::fs::read(path).map_err(|e| {
                RespireError::internal(format!("failed to read {}: {e}", path.display()))
            })?;
        }
        None => {
            std::io::stdin()
                .read_to_end(&mut body)
                .map_err(|e| RespireError::internal(format!("failed to read stdin: {e}")))?;
        }
    }
    Ok(body)
}

fn load_readings(path: &Path) -> RespireResult<Vec<StationReading>> {
    let bytes = std::fs::read(path).map_err(|e| {
        RespireError::internal(format!("failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        RespireError::internal(format!("invalid readings in {}: {e}", path.display()))
    })
}

fn run(args: &Args) -> RespireResult<Vec<u8>> {
    let mut config = RespireConfig::from_env()?;
    if let Some(catalog) = args.catalog {
        config.catalog = catalog;
        config.catalog_path = None;
    }
    if args.seed.is_some() {
        config.jitter_seed = args.seed;
    }

    let provider = InMemoryBaselineProvider::new();
    provider.insert("zone_001", reference_baseline())?;
    if let Some(path) = &args.readings {
        let alerts = config.compute_alerts(&load_readings(path)?);
        tracing::info!(alerts = alerts.len(), "seeding zones from alerts");
        for alert in &alerts {
            provider.insert(alert.zone_id.clone(), BaselineState::from_alert(alert))?;
        }
    }
    let service = config.build_service(Arc::new(provider))?;

    let body = read_input(args.input.as_ref())?;
    let out = service.handle_json(&body)?;
    if !args.pretty {
        return Ok(out);
    }

    let value: serde_json::Value = serde_json::from_slice(&out)
        .map_err(|e| RespireError::internal(format!("failed to re-read result JSON: {e}")))?;
    serde_json::to_vec_pretty(&value)
        .map_err(|e| RespireError::internal(format!("failed to format result JSON: {e}")))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("respire=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    match run(&args) {
        Ok(out) => {
            println!("{}", String::from_utf8_lossy(&out));
            ExitCode::SUCCESS
        }
        Err(err) => {
            let body = error_response(&err);
            match encode_json(&body) {
                Ok(bytes) => eprintln!("{}", String::from_utf8_lossy(&bytes)),
                Err(_) => eprintln!("error: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}
