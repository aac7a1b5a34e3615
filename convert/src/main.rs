//! CLI entry point.
//!
//! `convert <input> <output.json> [--mapping PATH] [--bounds ...] [--workers N]`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use anvil::Aabb;
use convert::{
    build_failure_json, build_output_json, convert_archive, convert_schematic, detect_input_format,
    CancellationToken, Catalog, ConversionOptions, InputFormat,
};

#[derive(Parser, Debug)]
#[command(name = "convert", about, version)]
struct Args {
    /// Input save archive (.zip) or schematic (.litematic/.schem/.schematic).
    input: PathBuf,

    /// Output voxel-world JSON document.
    output: PathBuf,

    /// Block-type catalog JSON overriding the embedded default.
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Inclusive world-coordinate bounds: minX,minY,minZ,maxX,maxY,maxZ.
    #[arg(long)]
    bounds: Option<String>,

    /// Rayon worker thread count for the region-file fan-out.
    /// Defaults to Rayon's own global-pool sizing.
    #[arg(long)]
    workers: Option<usize>,
}

/// Process exit codes.
const EXIT_OK: u8 = 0;
const EXIT_BAD_ARGS: u8 = 1;
const EXIT_IO_ERROR: u8 = 2;
const EXIT_DECODE_ERROR: u8 = 3;
const EXIT_UNSUPPORTED_FORMAT: u8 = 4;

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    ExitCode::from(run(args))
}

fn run(args: Args) -> u8 {
    let bounds = match args.bounds.as_deref().map(parse_bounds) {
        Some(Ok(b)) => Some(b),
        Some(Err(msg)) => {
            log::error!("invalid --bounds: {msg}");
            return EXIT_BAD_ARGS;
        }
        None => None,
    };

    let Some(format) = detect_input_format(&args.input) else {
        log::error!("unsupported input format: {}", args.input.display());
        return EXIT_UNSUPPORTED_FORMAT;
    };

    let catalog = match load_catalog(args.mapping.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to load catalog: {e}");
            return EXIT_DECODE_ERROR;
        }
    };

    let input_bytes = match std::fs::read(&args.input) {
        Ok(b) => b,
        Err(e) => {
            log::error!("failed to read {}: {e}", args.input.display());
            return EXIT_IO_ERROR;
        }
    };

    if let Some(workers) = args.workers {
        if rayon::ThreadPoolBuilder::new().num_threads(workers).build_global().is_err() {
            log::warn!("rayon global thread pool was already initialized; --workers ignored");
        }
    }

    let opts = ConversionOptions { bounds };
    let cancel = CancellationToken::new();

    let report = match format {
        InputFormat::ZipArchive => convert_archive(input_bytes, &catalog, &opts, &cancel),
        InputFormat::Schematic => convert_schematic(input_bytes, &catalog, &opts),
    };

    let report = match report {
        Ok(r) => r,
        Err(e) => {
            log::error!("conversion failed: {e}");
            let failure = build_failure_json(&e);
            if let Err(write_err) = write_output(&args.output, &failure) {
                log::error!("failed to write {}: {write_err}", args.output.display());
                return EXIT_IO_ERROR;
            }
            return EXIT_DECODE_ERROR;
        }
    };

    let output_json = build_output_json(&report, &catalog);
    if let Err(e) = write_output(&args.output, &output_json) {
        log::error!("failed to write {}: {e}", args.output.display());
        return EXIT_IO_ERROR;
    }

    log::info!("wrote {} blocks to {}", report.block_count(), args.output.display());
    EXIT_OK
}

fn load_catalog(mapping: Option<&std::path::Path>) -> Result<Catalog, String> {
    match mapping {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
            Catalog::parse(&json).map_err(|e| e.to_string())
        }
        None => Ok(Catalog::default_catalog()),
    }
}

fn write_output(path: &std::path::Path, value: &serde_json::Value) -> std::io::Result<()> {
    // Output is UTF-8 with no trailing newline.
    std::fs::write(path, serde_json::to_string(value)?)
}

fn parse_bounds(s: &str) -> Result<Aabb, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|_| format!("{p:?} is not an integer")))
        .collect::<Result<_, _>>()?;

    if parts.len() != 6 {
        return Err(format!("expected 6 comma-separated integers, got {}", parts.len()));
    }

    Ok(Aabb { min: (parts[0], parts[1], parts[2]), max: (parts[3], parts[4], parts[5]) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_bounds() {
        let bounds = parse_bounds("0,0,0,15,255,15").unwrap();
        assert_eq!(bounds.min, (0, 0, 0));
        assert_eq!(bounds.max, (15, 255, 15));
    }

    #[test]
    fn rejects_wrong_component_count() {
        assert!(parse_bounds("0,0,0").is_err());
    }

    #[test]
    fn rejects_non_integer_components() {
        assert!(parse_bounds("a,0,0,1,1,1").is_err());
    }
}
