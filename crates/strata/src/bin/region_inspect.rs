//! # Region Inspector
//!
//! Command-line dump of a region file: header, palettes, chunks and any
//! decode warnings.

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;

use strata::region::{
    chunk_position, Catalogs, DecodeWarning, RegionCodec, RegionHeader, Registry,
};
use strata::{RegionResult, StrataConfig};

fn print_usage() {
    println!("Usage: region_inspect <region_file> [options]");
    println!();
    println!("Options:");
    println!("  --header               Stop after the header (payload is not inflated)");
    println!("  --registry <file>      Voxel / biome catalog (TOML)");
    println!("  --config <file>        Strata config (TOML); only [codec] is used");
    println!();
    println!("Without --registry every material decodes to the fallback voxel;");
    println!("the identifier stored in the file is shown next to it.");
}

fn option_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1].starts_with("--") {
        print_usage();
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> RegionResult<()> {
    let path = Path::new(&args[1]);
    let header_only = args.iter().any(|a| a == "--header");
    let registry = match option_value(args, "--registry") {
        Some(file) => Registry::load(file)?,
        None => Registry::new(),
    };
    let config = match option_value(args, "--config") {
        Some(file) => StrataConfig::load(file)?,
        None => StrataConfig::default(),
    };

    let bytes = std::fs::read(path)
        .map_err(|_| strata::RegionError::MissingFile { path: path.to_path_buf() })?;
    let summary = RegionHeader::peek(&bytes)?;
    let header = &summary.header;

    println!("┌─ HEADER ─────────────────────────────────────────────────────┐");
    println!("│ File:               {}", path.display());
    println!("│ Grid:               {} x {} chunks", header.x_size, header.z_size);
    println!("│ Populated:          {} / {}", header.populated.count(), header.capacity());
    println!("│ Payload:            {} bytes ({} inflated)", summary.compressed_len, summary.raw_len);
    println!("└──────────────────────────────────────────────────────────────┘");
    if header_only {
        return Ok(());
    }

    let codec = RegionCodec::with_config(Catalogs::from_registry(&registry), config.codec);
    let decoded = codec.decode(&bytes)?;
    let region = &decoded.region;

    let stored_names: HashMap<u32, &str> = decoded
        .report
        .warnings()
        .iter()
        .filter_map(|warning| match warning {
            DecodeWarning::UnknownMaterial { index, identifier } => {
                Some((*index, identifier.as_str()))
            }
            _ => None,
        })
        .collect();

    println!();
    println!("┌─ MATERIALS ({}) ", region.materials().len());
    for entry in region.materials().iter() {
        let marker = if entry.custom { " [custom]" } else { "" };
        let stored = stored_names
            .get(&entry.index)
            .map(|name| format!("  (stored as {name})"))
            .unwrap_or_default();
        println!(
            "│ {:>5}  {}{}{}  ({} properties, {} states)",
            entry.index,
            entry.identifier,
            marker,
            stored,
            entry.property_count,
            entry.states.len()
        );
    }
    println!("├─ BIOMES ({}) ", region.biomes().len());
    for entry in region.biomes().iter() {
        println!("│ {:>5}  {}", entry.index, entry.identifier);
    }
    println!("└──────────────────────────────────────────────────────────────┘");

    println!();
    println!("┌─ CHUNKS ({}) ", region.chunk_count());
    for (index, chunk) in region.chunks() {
        let (x, z) = chunk_position(index, usize::from(region.x_size()));
        let cells: usize = chunk.sections().map(|(_, s)| s.cell_count()).sum();
        let slots: Vec<usize> = chunk.populated().iter().collect();
        println!("│ #{index:<5} ({x:>3}, {z:>3})  sections {slots:?}  cells {cells}");
    }
    println!("└──────────────────────────────────────────────────────────────┘");

    if decoded.report.is_clean() {
        println!();
        println!("✓ Decoded without warnings");
    } else {
        println!();
        println!("⚠ {} warnings:", decoded.report.warnings().len());
        for warning in decoded.report.warnings() {
            println!("  - {warning}");
        }
    }
    Ok(())
}
