// bmrt - Bare-Metal Run-Time Support
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use bmrt_config::LayoutManifest;
use bmrt_core::{LinkLayout, SegmentSizes};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_PASS: u8 = 0;
const EXIT_INVALID_LAYOUT: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

const RESULT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Host tooling for bmrt firmware images",
    long_about = None
)]
struct Cli {
    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a GNU ld script from a layout manifest (YAML).
    LinkerScript(LinkerScriptArgs),

    /// Check the link layout of a firmware ELF and list its run-time hooks.
    Check(CheckArgs),

    /// Print the segment sizes of a firmware ELF.
    Sizes(SizesArgs),
}

#[derive(Parser, Debug)]
struct LinkerScriptArgs {
    /// Path to the layout manifest (YAML)
    #[arg(short, long)]
    layout: PathBuf,

    /// Write the script here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the firmware ELF file
    #[arg(short, long)]
    firmware: PathBuf,

    /// Print the result as a single JSON object
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct SizesArgs {
    /// Path to the firmware ELF file
    #[arg(short, long)]
    firmware: PathBuf,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    result_schema_version: &'static str,
    firmware: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    layout: LinkLayout,
    sizes: SegmentSizes,
    heap_bytes: usize,
    stubs: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the script or the report.
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::LinkerScript(args) => run_linker_script(args),
        Commands::Check(args) => run_check(args),
        Commands::Sizes(args) => run_sizes(args),
    }
}

fn run_linker_script(args: LinkerScriptArgs) -> ExitCode {
    match render_linker_script(&args.layout, args.output.as_deref()) {
        Ok(()) => ExitCode::from(EXIT_PASS),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn render_linker_script(layout: &Path, output: Option<&Path>) -> Result<()> {
    let manifest = LayoutManifest::from_file(layout)?;
    let script = manifest.render_linker_script()?;
    match output {
        Some(path) => {
            std::fs::write(path, script)
                .with_context(|| format!("Failed to write linker script to {:?}", path))?;
            info!("Wrote linker script for '{}' to {:?}", manifest.name, path);
        }
        None => print!("{}", script),
    }
    Ok(())
}

fn run_check(args: CheckArgs) -> ExitCode {
    let report = match build_check_report(&args.firmware) {
        Ok(report) => report,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if args.json {
        match serde_json::to_string(&report) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        }
    } else {
        match &report.error {
            None => println!("Layout: OK"),
            Some(e) => println!("Layout: INVALID ({})", e),
        }
        println!("{}", report.sizes);
        println!("Heap: {:#x} bytes ({})", report.heap_bytes, report.layout.heap);
        if report.stubs.is_empty() {
            println!("Stubs: none");
        } else {
            println!("Stubs: {}", report.stubs.join(", "));
        }
    }

    if report.valid {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_INVALID_LAYOUT)
    }
}

fn build_check_report(firmware: &Path) -> Result<CheckReport> {
    let bytes = std::fs::read(firmware)
        .with_context(|| format!("Failed to read ELF file: {:?}", firmware))?;
    let layout = bmrt_loader::load_link_layout_bytes(&bytes)?;
    let stubs = bmrt_loader::linked_stubs(&bytes)?;
    let error = layout.validate().err().map(|e| e.to_string());

    Ok(CheckReport {
        result_schema_version: RESULT_SCHEMA_VERSION,
        firmware: firmware.display().to_string(),
        valid: error.is_none(),
        error,
        layout,
        sizes: layout.segment_sizes(),
        heap_bytes: layout.heap.len(),
        stubs,
    })
}

fn run_sizes(args: SizesArgs) -> ExitCode {
    match bmrt_loader::load_link_layout(&args.firmware) {
        Ok(layout) => {
            println!("{}", layout.segment_sizes());
            ExitCode::from(EXIT_PASS)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
