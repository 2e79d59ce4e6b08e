// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for decoding P-state tables and dry-running bring-up.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Host tool for inspecting firmware P-state tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use gpu_pstate::bios::PerfTableImage;
use gpu_pstate::domain::clk::ClkDomainGroup;
use gpu_pstate::domain::{DomainModule, PerfModel, SetupContext};
use gpu_pstate::pmu::{LoopbackPmu, PmuTarget};
use gpu_pstate::pstate::pstate_sw_setup;
use gpu_pstate::{PerfConfig, PmuCommand, PstateRegistry, PstateSupport};

#[derive(Debug, Parser)]
#[command(author, version, about = "GPU P-state table inspector")]
struct Cli {
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a performance table and print every P-state.
    Decode(TableArgs),
    /// Run both bring-up phases against an in-process PMU.
    Bringup(TableArgs),
}

#[derive(Debug, Parser)]
struct TableArgs {
    /// Subsystem configuration (TOML).
    #[arg(long)]
    config: PathBuf,
    /// Raw performance table dump.
    #[arg(long)]
    table: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str()))
        .init();
    match cli.command {
        Command::Decode(args) => decode(&args),
        Command::Bringup(args) => bringup(&args),
    }
}

fn load_inputs(args: &TableArgs) -> Result<(PerfConfig, PerfTableImage)> {
    let config = PerfConfig::load(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    let image = load_image(&args.table)?;
    Ok((config, image))
}

fn load_image(path: &Path) -> Result<PerfTableImage> {
    PerfTableImage::load(path).with_context(|| format!("read perf table {}", path.display()))
}

fn decode(args: &TableArgs) -> Result<()> {
    let (config, image) = load_inputs(args)?;
    let mut model = PerfModel::new().context("allocate clock domains")?;
    let mut pmu = LoopbackPmu::new();
    let mut clk_domains = ClkDomainGroup::new(config.clk_domains.clone());
    let mut ctx = SetupContext {
        caps: config.caps(),
        model: &mut model,
        pmu: &mut pmu,
    };
    clk_domains
        .software_setup(&mut ctx)
        .context("build clock domains")?;

    let registry = pstate_sw_setup(&image, &model.clk_domains).context("decode perf table")?;
    print_pstates(&registry, &config)?;
    registry.destroy();
    Ok(())
}

fn bringup(args: &TableArgs) -> Result<()> {
    let (config, image) = load_inputs(args)?;
    let mut support = PstateSupport::from_config(&config, LoopbackPmu::new(), image)
        .context("construct pstate support")?;
    support.software_phase().context("software phase")?;
    support.pmu_setup_phase().context("pmu phase")?;

    if let Some(registry) = support.pstates() {
        print_pstates(registry, &config)?;
    }
    for command in support.pmu().commands() {
        println!("pmu {}", describe(command));
    }
    support.deinit();
    Ok(())
}

fn print_pstates(registry: &PstateRegistry, config: &PerfConfig) -> Result<()> {
    for (index, pstate) in registry.snapshot()? {
        println!(
            "entry {index}: P{} lpwr={}",
            pstate.num(),
            pstate.lpwr_entry_idx()
        );
        for info in pstate.clklist() {
            let name = config
                .clk_domains
                .iter()
                .find(|entry| entry.api_domain == info.clkwhich.0)
                .map_or("?", |entry| entry.name.as_str());
            println!(
                "  {name:<12} nominal={:>5} MHz min={:>5} MHz max={:>5} MHz",
                info.nominal_mhz, info.min_mhz, info.max_mhz
            );
        }
    }
    Ok(())
}

fn describe(command: &PmuCommand) -> String {
    match (command, command.target()) {
        (PmuCommand::BoardObjGrpSet { mask, .. }, PmuTarget::Domain(domain)) => {
            format!("set {domain} mask={:?}", mask.iter().collect::<Vec<_>>())
        }
        (_, PmuTarget::Domain(domain)) => format!("init {domain}"),
        (_, PmuTarget::Load(load)) => format!("load {load}"),
    }
}
