//! Preset management commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use sala_config::{ReverbPreset, factory_presets};

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List factory presets
    List,

    /// Show a preset as TOML
    Show {
        /// Factory preset name or path
        name: String,
    },

    /// Write a preset to a TOML file for editing
    Export {
        /// Factory preset name or path
        name: String,

        /// Destination file
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List => list_presets(),
        PresetsCommand::Show { name } => show_preset(&name),
        PresetsCommand::Export { name, file, force } => export_preset(&name, &file, force),
    }
}

fn list_presets() -> anyhow::Result<()> {
    println!("Factory Presets:");
    println!("================");
    for preset in factory_presets() {
        let desc = preset.description.as_deref().unwrap_or("");
        println!(
            "  {:18} RT60 {:>5.1}s  {:2} units  - {}",
            preset.name, preset.settings.rt60, preset.settings.delay_units, desc
        );
    }
    Ok(())
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let preset = ReverbPreset::find(name)?;
    print!("{}", preset.to_toml()?);
    Ok(())
}

fn export_preset(name: &str, file: &Path, force: bool) -> anyhow::Result<()> {
    if file.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", file.display());
    }
    let preset = ReverbPreset::find(name)?;
    preset.save(file)?;
    println!("Exported '{}' to {}", preset.name, file.display());
    Ok(())
}
