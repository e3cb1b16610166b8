use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use voxchat::app::{ChatOverrides, run_chat_command};
use voxchat::audio::capture::list_devices;
use voxchat::cli::Cli;
use voxchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            let overrides = ChatOverrides {
                device: cli.device,
                server: cli.server,
                threshold: cli.threshold,
                silence: cli.silence,
                grace: cli.grace,
                once: cli.once,
                no_auto: cli.no_auto,
            };
            run_chat_command(config, overrides, cli.quiet, cli.verbose).await?;
        }
        Some(voxchat::cli::Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(voxchat::cli::Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut voxchat::cli::Cli::command(),
                "voxchat",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/voxchat/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// List available audio input devices.
fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("{}", "No audio input devices found".red());
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  {} {}", format!("[{}]", idx).dimmed(), device);
    }

    Ok(())
}
