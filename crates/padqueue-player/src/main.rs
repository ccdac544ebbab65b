//! padqueue - play a Spotify playlist from a Launchpad grid
//!
//! This is the main entry point. It:
//! 1. Loads the YAML config and the access token
//! 2. Binds the configured Spotify output device
//! 3. Opens the Launchpad and serves pad presses until the exit button
//!
//! ## Command line flags
//!
//! - `--list-ports`: Print MIDI ports and exit
//! - `--list-devices`: Print Spotify output devices and exit
//! - `--init-config`: Write a default config file and exit

mod app;
mod config;
mod discovery;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use padqueue_core::{CancelToken, PlaybackService, PlaybackSynchronizer, SpotifyService};
use padqueue_midi::{GridController, LaunchpadDevice, MidiConnection, Palette};

#[derive(Debug, Parser)]
#[command(name = "padqueue", version, about = "Play a Spotify playlist from a Launchpad grid")]
struct Cli {
    /// Config file (default: ~/.config/padqueue/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the playlist id from the config
    #[arg(long)]
    playlist: Option<String>,

    /// Override the output device name from the config
    #[arg(long)]
    device: Option<String>,

    /// Print available MIDI ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Print Spotify output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Write a default config to the config path and exit
    #[arg(long)]
    init_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set RUST_LOG=debug for per-poll output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("padqueue starting up");

    if cli.list_ports {
        return list_ports();
    }

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    if cli.init_config {
        config::save_config(&config::PlayerConfig::default(), &config_path)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    let mut config = config::load_config(&config_path);
    if let Some(playlist) = cli.playlist {
        config.spotify.playlist_id = playlist;
    }
    if let Some(device) = cli.device {
        config.spotify.device_name = device;
    }

    let token = config.spotify.read_token()?;
    let service = SpotifyService::new(&config.spotify.api_base, token);

    let devices = service
        .list_devices()
        .context("Failed to list Spotify output devices")?;
    if cli.list_devices {
        for device in &devices {
            println!(
                "{}{}  ({})",
                device.name,
                if device.is_active { " [active]" } else { "" },
                device.id
            );
        }
        return Ok(());
    }
    let binding = discovery::resolve_binding(&devices, &config.spotify.device_name);

    let cancel = CancelToken::new();
    let launchpad = LaunchpadDevice::connect(&config.grid).with_context(|| {
        format!("Failed to open grid controller matching '{}'", config.grid.port_match)
    })?;
    let mut grid = GridController::new(launchpad, Palette::from(&config.grid), cancel.clone())
        .with_exit_button(config.grid.resolved_exit_button());
    let mut sync = PlaybackSynchronizer::new(service, config.sync.clone(), binding, cancel);

    let source = config.spotify.window_source();
    app::run(&mut sync, &mut grid, &source);

    log::info!("padqueue shutting down");
    Ok(())
}

fn list_ports() -> anyhow::Result<()> {
    println!("MIDI input ports:");
    for name in MidiConnection::list_input_ports()? {
        println!("  {}", name);
    }
    println!("MIDI output ports:");
    for name in MidiConnection::list_output_ports()? {
        println!("  {}", name);
    }
    Ok(())
}
