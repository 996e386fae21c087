//! Rack Designer command-line entry point.
//!
//! Each invocation loads the configuration and the stored layout, runs one
//! editor command through the command bridge, saves the result and prints it.
//!
//! # Usage
//!
//! ```text
//! rack-designer [--config PATH] [--layout PATH] <COMMAND>
//!
//! Commands:
//!   catalog                         List placeable hardware models
//!   show [--json]                   Draw the rack and list cables
//!   place <MODEL_KEY>               Place a device at the lowest free unit
//!   move <DEVICE_ID> <START_UNIT>   Move a device (clamped at the top)
//!   remove <DEVICE_ID>              Remove a device and its cables
//!   connect <DEV:PORT> <DEV:PORT>   Cable two ports
//!   disconnect <CONNECTION_ID>      Delete a cable
//!   label <DEV:PORT> [LABEL]        Set or clear a port label
//!   vlan <DEV:PORT> [VLAN]          Set or clear a port VLAN tag
//!   reset                           Empty the rack
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable      | Description                                   |
//! |---------------|-----------------------------------------------|
//! | `RACK_CONFIG` | Config file (default: platform config dir)    |
//! | `RACK_LAYOUT` | Layout JSON file (default: from the config)   |
//! | `RUST_LOG`    | Log filter (default: the config's log level)  |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rack_designer::infrastructure::storage::config::{self, AppConfig};
use rack_designer::infrastructure::storage::layout_file::JsonLayoutFile;
use rack_designer::infrastructure::ui_bridge::{self, AppState, CommandResult, LayoutDto, PortRefDto};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Plan a 42U network rack: place hardware, move it, and cable ports together.
#[derive(Debug, Parser)]
#[command(name = "rack-designer", version)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, env = "RACK_CONFIG")]
    config: Option<PathBuf>,

    /// Layout file to edit instead of the one named in the config.
    #[arg(long, env = "RACK_LAYOUT")]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List placeable hardware models.
    Catalog,
    /// Draw the rack and list cables.
    Show {
        /// Print the layout as JSON instead of a drawing.
        #[arg(long)]
        json: bool,
    },
    /// Place a device at the lowest free unit.
    Place { model_key: String },
    /// Move a device so its bottom sits at START_UNIT.
    Move {
        device_id: String,
        #[arg(allow_negative_numbers = true)]
        start_unit: i64,
    },
    /// Remove a device and every cable attached to it.
    Remove { device_id: String },
    /// Cable two ports, each given as DEVICE_ID:PORT.
    Connect {
        #[arg(value_parser = parse_port_arg)]
        from: PortRefDto,
        #[arg(value_parser = parse_port_arg)]
        to: PortRefDto,
    },
    /// Delete a cable.
    Disconnect { connection_id: String },
    /// Set a port label, or clear it when LABEL is omitted.
    Label {
        #[arg(value_parser = parse_port_arg)]
        port: PortRefDto,
        label: Option<String>,
    },
    /// Set a port VLAN tag, or clear it when VLAN is omitted.
    Vlan {
        #[arg(value_parser = parse_port_arg)]
        port: PortRefDto,
        vlan: Option<u16>,
    },
    /// Remove every device and cable.
    Reset,
}

/// Parses `DEVICE_ID:PORT`.  The split is on the last colon.
fn parse_port_arg(raw: &str) -> Result<PortRefDto, String> {
    let (device_id, index) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected DEVICE_ID:PORT, got {raw:?}"))?;
    let port_index = index
        .parse::<u32>()
        .map_err(|e| format!("invalid port index {index:?}: {e}"))?;
    if device_id.is_empty() {
        return Err(format!("missing device id in {raw:?}"));
    }
    Ok(PortRefDto {
        device_id: device_id.to_string(),
        port_index,
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_file_path().context("locating config file")?,
    };
    let app_config = config::load_config_from(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    // Level is overridden by `RUST_LOG`.  Logs go to stderr to keep stdout clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.editor.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let layout_path = layout_path(&cli, &app_config, &config_path);
    debug!(config = %config_path.display(), layout = %layout_path.display(), "starting");

    let state = AppState::new(app_config, Box::new(JsonLayoutFile::new(&layout_path)))
        .with_context(|| format!("opening layout {}", layout_path.display()))?;

    run(cli.command, state).await
}

fn layout_path(cli: &Cli, app_config: &AppConfig, config_path: &std::path::Path) -> PathBuf {
    match &cli.layout {
        Some(path) => path.clone(),
        None => {
            let dir = config_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            app_config.layout_file_path(&dir)
        }
    }
}

async fn run(command: Command, state: Arc<AppState>) -> anyhow::Result<()> {
    match command {
        Command::Catalog => {
            let entries = into_data(ui_bridge::get_catalog(state).await)?;
            for e in entries {
                println!(
                    "{:<12} {:>2}U {:>3} ports  {:<7} {}",
                    e.key, e.height_units, e.port_count, e.category, e.name
                );
            }
        }
        Command::Show { json } => {
            let layout = into_data(ui_bridge::get_layout(state).await)?;
            if json {
                print_json(&layout)?;
            } else {
                print!("{}", render_rack(&layout));
            }
        }
        Command::Place { model_key } => {
            print_json(&into_data(ui_bridge::place_device(state, model_key).await)?)?;
        }
        Command::Move {
            device_id,
            start_unit,
        } => {
            print_json(&into_data(
                ui_bridge::move_device(state, device_id, start_unit).await,
            )?)?;
        }
        Command::Remove { device_id } => {
            print_json(&into_data(ui_bridge::remove_device(state, device_id).await)?)?;
        }
        Command::Connect { from, to } => {
            into_data(ui_bridge::select_port(Arc::clone(&state), from).await)?;
            let second = into_data(ui_bridge::select_port(state, to).await)?;
            match second.connection {
                Some(connection) => print_json(&connection)?,
                None => bail!("both ends name the same port; no cable created"),
            }
        }
        Command::Disconnect { connection_id } => {
            print_json(&into_data(
                ui_bridge::delete_connection(state, connection_id).await,
            )?)?;
        }
        Command::Label { port, label } => {
            print_json(&into_data(ui_bridge::set_port_label(state, port, label).await)?)?;
        }
        Command::Vlan { port, vlan } => {
            print_json(&into_data(ui_bridge::set_port_vlan(state, port, vlan).await)?)?;
        }
        Command::Reset => {
            into_data(ui_bridge::reset_layout(state).await)?;
            println!("rack cleared");
        }
    }
    Ok(())
}

fn into_data<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<T> {
    if result.success {
        result.data.context("command returned no data")
    } else {
        bail!(result.error.unwrap_or_else(|| "command failed".to_string()))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("encoding output")?
    );
    Ok(())
}

/// Draws the rack top-down, one line per unit, then lists the cables.
fn render_rack(layout: &LayoutDto) -> String {
    let mut out = String::new();
    for unit in (1..=layout.rack_units).rev() {
        let device = layout
            .devices
            .iter()
            .find(|d| d.start_unit <= unit && unit <= d.top_unit);
        let cell = match device {
            Some(d) if unit == d.top_unit => format!("{} [{}] {}", d.name, d.model_key, d.id),
            Some(_) => "  \"".to_string(),
            None => String::new(),
        };
        out.push_str(&format!("U{unit:02} | {cell}\n"));
    }
    if !layout.connections.is_empty() {
        out.push_str("\ncables:\n");
        for c in &layout.connections {
            out.push_str(&format!(
                "  {}  {}:{} <-> {}:{}  {}\n",
                c.id, c.a.device_id, c.a.port_index, c.b.device_id, c.b.port_index, c.color
            ));
        }
    }
    out
}
