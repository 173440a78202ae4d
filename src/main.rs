//! # Tillprint CLI
//!
//! Command-line interface for receipt printing and the print relay.
//!
//! ## Usage
//!
//! ```bash
//! # Show what a receipt will look like
//! tillprint preview order.json
//!
//! # Print through the first channel that works
//! tillprint print order.json
//!
//! # Run the print relay next to a USB printer
//! tillprint serve --listen 0.0.0.0:3001 --printer POS-80
//!
//! # Ask a relay about its printer
//! tillprint status --relay-url http://192.168.1.20:3001
//! ```
//!
//! Defaults come from `TILL_*` environment variables; flags override them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;

use tillprint::{
    Capabilities, ConnectionManager, FallbackCoordinator, TillError,
    channel::{
        Channel,
        dialog::{DialogChannel, LpDocumentPrinter},
        direct::DirectChannel,
        relay::RelayChannel,
    },
    config::Settings,
    logging,
    receipt::{PricingSnapshot, RawOrder, Receipt, build_receipt},
    render_text, server,
    transport::BluezRadio,
};

/// Tillprint - Thermal receipt printing for restaurant POS
#[derive(Parser, Debug)]
#[command(name = "tillprint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an order through direct link, system print or relay
    Print {
        /// Order JSON file
        order: PathBuf,

        /// Printer name for the system print queue
        #[arg(long)]
        printer: Option<String>,

        /// Relay base URL
        #[arg(long)]
        relay_url: Option<String>,

        /// Log the receipt instead of printing it
        #[arg(long, conflicts_with = "live")]
        simulate: bool,

        /// Print for real even outside production
        #[arg(long)]
        live: bool,
    },

    /// Render an order as plain text on stdout
    Preview {
        /// Order JSON file
        order: PathBuf,
    },

    /// Run the HTTP print relay
    Serve {
        /// Address to listen on
        #[arg(long)]
        listen: Option<String>,

        /// Local printer queue name
        #[arg(long)]
        printer: Option<String>,

        /// Raw printer device file
        #[arg(long)]
        device: Option<PathBuf>,

        /// Log receipts instead of printing them
        #[arg(long, conflicts_with = "live")]
        simulate: bool,

        /// Print for real even outside production
        #[arg(long)]
        live: bool,
    },

    /// Show a relay's printer status
    Status {
        /// Relay base URL
        #[arg(long)]
        relay_url: Option<String>,
    },

    /// List printers visible to a relay
    Printers {
        /// Relay base URL
        #[arg(long)]
        relay_url: Option<String>,

        /// List printers on this machine instead of asking a relay
        #[arg(long)]
        local: bool,
    },
}

#[tokio::main]
async fn main() {
    logging::init_logger();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), TillError> {
    let cli = Cli::parse();
    let mut settings = Settings::from_env();

    match cli.command {
        Commands::Print {
            order,
            printer,
            relay_url,
            simulate,
            live,
        } => {
            apply_simulate(&mut settings, simulate, live);
            if let Some(printer) = printer {
                settings.printer = printer;
            }
            if let Some(url) = relay_url {
                settings.relay_url = url;
            }

            let receipt = load_receipt(&order)?;
            let coordinator = build_coordinator(&settings)?;
            let outcome = coordinator.print(&receipt).await?;
            println!("Printed via {}: {}", outcome.channel_used, outcome.message);
        }

        Commands::Preview { order } => {
            let receipt = load_receipt(&order)?;
            print!("{}", render_text(&receipt));
        }

        Commands::Serve {
            listen,
            printer,
            device,
            simulate,
            live,
        } => {
            apply_simulate(&mut settings, simulate, live);
            if let Some(listen) = listen {
                settings.listen_addr = listen;
            }
            if let Some(printer) = printer {
                settings.printer = printer;
            }
            if device.is_some() {
                settings.device = device;
            }
            server::serve(settings.relay_config()).await?;
        }

        Commands::Status { relay_url } => {
            if let Some(url) = relay_url {
                settings.relay_url = url;
            }
            let status = settings.relay_client()?.status().await?;
            println!(
                "{} ({}): {} [{}]",
                status.printer, status.environment, status.message, status.mode
            );
            println!("connected: {}", status.connected);
        }

        Commands::Printers { relay_url, local } => {
            let printers = if local {
                server::spool::list_printers().await
            } else {
                if let Some(url) = relay_url {
                    settings.relay_url = url;
                }
                settings.relay_client()?.printers().await?.printers
            };

            if printers.is_empty() {
                println!("No printers found");
            }
            for name in printers {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

fn apply_simulate(settings: &mut Settings, simulate: bool, live: bool) {
    if simulate {
        settings.simulate = true;
    } else if live {
        settings.simulate = false;
    }
}

/// Read an order file and build its receipt. Prices come from the order
/// itself, captured now.
fn load_receipt(path: &Path) -> Result<Receipt, TillError> {
    let data = std::fs::read_to_string(path)?;
    let order: RawOrder = serde_json::from_str(&data)
        .map_err(|e| TillError::Config(format!("invalid order file {}: {}", path.display(), e)))?;
    let pricing = PricingSnapshot::new(Local::now().naive_local());
    Ok(build_receipt(&order, &pricing)?)
}

fn build_coordinator(settings: &Settings) -> Result<FallbackCoordinator, TillError> {
    let simulate = settings.simulate;
    let capabilities = if simulate {
        Capabilities::all()
    } else {
        Capabilities::detect()
    };
    info!(simulate, ?capabilities, printer = %settings.printer, "print channels ready");

    let manager = ConnectionManager::new(Arc::new(BluezRadio::new()), settings.connection_config());
    let channels: Vec<Box<dyn Channel>> = vec![
        Box::new(DirectChannel::new(manager).simulated(simulate)),
        Box::new(
            DialogChannel::new(Arc::new(LpDocumentPrinter::new(settings.printer.clone())))
                .simulated(simulate),
        ),
        Box::new(RelayChannel::new(settings.relay_client()?).simulated(simulate)),
    ];

    Ok(FallbackCoordinator::new(channels, capabilities))
}
