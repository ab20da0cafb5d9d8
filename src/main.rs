use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use topogen::orchestrator;
use topogen::plugin::PluginRegistry;

/// Topology compiler generating Mininet scripts from declarative JSON networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the topology JSON file
    #[arg(short, long)]
    topology: PathBuf,

    /// Directory containing plugin unit manifests
    #[arg(short, long, default_value = "plugins")]
    plugins: PathBuf,

    /// Output path for the generated Mininet script
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List discovered plugins and exit
    #[arg(long)]
    list_plugins: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting topogen");
    info!("Topology file: {:?}", args.topology);
    info!("Plugin directory: {:?}", args.plugins);

    let mut registry = PluginRegistry::new();
    registry.discover(&args.plugins)?;

    if args.list_plugins {
        if registry.is_empty() {
            println!("No plugins discovered.");
        }
        for descriptor in registry.descriptors() {
            println!(
                "{} v{} [{}] - {}",
                descriptor.name,
                descriptor.version,
                descriptor.capabilities_label(),
                descriptor.description
            );
        }
        return Ok(());
    }

    let output_path = orchestrator::generate_script(&args.topology, &registry, args.output.as_deref())?;

    info!("Generated Mininet script: {:?}", output_path);
    info!("Run it with: sudo python {:?}", output_path);
    Ok(())
}
