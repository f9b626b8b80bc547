use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use spf_controller::channel::ChannelServer;
use spf_controller::network::{LinkWeigher, RandomWeights};
use spf_controller::{Controller, Topology, TopologyDescription};

#[derive(Parser)]
#[command(name = "spf-controller", about = "Shortest-path forwarding controller")]
struct Cli {
    /// Topology description produced by the provisioning side
    #[arg(long, default_value = "config.json")]
    topology: PathBuf,

    /// Address switches connect to
    #[arg(long, default_value = "0.0.0.0:6633")]
    listen: String,

    /// Write the weighted graph listing to this file
    #[arg(long)]
    graph_log: Option<PathBuf>,

    /// Seed for link weights (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Save the description with its assigned weights, for reproducible reruns
    #[arg(long)]
    save_weighted: Option<PathBuf>,

    /// Print the rules of one switch (e.g. s1) and exit
    #[arg(long)]
    dry_run: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut description = TopologyDescription::load(&cli.topology)
        .with_context(|| format!("loading topology from {}", cli.topology.display()))?;

    let mut weigher: Box<dyn LinkWeigher> = match cli.seed {
        Some(seed) => Box::new(RandomWeights::seeded(seed)),
        None => Box::new(RandomWeights::new()),
    };
    let topology = Topology::load(&mut description, weigher.as_mut())
        .context("invalid topology description")?;

    info!(
        "Topology: {} hosts, {} switches, {} links",
        topology.hosts().count(),
        topology.switches().count(),
        topology.links().len()
    );
    for line in topology.render_dump().lines() {
        debug!("{}", line);
    }

    if let Some(path) = &cli.save_weighted {
        description.save(path)?;
        info!("Weighted topology saved to {}", path.display());
    }
    if let Some(path) = &cli.graph_log {
        topology.write_dump(path)?;
        info!("Graph listing written to {}", path.display());
    }

    let controller = Arc::new(Controller::new(topology));

    if let Some(switch) = &cli.dry_run {
        for rule in controller.rules_for(switch) {
            println!("{}", rule);
        }
        return Ok(());
    }

    let rt = Builder::new_multi_thread().enable_all().build()?;

    rt.block_on(async {
        let server = ChannelServer::bind(cli.listen.as_str(), controller).await?;
        server.run().await
    })
}
