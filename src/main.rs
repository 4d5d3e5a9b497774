use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ecmp_controller::domain::clock::clock::{SharedClock, WallClock};
use ecmp_controller::domain::controller::controller::Controller;
use ecmp_controller::domain::controller::events::{ControllerEvent, EventOutcome};
use ecmp_controller::domain::controller::runtime::ControllerRuntime;
use ecmp_controller::domain::controller::scenario::{Host, Scenario};
use ecmp_controller::domain::controller::southbound_mock::RecordingSouthbound;
use ecmp_controller::domain::network::addr::{ETH_TYPE_IPV4, IP_PROTO_UDP, NetworkHeader, PacketIn, PayloadRef};
use ecmp_controller::domain::network::datacenter::datacenter;
use ecmp_controller::domain::utils::statistics::StatsCollector;
use ecmp_controller::{load_config, load_scenario, logger};

#[derive(Parser)]
#[command(name = "ecmp-controller", about = "Least-used-path SDN controller with a flow-flood firewall")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Feed a scenario file through the controller.
    Replay {
        #[arg(long)]
        scenario: String,

        #[arg(long)]
        config: Option<String>,

        /// Write a CSV trace of recomputes, locks and packet outcomes.
        #[arg(long)]
        stats_file: Option<String>,
    },
    /// Build a layered datacenter fabric and route random client flows.
    Datacenter {
        #[arg(long, default_value_t = 3)]
        levels: u32,

        #[arg(long, default_value_t = 20)]
        flows: usize,

        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    logger::init();

    match Cli::parse().command {
        Command::Replay { scenario, config, stats_file } => replay(&scenario, config.as_deref(), stats_file.as_deref()),
        Command::Datacenter { levels, flows, seed } => run_datacenter(levels, flows, seed),
    }
}

fn replay(scenario_path: &str, config_path: Option<&str>, stats_file: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path).context("Could not load controller configuration")?;
    let scenario = load_scenario(scenario_path).with_context(|| format!("Could not load scenario '{}'", scenario_path))?;

    let southbound = RecordingSouthbound::new();
    let mut controller = Controller::new(config, Box::new(southbound.clone()), Box::new(scenario.host_tracker()), SharedClock(Arc::new(WallClock::new())));
    if let Some(path) = stats_file {
        controller = controller.with_stats(StatsCollector::to_file(path).with_context(|| format!("Could not create stats file '{}'", path))?);
    }

    let handle = ControllerRuntime::spawn(controller)?;

    for event in scenario.topology_events() {
        handle.request(event)?;
    }
    southbound.take_commands();

    for packet in scenario.packets.iter().cloned() {
        let (src, dst, dpid) = (packet.src, packet.dst, packet.dpid);
        let outcome = handle.request(ControllerEvent::PacketIn(packet))?;
        println!("{} -> {} at {}: {:?}", src, dst, dpid, outcome);
        for command in southbound.take_commands() {
            println!("    {:?}", command);
        }
    }

    let controller = handle.shutdown()?;
    print_use_counts(&controller);

    Ok(())
}

fn run_datacenter(levels: u32, flows: usize, seed: Option<u64>) -> anyhow::Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    log::info!("Datacenter run with {} levels, {} flows, seed {}", levels, flows, seed);

    let scenario = Scenario::try_from(datacenter(levels)?)?;
    let clients: Vec<&Host> = scenario.hosts.iter().filter(|h| h.name.starts_with("client")).collect();
    let providers: Vec<&Host> = scenario.hosts.iter().filter(|h| !h.name.starts_with("client")).collect();
    if clients.is_empty() || providers.is_empty() {
        bail!("Generated fabric has no client/provider pair");
    }

    let southbound = RecordingSouthbound::new();
    let controller = Controller::new(Default::default(), Box::new(southbound), Box::new(scenario.host_tracker()), SharedClock(Arc::new(WallClock::new())));
    let handle = ControllerRuntime::spawn_without_timers(controller)?;

    for event in scenario.topology_events() {
        handle.request(event)?;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for i in 0..flows {
        let client = clients[rng.random_range(0..clients.len())];
        let provider = providers[rng.random_range(0..providers.len())];

        let packet = PacketIn {
            dpid: client.location.dpid,
            in_port: client.location.port,
            src: client.mac,
            dst: provider.mac,
            ether_type: ETH_TYPE_IPV4,
            network: Some(NetworkHeader {
                protocol: IP_PROTO_UDP,
                src: client.ip.unwrap_or(Ipv4Addr::UNSPECIFIED),
                dst: provider.ip.unwrap_or(Ipv4Addr::UNSPECIFIED),
            }),
            payload: PayloadRef(i as u32),
        };

        if let EventOutcome::Packet(outcome) = handle.request(ControllerEvent::PacketIn(packet))? {
            println!("{} -> {}: {:?}", client.name, provider.name, outcome);
        }
    }

    let controller = handle.shutdown()?;
    print_use_counts(&controller);

    Ok(())
}

fn print_use_counts(controller: &Controller) {
    let snapshot = controller.routing().snapshot();
    let mut counts: Vec<_> = snapshot.use_counts().iter().filter(|((a, b), _)| a < b).collect();
    counts.sort();

    println!("Link use counts (generation {}):", snapshot.generation);
    for ((a, b), count) in counts {
        println!("    {} <-> {}: {}", a, b, count);
    }
}
