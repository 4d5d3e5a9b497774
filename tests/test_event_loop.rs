use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ecmp_controller::domain::clock::clock::{SharedClock, WallClock};
use ecmp_controller::domain::controller::config::ControllerConfig;
use ecmp_controller::domain::controller::controller::Controller;
use ecmp_controller::domain::controller::events::{ControllerEvent, EventOutcome, LinkEvent, PacketOutcome};
use ecmp_controller::domain::controller::host_tracker::{HostLocation, HostTracker};
use ecmp_controller::domain::controller::runtime::ControllerRuntime;
use ecmp_controller::domain::controller::southbound::SouthboundCommand;
use ecmp_controller::domain::controller::southbound_mock::RecordingSouthbound;
use ecmp_controller::domain::firewall::firewall::FirewallConfig;
use ecmp_controller::domain::network::addr::{ETH_TYPE_IPV4, FlowMatch, FlowStat, MacAddr, PacketIn, PayloadRef};
use ecmp_controller::domain::utils::id::SwitchId;

fn sw(id: u64) -> SwitchId {
    SwitchId::new(id)
}

fn create_controller(config: ControllerConfig, southbound: &RecordingSouthbound) -> Controller {
    let mut hosts = HostTracker::new();
    hosts.pin(MacAddr::from_u64(1), HostLocation { dpid: sw(1), port: 3 });
    hosts.pin(MacAddr::from_u64(2), HostLocation { dpid: sw(2), port: 3 });

    Controller::new(config, Box::new(southbound.clone()), Box::new(hosts), SharedClock(Arc::new(WallClock::new())))
}

#[test]
fn test_events_are_handled_in_order() {
    let southbound = RecordingSouthbound::new();
    let handle = ControllerRuntime::spawn_without_timers(create_controller(ControllerConfig::default(), &southbound)).unwrap();

    handle.send(ControllerEvent::SwitchUp { dpid: sw(1), ports: vec![1, 3] }).unwrap();
    handle.send(ControllerEvent::SwitchUp { dpid: sw(2), ports: vec![1, 3] }).unwrap();
    let link = LinkEvent { dpid_a: sw(1), port_a: 1, dpid_b: sw(2), port_b: 1 };
    assert_eq!(handle.request(ControllerEvent::LinkUp(link)).unwrap(), EventOutcome::Applied);

    let packet = PacketIn {
        dpid: sw(1),
        in_port: 3,
        src: MacAddr::from_u64(1),
        dst: MacAddr::from_u64(2),
        ether_type: ETH_TYPE_IPV4,
        network: None,
        payload: PayloadRef(0),
    };
    assert_eq!(handle.request(ControllerEvent::PacketIn(packet)).unwrap(), EventOutcome::Packet(PacketOutcome::Forwarded(1)));

    let controller = handle.shutdown().unwrap();
    assert_eq!(controller.connected_switches(), vec![sw(1), sw(2)]);
    assert_eq!(controller.routing().recompute_count(), 1);
}

#[test]
fn test_timers_drive_lock_and_unlock() {
    let southbound = RecordingSouthbound::new();
    let firewall = FirewallConfig {
        sample_interval: Duration::from_millis(20),
        unlock_interval: Duration::from_millis(60),
        ..FirewallConfig::default()
    };
    let config = ControllerConfig { firewall, ..ControllerConfig::default() };

    let victim = Ipv4Addr::new(10, 0, 0, 2);
    let flows: Vec<FlowStat> = (0..80)
        .map(|i| FlowStat { flow_match: FlowMatch { dl_src: Some(MacAddr::from_u64(500 + i)), ..FlowMatch::udp_to(victim) }, packet_count: 1 })
        .collect();
    southbound.set_flow_stats(sw(1), flows);

    let handle = ControllerRuntime::spawn(create_controller(config, &southbound)).unwrap();
    handle.request(ControllerEvent::SwitchUp { dpid: sw(1), ports: vec![1] }).unwrap();

    thread::sleep(Duration::from_millis(400));
    let controller = handle.shutdown().unwrap();

    let commands = southbound.commands();
    let rule = FlowMatch::udp_to(victim);
    assert!(commands.iter().any(|c| matches!(c, SouthboundCommand::InstallBlockRule { flow_match, .. } if *flow_match == rule)));
    assert!(commands.iter().any(|c| matches!(c, SouthboundCommand::RemoveBlockRule { flow_match, .. } if *flow_match == rule)));
    assert_eq!(controller.config().firewall.sample_interval, Duration::from_millis(20));
}

#[test]
fn test_dropped_handle_stops_the_loop() {
    let southbound = RecordingSouthbound::new();
    let handle = ControllerRuntime::spawn(create_controller(ControllerConfig::default(), &southbound)).unwrap();
    handle.send(ControllerEvent::SwitchUp { dpid: sw(1), ports: vec![1] }).unwrap();

    // Joins the timers and the event loop; would hang if either kept running.
    drop(handle);

    assert!(southbound.commands().iter().all(|c| c.dpid() == sw(1)));
}
