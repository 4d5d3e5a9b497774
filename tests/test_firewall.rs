use std::net::Ipv4Addr;
use std::sync::Arc;

use ecmp_controller::domain::clock::clock::SharedClock;
use ecmp_controller::domain::clock::clock_mock::MockClock;
use ecmp_controller::domain::controller::southbound::SouthboundCommand;
use ecmp_controller::domain::controller::southbound_mock::RecordingSouthbound;
use ecmp_controller::domain::firewall::firewall::{FirewallConfig, FirewallMonitor, LockState};
use ecmp_controller::domain::network::addr::{FlowMatch, FlowStat, IP_PROTO_TCP, MacAddr};
use ecmp_controller::domain::utils::id::SwitchId;

const VICTIM: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 7);

fn sw(id: u64) -> SwitchId {
    SwitchId::new(id)
}

/// `count` distinct UDP flows towards `dst`, one per source address.
fn udp_flows(dst: Ipv4Addr, count: usize) -> Vec<FlowStat> {
    (0..count)
        .map(|i| FlowStat {
            flow_match: FlowMatch { dl_src: Some(MacAddr::from_u64(i as u64 + 100)), ..FlowMatch::udp_to(dst) },
            packet_count: 1,
        })
        .collect()
}

fn create_monitor(clock: &MockClock) -> FirewallMonitor {
    FirewallMonitor::new(FirewallConfig::default(), SharedClock(Arc::new(clock.clone())))
}

#[test]
fn test_threshold_boundary() {
    let clock = MockClock::new(0);
    let southbound = RecordingSouthbound::new();
    let mut monitor = create_monitor(&clock);
    let mut sb = southbound.clone();

    southbound.set_flow_stats(sw(1), udp_flows(VICTIM, 50));
    assert!(monitor.sample(&[sw(1)], &mut sb).is_empty());
    assert_eq!(monitor.state(VICTIM), LockState::Clear, "Exactly 50 flows must stay clear");

    southbound.set_flow_stats(sw(1), udp_flows(VICTIM, 51));
    clock.set_current_time_in_ms(2_000);
    assert_eq!(monitor.sample(&[sw(1)], &mut sb), vec![VICTIM]);
    assert_eq!(monitor.state(VICTIM), LockState::Locked { since_ms: 2_000 });
}

#[test]
fn test_lock_installs_block_rule_on_every_switch() {
    let clock = MockClock::new(0);
    let southbound = RecordingSouthbound::new();
    let mut monitor = create_monitor(&clock);
    let mut sb = southbound.clone();
    let priority = monitor.config().block_priority;

    southbound.set_flow_stats(sw(2), udp_flows(VICTIM, 60));
    monitor.sample(&[sw(1), sw(2)], &mut sb);

    let blocks: Vec<SouthboundCommand> =
        southbound.commands().into_iter().filter(|c| matches!(c, SouthboundCommand::InstallBlockRule { .. })).collect();
    assert_eq!(
        blocks,
        vec![
            SouthboundCommand::InstallBlockRule { dpid: sw(1), flow_match: FlowMatch::udp_to(VICTIM), priority },
            SouthboundCommand::InstallBlockRule { dpid: sw(2), flow_match: FlowMatch::udp_to(VICTIM), priority },
        ]
    );
}

#[test]
fn test_counts_are_per_sample_and_per_switch() {
    let clock = MockClock::new(0);
    let southbound = RecordingSouthbound::new();
    let mut monitor = create_monitor(&clock);
    let mut sb = southbound.clone();

    // 30 + 30 across two switches never crosses the threshold on its own.
    southbound.set_flow_stats(sw(1), udp_flows(VICTIM, 30));
    southbound.set_flow_stats(sw(2), udp_flows(VICTIM, 30));

    for _ in 0..5 {
        assert!(monitor.sample(&[sw(1), sw(2)], &mut sb).is_empty());
    }
    assert!(!monitor.is_locked(VICTIM));
}

#[test]
fn test_only_udp_flows_with_a_destination_count() {
    let clock = MockClock::new(0);
    let monitor = create_monitor(&clock);

    let mut stats = udp_flows(VICTIM, 3);
    stats.push(FlowStat { flow_match: FlowMatch { nw_proto: Some(IP_PROTO_TCP), ..FlowMatch::udp_to(VICTIM) }, packet_count: 9 });
    stats.push(FlowStat { flow_match: FlowMatch { nw_dst: None, ..FlowMatch::udp_to(VICTIM) }, packet_count: 9 });
    stats.push(FlowStat { flow_match: FlowMatch::match_all(), packet_count: 9 });

    let counts = monitor.count_flows(&stats);
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[&VICTIM], 3);
}

#[test]
fn test_locked_destination_is_not_counted_again() {
    let clock = MockClock::new(0);
    let southbound = RecordingSouthbound::new();
    let mut monitor = create_monitor(&clock);
    let mut sb = southbound.clone();

    southbound.set_flow_stats(sw(1), udp_flows(VICTIM, 80));
    assert_eq!(monitor.sample(&[sw(1)], &mut sb), vec![VICTIM]);

    assert!(monitor.count_flows(&udp_flows(VICTIM, 80)).is_empty());
    assert!(monitor.sample(&[sw(1)], &mut sb).is_empty(), "Already locked destinations are not locked twice");
    assert_eq!(monitor.locked_destinations(), vec![VICTIM]);
}

#[test]
fn test_unlock_is_unconditional() {
    let clock = MockClock::new(1_000);
    let southbound = RecordingSouthbound::new();
    let mut monitor = create_monitor(&clock);
    let mut sb = southbound.clone();
    let unlock_ms = monitor.config().unlock_interval.as_millis() as i64;

    southbound.set_flow_stats(sw(1), udp_flows(VICTIM, 80));
    monitor.sample(&[sw(1)], &mut sb);
    assert!(monitor.is_locked(VICTIM));
    southbound.take_commands();

    // Offending traffic is still there when the sweep runs.
    clock.advance_ms(unlock_ms);
    assert_eq!(monitor.unlock_all(&[sw(1)], &mut sb), vec![VICTIM]);
    assert_eq!(monitor.state(VICTIM), LockState::Clear);

    let priority = monitor.config().block_priority;
    assert_eq!(southbound.take_commands(), vec![SouthboundCommand::RemoveBlockRule { dpid: sw(1), flow_match: FlowMatch::udp_to(VICTIM), priority }]);

    // The next sample catches it again.
    assert_eq!(monitor.sample(&[sw(1)], &mut sb), vec![VICTIM]);
}

#[test]
fn test_disconnected_switch_is_skipped() {
    let clock = MockClock::new(0);
    let southbound = RecordingSouthbound::new();
    let mut monitor = create_monitor(&clock);
    let mut sb = southbound.clone();

    southbound.set_flow_stats(sw(1), udp_flows(VICTIM, 80));
    southbound.set_flow_stats(sw(2), udp_flows(VICTIM, 80));
    southbound.disconnect(sw(1));

    assert_eq!(monitor.sample(&[sw(1), sw(2)], &mut sb), vec![VICTIM]);
    assert!(southbound.commands().iter().all(|c| c.dpid() == sw(2)));

    assert_eq!(monitor.unlock_all(&[sw(1), sw(2)], &mut sb), vec![VICTIM]);
    southbound.take_commands();

    southbound.reconnect(sw(1));
    assert_eq!(monitor.sample(&[sw(1), sw(2)], &mut sb), vec![VICTIM]);
    assert!(southbound.commands().iter().any(|c| c.dpid() == sw(1)), "A reconnected switch is sampled and blocked again");
}

#[test]
fn test_new_switch_receives_existing_block_rules() {
    let clock = MockClock::new(0);
    let southbound = RecordingSouthbound::new();
    let mut monitor = create_monitor(&clock);
    let mut sb = southbound.clone();

    southbound.set_flow_stats(sw(1), udp_flows(VICTIM, 80));
    monitor.sample(&[sw(1)], &mut sb);
    southbound.take_commands();

    monitor.on_switch_up(sw(5), &mut sb);

    let priority = monitor.config().block_priority;
    assert_eq!(southbound.take_commands(), vec![SouthboundCommand::InstallBlockRule { dpid: sw(5), flow_match: FlowMatch::udp_to(VICTIM), priority }]);
}
