use log::{debug, warn};
use pnet::packet::arp::ArpOperations;
use pnet::packet::ethernet::EtherTypes;

use crate::network::{NodeKind, Topology};
use crate::protocol::flow::{FlowMatch, FlowRule, ROUTE_PRIORITY};
use crate::routing_table::RoutingTable;

/// Turns a routing table into the rule set of its source switch.
///
/// Each reachable host gets an IPv4 rule and ARP request/reply rules on its
/// address; every reachable node gets a rule on its MAC. The list always ends
/// with exactly one table-miss rule to the controller.
pub fn build_rules(topology: &Topology, table: &RoutingTable) -> Vec<FlowRule> {
    let mut rules = Vec::new();

    for route in table.iter() {
        let out_port = route.port.number;
        let Some(kind) = topology.node_kind(&route.destination) else {
            warn!(
                "{}: no host or switch named {}, skipping",
                table.source(),
                route.destination
            );
            continue;
        };

        if let NodeKind::Host(host) = kind {
            let ip = host.ip();
            rules.push(FlowRule::output(
                ROUTE_PRIORITY,
                FlowMatch {
                    eth_type: Some(EtherTypes::Ipv4),
                    ipv4_dst: Some(ip),
                    ..FlowMatch::any()
                },
                out_port,
            ));
            for op in [ArpOperations::Request, ArpOperations::Reply] {
                rules.push(FlowRule::output(
                    ROUTE_PRIORITY,
                    FlowMatch {
                        eth_type: Some(EtherTypes::Arp),
                        arp_op: Some(op),
                        arp_tpa: Some(ip),
                        ..FlowMatch::any()
                    },
                    out_port,
                ));
            }
            debug!("{}: {} is a host", table.source(), route.destination);
        } else {
            debug!("{}: {} is a switch", table.source(), route.destination);
        }

        rules.push(FlowRule::output(
            ROUTE_PRIORITY,
            FlowMatch {
                eth_dst: Some(kind.mac()),
                ..FlowMatch::any()
            },
            out_port,
        ));
    }

    rules.push(FlowRule::table_miss());
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::min_distances;
    use crate::network::fixtures::{build, two_switches};
    use crate::protocol::flow::{DEFAULT_PRIORITY, FlowAction, NO_BUFFER};
    use std::net::Ipv4Addr;

    fn rules_for(topology: &Topology, source: &str) -> Vec<FlowRule> {
        build_rules(topology, &min_distances(topology, source))
    }

    #[test]
    fn host_gets_ip_and_arp_rules_then_mac_rule() {
        let topo = two_switches();
        let rules = rules_for(&topo, "s1");

        // h1 (4 rules), s2 (1), h2 (4), table-miss (1)
        assert_eq!(rules.len(), 10);

        let h2_ip = Ipv4Addr::new(10, 0, 0, 2);
        let h2: Vec<&FlowRule> = rules
            .iter()
            .filter(|r| r.matches.ipv4_dst == Some(h2_ip) || r.matches.arp_tpa == Some(h2_ip))
            .collect();
        assert_eq!(h2.len(), 3);
        assert!(h2.iter().all(|r| r.actions == [FlowAction::Output(1)]));
        assert_eq!(h2[0].matches.eth_type, Some(EtherTypes::Ipv4));
        assert_eq!(h2[1].matches.arp_op, Some(ArpOperations::Request));
        assert_eq!(h2[2].matches.arp_op, Some(ArpOperations::Reply));

        let s2_mac = topo.switch("s2").unwrap().mac;
        let s2_rule = rules
            .iter()
            .find(|r| r.matches.eth_dst == Some(s2_mac))
            .unwrap();
        assert!(s2_rule.matches.eth_type.is_none());
        assert_eq!(s2_rule.actions, [FlowAction::Output(1)]);

        let h1_mac = topo.host("h1").unwrap().mac;
        let h1_rule = rules.iter().find(|r| r.matches.eth_dst == Some(h1_mac)).unwrap();
        assert_eq!(h1_rule.actions, [FlowAction::Output(2)]);
    }

    #[test]
    fn exactly_one_default_rule_with_lowest_priority() {
        let rules = rules_for(&two_switches(), "s2");
        let defaults: Vec<&FlowRule> = rules.iter().filter(|r| r.matches.is_wildcard()).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].priority, DEFAULT_PRIORITY);
        assert_eq!(defaults[0].actions, [FlowAction::Controller { max_len: NO_BUFFER }]);
        assert!(
            rules
                .iter()
                .filter(|r| !r.matches.is_wildcard())
                .all(|r| r.priority > defaults[0].priority)
        );
        assert_eq!(rules.last(), Some(&FlowRule::table_miss()));
    }

    #[test]
    fn rule_count_is_three_per_host_plus_one_per_node_plus_default() {
        let topo = build(
            &["s1", "s2", "s3", "s4"],
            &["h1", "h2", "h3", "h4"],
            &[
                ("s1-eth1", "s2-eth1", 2),
                ("s2-eth2", "s3-eth1", 8),
                ("s1-eth2", "s3-eth2", 3),
                ("h1-eth0", "s1-eth3", 1),
                ("h2-eth0", "s2-eth3", 1),
                ("h3-eth0", "s3-eth3", 1),
                // s4 and h4 form an island
                ("h4-eth0", "s4-eth1", 1),
            ],
        );
        for source in ["s1", "s2", "s3", "s4"] {
            let table = min_distances(&topo, source);
            let hosts = table
                .iter()
                .filter(|r| topo.host(&r.destination).is_some())
                .count();
            let rules = build_rules(&topo, &table);
            assert_eq!(rules.len(), 3 * hosts + table.len() + 1, "{source}");
        }
    }

    #[test]
    fn isolated_switch_only_gets_the_default_rule() {
        let topo = build(&["s1", "s2"], &[], &[]);
        assert_eq!(rules_for(&topo, "s1"), [FlowRule::table_miss()]);
    }

    #[test]
    fn display_reads_like_a_flow_dump() {
        let rule = FlowRule::output(
            ROUTE_PRIORITY,
            FlowMatch {
                eth_type: Some(EtherTypes::Ipv4),
                ipv4_dst: Some(Ipv4Addr::new(10, 0, 0, 9)),
                ..FlowMatch::any()
            },
            3,
        );
        assert_eq!(
            rule.to_string(),
            "priority=1 eth_type=0x0800 ipv4_dst=10.0.0.9 actions=output:3"
        );
        assert_eq!(
            FlowRule::table_miss().to_string(),
            "priority=0 actions=controller:65535"
        );
    }
}
