use log::debug;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::NodeId;
use crate::network::{Port, Topology};
use crate::routing_table::{RouteEntry, RoutingTable};

#[derive(Debug)]
struct State {
    cost: u32,
    node: NodeId,
    /// Port on the source, carried unchanged through every expansion.
    first_hop: Port,
}

impl State {
    fn key(&self) -> (u32, &str, &str) {
        (self.cost, self.node.as_str(), self.first_hop.name.as_str())
    }
}

impl Eq for State {}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and we want the smallest
        // (cost, node, port) on top.
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cheapest first hop from `source` to every node it can reach.
///
/// Every switch runs this with itself as source, so the table only records
/// the local port that starts each path; switches further along make their
/// own decision. Entries are in finalization order. An unknown or isolated
/// source gets an empty table.
pub fn min_distances(topology: &Topology, source: &str) -> RoutingTable {
    let mut table = RoutingTable::new(source);
    let mut heap = BinaryHeap::new();
    let mut finalized: HashSet<NodeId> = HashSet::new();
    finalized.insert(source.to_string());

    for adj in topology.get_neighbors(source) {
        heap.push(State {
            cost: adj.weight,
            node: adj.neighbor.clone(),
            first_hop: adj.port.clone(),
        });
    }

    while let Some(State { cost, node, first_hop }) = heap.pop() {
        if !finalized.insert(node.clone()) {
            continue;
        }

        for adj in topology.get_neighbors(&node) {
            if !finalized.contains(&adj.neighbor) {
                heap.push(State {
                    cost: cost.saturating_add(adj.weight),
                    node: adj.neighbor.clone(),
                    first_hop: first_hop.clone(),
                });
            }
        }

        debug!("{} reaches {} via {} (cost {})", source, node, first_hop, cost);
        table.add_route(RouteEntry {
            destination: node,
            port: first_hop,
            cost,
        });
    }

    table
}
