use serde::{Deserialize, Serialize};

use crate::NodeId;
use crate::network::Port;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub destination: NodeId,
    /// Local port of the source switch that begins the cheapest path.
    pub port: Port,
    pub cost: u32,
}

/// Serializable view of a route, used by the diagnostics query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub destination: NodeId,
    pub port: String,
    pub cost: u32,
}

impl From<&RouteEntry> for RouteSummary {
    fn from(entry: &RouteEntry) -> Self {
        Self {
            destination: entry.destination.clone(),
            port: entry.port.name.clone(),
            cost: entry.cost,
        }
    }
}

/// First-hop table of one source node, in the order destinations were
/// finalized. Nodes that cannot be reached have no entry.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    source: NodeId,
    routes: Vec<RouteEntry>,
}

impl RoutingTable {
    pub fn new(source: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            routes: Vec::new(),
        }
    }

    pub fn add_route(&mut self, entry: RouteEntry) {
        self.routes.push(entry);
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get_route(&self, destination: &str) -> Option<&RouteEntry> {
        self.routes.iter().find(|r| r.destination == destination)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(destination, port name)` pairs, handy for logging and assertions.
    pub fn hops(&self) -> Vec<(&str, &str)> {
        self.routes
            .iter()
            .map(|r| (r.destination.as_str(), r.port.name.as_str()))
            .collect()
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes.iter().map(RouteSummary::from).collect()
    }
}
