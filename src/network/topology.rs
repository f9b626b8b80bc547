use ipnet::Ipv4Net;
use log::debug;
use pnet::datalink::MacAddr;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::NodeId;
use crate::config::{LinkRecord, TopologyDescription};
use crate::error::ConfigError;
use crate::network::weights::LinkWeigher;

/// A switch-scoped interface, e.g. `eth2` with index 2.
///
/// Ordering is by name first so that ties in the shortest-path queue are
/// broken lexicographically on the interface name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Port {
    pub name: String,
    pub number: u32,
}

impl Port {
    pub fn parse(endpoint: &str, name: &str) -> Result<Self, ConfigError> {
        let digits_at = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let number = name[digits_at..]
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidPort {
                endpoint: endpoint.to_string(),
                port: name.to_string(),
            })?;

        Ok(Self {
            name: name.to_string(),
            number,
        })
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One end of a link: `s1-eth2` is node `s1`, port `eth2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub node: NodeId,
    pub port: Port,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (node, port) = raw
            .rsplit_once('-')
            .filter(|(node, port)| !node.is_empty() && !port.is_empty())
            .ok_or_else(|| ConfigError::InvalidEndpoint(raw.to_string()))?;

        Ok(Self {
            node: node.to_string(),
            port: Port::parse(raw, port)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HostInfo {
    pub name: NodeId,
    pub mac: MacAddr,
    pub network: Ipv4Net,
}

impl HostInfo {
    pub fn ip(&self) -> Ipv4Addr {
        self.network.addr()
    }
}

#[derive(Debug, Clone)]
pub struct SwitchInfo {
    pub name: NodeId,
    pub mac: MacAddr,
}

/// What a node is, with the metadata needed to build rules for it.
#[derive(Debug, Clone, Copy)]
pub enum NodeKind<'a> {
    Host(&'a HostInfo),
    Switch(&'a SwitchInfo),
}

impl NodeKind<'_> {
    pub fn mac(&self) -> MacAddr {
        match self {
            NodeKind::Host(h) => h.mac,
            NodeKind::Switch(s) => s.mac,
        }
    }
}

/// Entry in a node's adjacency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    pub neighbor: NodeId,
    pub weight: u32,
    /// Local port of the node owning this entry.
    pub port: Port,
}

#[derive(Debug, Clone)]
pub struct Link {
    pub a: Endpoint,
    pub b: Endpoint,
    pub weight: u32,
}

/// Static network graph. Built once from a description and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    adjacency: HashMap<NodeId, Vec<Adjacency>>,
    hosts: BTreeMap<NodeId, HostInfo>,
    switches: BTreeMap<NodeId, SwitchInfo>,
    links: Vec<Link>,
}

impl Topology {
    /// Weighs unweighted links with `weigher`, then builds the graph.
    pub fn load<W: LinkWeigher + ?Sized>(
        description: &mut TopologyDescription,
        weigher: &mut W,
    ) -> Result<Self, ConfigError> {
        description.assign_weights(weigher)?;
        Self::from_description(description)
    }

    /// Builds the graph from a description whose links all carry weights.
    /// Unweighted links are rejected here; use [`Topology::load`] for those.
    pub fn from_description(description: &TopologyDescription) -> Result<Self, ConfigError> {
        let mut topology = Topology::default();

        for host in &description.hosts {
            topology.ensure_unique(&host.name)?;
            let mac = parse_mac(&host.name, &host.mac)?;
            let network = host.ip.parse::<Ipv4Net>().map_err(|_| ConfigError::InvalidIp {
                host: host.name.clone(),
                ip: host.ip.clone(),
            })?;
            topology.hosts.insert(
                host.name.clone(),
                HostInfo {
                    name: host.name.clone(),
                    mac,
                    network,
                },
            );
        }

        for switch in &description.switches {
            topology.ensure_unique(&switch.name)?;
            let mac = parse_mac(&switch.name, &switch.mac)?;
            topology.switches.insert(
                switch.name.clone(),
                SwitchInfo {
                    name: switch.name.clone(),
                    mac,
                },
            );
        }

        for record in &description.links {
            let (raw_a, raw_b) = record.endpoints();
            let weight = match record {
                LinkRecord::Weighted(_, _, w) => *w,
                LinkRecord::Plain(..) => {
                    return Err(ConfigError::UnweightedLink {
                        a: raw_a.to_string(),
                        b: raw_b.to_string(),
                    });
                }
            };

            let a = topology.resolve(raw_a)?;
            let b = topology.resolve(raw_b)?;
            topology.add_link(Link { a, b, weight });
        }

        debug!(
            "Topology loaded: {} hosts, {} switches, {} links",
            topology.hosts.len(),
            topology.switches.len(),
            topology.links.len()
        );

        Ok(topology)
    }

    fn ensure_unique(&self, name: &str) -> Result<(), ConfigError> {
        if self.hosts.contains_key(name) || self.switches.contains_key(name) {
            return Err(ConfigError::DuplicateNode(name.to_string()));
        }
        Ok(())
    }

    fn resolve(&self, raw: &str) -> Result<Endpoint, ConfigError> {
        let endpoint = Endpoint::parse(raw)?;
        if !self.contains(&endpoint.node) {
            return Err(ConfigError::UnknownNode {
                endpoint: raw.to_string(),
                node: endpoint.node,
            });
        }
        Ok(endpoint)
    }

    fn add_link(&mut self, link: Link) {
        self.adjacency
            .entry(link.a.node.clone())
            .or_default()
            .push(Adjacency {
                neighbor: link.b.node.clone(),
                weight: link.weight,
                port: link.a.port.clone(),
            });
        self.adjacency
            .entry(link.b.node.clone())
            .or_default()
            .push(Adjacency {
                neighbor: link.a.node.clone(),
                weight: link.weight,
                port: link.b.port.clone(),
            });
        self.links.push(link);
    }

    pub fn get_neighbors(&self, node: &str) -> &[Adjacency] {
        self.adjacency
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, node: &str) -> bool {
        self.hosts.contains_key(node) || self.switches.contains_key(node)
    }

    pub fn node_kind(&self, node: &str) -> Option<NodeKind<'_>> {
        if let Some(host) = self.hosts.get(node) {
            return Some(NodeKind::Host(host));
        }
        self.switches.get(node).map(NodeKind::Switch)
    }

    pub fn host(&self, name: &str) -> Option<&HostInfo> {
        self.hosts.get(name)
    }

    pub fn switch(&self, name: &str) -> Option<&SwitchInfo> {
        self.switches.get(name)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &HostInfo> {
        self.hosts.values()
    }

    pub fn switches(&self) -> impl Iterator<Item = &SwitchInfo> {
        self.switches.values()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Human-readable graph listing: sorted `<a> <b> <weight>` lines, one per
    /// link, followed by sorted `<node> <port> <neighbor>` lines, one per
    /// adjacency entry.
    pub fn render_dump(&self) -> String {
        let mut weights: Vec<String> = self
            .links
            .iter()
            .map(|l| format!("{} {} {}", l.a.node, l.b.node, l.weight))
            .collect();
        let mut ports: Vec<String> = self
            .adjacency
            .iter()
            .flat_map(|(node, entries)| {
                entries
                    .iter()
                    .map(move |e| format!("{} {} {}", node, e.port, e.neighbor))
            })
            .collect();
        weights.sort();
        ports.sort();

        let mut out = String::new();
        for line in weights.iter().chain(ports.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn write_dump(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.render_dump()).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn parse_mac(node: &str, raw: &str) -> Result<MacAddr, ConfigError> {
    raw.parse::<MacAddr>().map_err(|_| ConfigError::InvalidMac {
        node: node.to_string(),
        mac: raw.to_string(),
    })
}
