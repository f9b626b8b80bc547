pub mod algorithms;
pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod network;
pub mod protocol;
pub mod routing_table;

/// Name of a host or switch, unique within a topology.
pub type NodeId = String;

pub use config::TopologyDescription;
pub use controller::Controller;
pub use error::{ConfigError, InstallError};
pub use network::Topology;
pub use routing_table::RoutingTable;
