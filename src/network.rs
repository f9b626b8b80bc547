pub mod topology;
pub mod weights;

pub use topology::{Adjacency, Endpoint, HostInfo, Link, NodeKind, Port, SwitchInfo, Topology};
pub use weights::{FixedWeight, LinkWeigher, RandomWeights};
