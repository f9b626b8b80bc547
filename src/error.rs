use std::path::PathBuf;
use thiserror::Error;

/// Problems with the topology description. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read topology file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed topology description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("link endpoint {0:?} is not of the form <node>-<port>")]
    InvalidEndpoint(String),

    #[error("port {port:?} of endpoint {endpoint:?} has no numeric index")]
    InvalidPort { endpoint: String, port: String },

    #[error("link endpoint {endpoint:?} references unknown node {node:?}")]
    UnknownNode { endpoint: String, node: String },

    #[error("node {0:?} is declared more than once")]
    DuplicateNode(String),

    #[error("node {node:?} has an invalid MAC address {mac:?}")]
    InvalidMac { node: String, mac: String },

    #[error("host {host:?} has an invalid address {ip:?} (expected <ipv4>/<prefix>)")]
    InvalidIp { host: String, ip: String },

    #[error("link {a} <-> {b} has no weight assigned")]
    UnweightedLink { a: String, b: String },

    #[error("link {a} <-> {b} has weight {weight}, expected 1..=10")]
    WeightOutOfRange { a: String, b: String, weight: u32 },
}

/// Failure reported by the collaborator that pushes rules to a switch.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("switch channel closed while installing rules")]
    ChannelClosed,
}
