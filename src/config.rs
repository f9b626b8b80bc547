use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::network::weights::{LinkWeigher, MAX_WEIGHT, MIN_WEIGHT};

/// Topology as written by the provisioning side (hosts, switches, links).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyDescription {
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
    #[serde(default)]
    pub switches: Vec<SwitchRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub name: String,
    pub mac: String,
    /// `<ipv4>/<prefix>`
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRecord {
    pub name: String,
    pub mac: String,
}

/// A link between two `<node>-<port>` endpoints. The weight is appended
/// once at load time when the provisioning side did not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkRecord {
    Weighted(String, String, u32),
    Plain(String, String),
}

impl LinkRecord {
    pub fn endpoints(&self) -> (&str, &str) {
        match self {
            LinkRecord::Weighted(a, b, _) | LinkRecord::Plain(a, b) => (a, b),
        }
    }

    pub fn weight(&self) -> Option<u32> {
        match self {
            LinkRecord::Weighted(_, _, w) => Some(*w),
            LinkRecord::Plain(..) => None,
        }
    }
}

impl TopologyDescription {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Gives every unweighted link a weight from `weigher` and checks the
    /// ones that already carry a weight. Links are rewritten in place.
    pub fn assign_weights<W: LinkWeigher + ?Sized>(
        &mut self,
        weigher: &mut W,
    ) -> Result<(), ConfigError> {
        for link in &mut self.links {
            let weight = match link {
                LinkRecord::Weighted(_, _, w) => *w,
                LinkRecord::Plain(a, b) => {
                    let w = weigher.weigh(a, b);
                    *link = LinkRecord::Weighted(a.clone(), b.clone(), w);
                    w
                }
            };

            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
                let (a, b) = link.endpoints();
                return Err(ConfigError::WeightOutOfRange {
                    a: a.to_string(),
                    b: b.to_string(),
                    weight,
                });
            }
        }
        Ok(())
    }

    pub fn get_host(&self, name: &str) -> Option<&HostRecord> {
        self.hosts.iter().find(|h| h.name == name)
    }

    pub fn get_switch(&self, name: &str) -> Option<&SwitchRecord> {
        self.switches.iter().find(|s| s.name == name)
    }
}
