use pnet::datalink::MacAddr;
use pnet::packet::arp::ArpOperation;
use pnet::packet::ethernet::EtherType;
use std::fmt;
use std::net::Ipv4Addr;

use crate::error::InstallError;

/// Priority of the destination-specific rules.
pub const ROUTE_PRIORITY: u16 = 1;
/// Priority of the catch-all rule. Must stay below [`ROUTE_PRIORITY`].
pub const DEFAULT_PRIORITY: u16 = 0;
/// `max_len` meaning "send the whole packet to the controller, don't buffer".
pub const NO_BUFFER: u16 = 0xffff;

/// Match fields a rule may constrain. `None` is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowMatch {
    pub eth_type: Option<EtherType>,
    pub eth_dst: Option<MacAddr>,
    pub ipv4_dst: Option<Ipv4Addr>,
    pub arp_op: Option<ArpOperation>,
    pub arp_tpa: Option<Ipv4Addr>,
}

impl FlowMatch {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_wildcard(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    Output(u32),
    Controller { max_len: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRule {
    pub priority: u16,
    pub matches: FlowMatch,
    pub actions: Vec<FlowAction>,
}

impl FlowRule {
    pub fn output(priority: u16, matches: FlowMatch, port: u32) -> Self {
        Self {
            priority,
            matches,
            actions: vec![FlowAction::Output(port)],
        }
    }

    /// Lowest-priority rule sending anything unmatched to the controller.
    pub fn table_miss() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            matches: FlowMatch::any(),
            actions: vec![FlowAction::Controller { max_len: NO_BUFFER }],
        }
    }
}

impl fmt::Display for FlowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "priority={}", self.priority)?;
        let m = &self.matches;
        if let Some(t) = m.eth_type {
            write!(f, " eth_type=0x{:04x}", t.0)?;
        }
        if let Some(mac) = m.eth_dst {
            write!(f, " eth_dst={}", mac)?;
        }
        if let Some(ip) = m.ipv4_dst {
            write!(f, " ipv4_dst={}", ip)?;
        }
        if let Some(op) = m.arp_op {
            write!(f, " arp_op={}", op.0)?;
        }
        if let Some(ip) = m.arp_tpa {
            write!(f, " arp_tpa={}", ip)?;
        }
        for action in &self.actions {
            match action {
                FlowAction::Output(port) => write!(f, " actions=output:{}", port)?,
                FlowAction::Controller { max_len } => {
                    write!(f, " actions=controller:{}", max_len)?
                }
            }
        }
        Ok(())
    }
}

/// Pushes rules into a switch's flow table.
pub trait FlowInstaller {
    fn install_flow(&mut self, rule: &FlowRule) -> Result<(), InstallError>;
}

/// Records rules instead of sending them. Used for dry runs and tests.
impl FlowInstaller for Vec<FlowRule> {
    fn install_flow(&mut self, rule: &FlowRule) -> Result<(), InstallError> {
        self.push(rule.clone());
        Ok(())
    }
}
