use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::protocol::flow::{FlowAction, FlowMatch, FlowRule};
use crate::routing_table::RouteSummary;

/// Messages a switch sends on its channel, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwitchMessage {
    /// The switch identifies itself; triggers rule installation.
    Features { datapath_id: u64 },
    EchoRequest { xid: u32 },
    /// Diagnostics: ask for the first-hop table of a node.
    RoutingTable { switch: String },
}

/// Messages the controller writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerMessage {
    FlowMod(FlowMod),
    EchoReply { xid: u32 },
    RoutingTable {
        switch: String,
        routes: Vec<RouteSummary>,
    },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMod {
    pub priority: u16,
    #[serde(rename = "match")]
    pub matches: MatchFields,
    pub actions: Vec<ActionWire>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_type: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_dst: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_dst: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp_op: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp_tpa: Option<Ipv4Addr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionWire {
    Output { port: u32 },
    Controller { max_len: u16 },
}

impl From<&FlowMatch> for MatchFields {
    fn from(m: &FlowMatch) -> Self {
        Self {
            eth_type: m.eth_type.map(|t| t.0),
            eth_dst: m.eth_dst.map(|mac| mac.to_string()),
            ipv4_dst: m.ipv4_dst,
            arp_op: m.arp_op.map(|op| op.0),
            arp_tpa: m.arp_tpa,
        }
    }
}

impl From<&FlowAction> for ActionWire {
    fn from(action: &FlowAction) -> Self {
        match *action {
            FlowAction::Output(port) => ActionWire::Output { port },
            FlowAction::Controller { max_len } => ActionWire::Controller { max_len },
        }
    }
}

impl From<&FlowRule> for FlowMod {
    fn from(rule: &FlowRule) -> Self {
        Self {
            priority: rule.priority,
            matches: MatchFields::from(&rule.matches),
            actions: rule.actions.iter().map(ActionWire::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::flow::{FlowRule, ROUTE_PRIORITY};
    use pnet::datalink::MacAddr;
    use pnet::packet::arp::ArpOperations;
    use pnet::packet::ethernet::EtherTypes;
    use serde_json::json;

    #[test]
    fn switch_messages_are_type_tagged() {
        let msg: SwitchMessage =
            serde_json::from_str(r#"{"type":"features","datapath_id":3}"#).unwrap();
        assert_eq!(msg, SwitchMessage::Features { datapath_id: 3 });

        let msg: SwitchMessage =
            serde_json::from_str(r#"{"type":"routing_table","switch":"s2"}"#).unwrap();
        assert_eq!(msg, SwitchMessage::RoutingTable { switch: "s2".into() });

        assert!(serde_json::from_str::<SwitchMessage>(r#"{"type":"reboot"}"#).is_err());
    }

    #[test]
    fn arp_rule_serializes_with_numeric_fields() {
        let rule = FlowRule::output(
            ROUTE_PRIORITY,
            FlowMatch {
                eth_type: Some(EtherTypes::Arp),
                arp_op: Some(ArpOperations::Reply),
                arp_tpa: Some(Ipv4Addr::new(192, 168, 0, 4)),
                ..FlowMatch::any()
            },
            2,
        );
        let value = serde_json::to_value(ControllerMessage::FlowMod(FlowMod::from(&rule))).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "flow_mod",
                "priority": 1,
                "match": {"eth_type": 0x0806, "arp_op": 2, "arp_tpa": "192.168.0.4"},
                "actions": [{"output": {"port": 2}}]
            })
        );
    }

    #[test]
    fn mac_and_default_rules_serialize() {
        let rule = FlowRule::output(
            ROUTE_PRIORITY,
            FlowMatch {
                eth_dst: Some(MacAddr::new(1, 0, 0, 0, 0, 7)),
                ..FlowMatch::any()
            },
            5,
        );
        assert_eq!(
            serde_json::to_value(FlowMod::from(&rule)).unwrap()["match"],
            json!({"eth_dst": "01:00:00:00:00:07"})
        );

        let miss = serde_json::to_value(FlowMod::from(&FlowRule::table_miss())).unwrap();
        assert_eq!(
            miss,
            json!({"priority": 0, "match": {}, "actions": [{"controller": {"max_len": 65535}}]})
        );
    }
}
