use log::{debug, info, warn};

use crate::algorithms::min_distances;
use crate::error::InstallError;
use crate::network::Topology;
use crate::protocol::{FlowInstaller, FlowRule, build_rules};
use crate::routing_table::RoutingTable;

/// Topology node name of the switch announcing datapath id `datapath_id`.
pub fn switch_name(datapath_id: u64) -> String {
    format!("s{}", datapath_id)
}

/// Reacts to switches joining by computing and installing their rules.
///
/// Holds the topology read-only; concurrent joins only ever share `&self`.
#[derive(Debug)]
pub struct Controller {
    topology: Topology,
}

impl Controller {
    pub fn new(topology: Topology) -> Self {
        Self { topology }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn routes_for(&self, node: &str) -> RoutingTable {
        min_distances(&self.topology, node)
    }

    /// Rules for `node`, in installation order.
    pub fn rules_for(&self, node: &str) -> Vec<FlowRule> {
        let table = self.routes_for(node);
        for route in table.iter() {
            info!("{} to {} by port {}", node, route.destination, route.port);
        }
        build_rules(&self.topology, &table)
    }

    /// Installs the full rule set of the switch with `datapath_id`.
    ///
    /// Stops at the first installer failure. Rules sent before that stay on
    /// the switch.
    pub fn on_switch_join<I>(&self, datapath_id: u64, installer: &mut I) -> Result<(), InstallError>
    where
        I: FlowInstaller + ?Sized,
    {
        let name = switch_name(datapath_id);
        if self.topology.switch(&name).is_none() {
            warn!("Switch {} is not in the topology, installing table-miss only", name);
        }

        let rules = self.rules_for(&name);
        for rule in &rules {
            debug!("{}: install {}", name, rule);
            installer.install_flow(rule)?;
        }

        info!("Installed {} rules on {}", rules.len(), name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::fixtures::two_switches;
    use crate::protocol::FlowAction;

    /// Accepts `budget` rules, then reports the channel as closed.
    struct FlakyInstaller {
        budget: usize,
        installed: Vec<FlowRule>,
    }

    impl FlowInstaller for FlakyInstaller {
        fn install_flow(&mut self, rule: &FlowRule) -> Result<(), InstallError> {
            if self.installed.len() == self.budget {
                return Err(InstallError::ChannelClosed);
            }
            self.installed.push(rule.clone());
            Ok(())
        }
    }

    #[test]
    fn datapath_ids_map_to_switch_names() {
        assert_eq!(switch_name(1), "s1");
        assert_eq!(switch_name(42), "s42");
    }

    #[test]
    fn join_installs_rules_in_emission_order() {
        let controller = Controller::new(two_switches());
        let mut installed: Vec<FlowRule> = Vec::new();
        controller.on_switch_join(2, &mut installed).unwrap();

        assert_eq!(installed, controller.rules_for("s2"));
        assert_eq!(installed.len(), 10);
        assert_eq!(installed.last(), Some(&FlowRule::table_miss()));
    }

    #[test]
    fn unknown_switch_gets_only_the_table_miss() {
        let controller = Controller::new(two_switches());
        let mut installed: Vec<FlowRule> = Vec::new();
        controller.on_switch_join(7, &mut installed).unwrap();
        assert_eq!(installed, [FlowRule::table_miss()]);
    }

    #[test]
    fn install_failure_stops_the_join_and_keeps_earlier_rules() {
        let controller = Controller::new(two_switches());
        let mut installer = FlakyInstaller {
            budget: 3,
            installed: Vec::new(),
        };
        let err = controller.on_switch_join(1, &mut installer).unwrap_err();
        assert!(matches!(err, InstallError::ChannelClosed));
        assert_eq!(installer.installed.len(), 3);
        assert!(
            installer
                .installed
                .iter()
                .all(|r| matches!(r.actions[..], [FlowAction::Output(_)]))
        );
    }

    #[test]
    fn rejoin_installs_the_same_rules_again() {
        let controller = Controller::new(two_switches());
        let mut installed: Vec<FlowRule> = Vec::new();
        controller.on_switch_join(1, &mut installed).unwrap();
        controller.on_switch_join(1, &mut installed).unwrap();
        let (first, second) = installed.split_at(installed.len() / 2);
        assert_eq!(first, second);
    }
}
