//! Host-side plugin activation: wiring facets onto the servers.

use berth_plugins::{PluginActivator, PluginDescriptor, PluginError};
use tracing::debug;

use crate::subsystems::{PortServer, SubsystemError};

const ACTIVATION_TARGET: &str = "berth::activation";

/// Wires each plugin's facets into the host's two servers.
///
/// Panel facets are served through the API server and machine facets are
/// delivered through the daemon server, so activation claims the plugin's
/// segment on both. The declared `parts` structure is passed through for
/// the servers to interpret; the wiring itself does not look inside it.
pub struct FacetWiring<'hosts> {
    api: &'hosts mut dyn PortServer,
    daemon: &'hosts mut dyn PortServer,
}

impl<'hosts> FacetWiring<'hosts> {
    /// Creates a wiring over the host's API and daemon servers.
    pub fn new(api: &'hosts mut dyn PortServer, daemon: &'hosts mut dyn PortServer) -> Self {
        Self { api, daemon }
    }

    fn wiring_failure(descriptor: &PluginDescriptor, source: &SubsystemError) -> PluginError {
        PluginError::Activation {
            name: descriptor.name().to_owned(),
            message: source.to_string(),
        }
    }
}

impl PluginActivator for FacetWiring<'_> {
    fn activate(&mut self, descriptor: &PluginDescriptor) -> Result<(), PluginError> {
        let segment = format!("plugins/{}", descriptor.name());
        self.api
            .mount(&segment)
            .map_err(|source| Self::wiring_failure(descriptor, &source))?;
        self.daemon
            .mount(&segment)
            .map_err(|source| Self::wiring_failure(descriptor, &source))?;
        debug!(
            target: ACTIVATION_TARGET,
            plugin = descriptor.name(),
            panel_environments = descriptor.panel().len(),
            machine_environments = descriptor.machine().len(),
            parts = %descriptor.parts(),
            "plugin facets wired"
        );
        Ok(())
    }

    fn deactivate(&mut self, descriptor: &PluginDescriptor) -> Result<(), PluginError> {
        let segment = format!("plugins/{}", descriptor.name());
        self.api
            .unmount(&segment)
            .map_err(|source| Self::wiring_failure(descriptor, &source))?;
        self.daemon
            .unmount(&segment)
            .map_err(|source| Self::wiring_failure(descriptor, &source))?;
        debug!(target: ACTIVATION_TARGET, plugin = descriptor.name(), "plugin facets unwired");
        Ok(())
    }
}
