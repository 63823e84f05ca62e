//! Activation seam between the registry and the host.

use crate::error::PluginError;
use crate::manifest::PluginDescriptor;

/// Wires a plugin's declared parts and environment facets into the host.
///
/// The registry drives activation through this trait so it stays ignorant
/// of what "wiring" means: the host mounts panel facets on its API surface
/// and machine facets on its daemon surface, while tests substitute
/// recording fakes.
pub trait PluginActivator {
    /// Activates one registered plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Activation`] when the host cannot wire the
    /// plugin's facets.
    fn activate(&mut self, descriptor: &PluginDescriptor) -> Result<(), PluginError>;

    /// Deactivates one enabled plugin, releasing whatever [`activate`]
    /// wired.
    ///
    /// [`activate`]: PluginActivator::activate
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Activation`] when unwiring fails.
    fn deactivate(&mut self, descriptor: &PluginDescriptor) -> Result<(), PluginError>;
}
