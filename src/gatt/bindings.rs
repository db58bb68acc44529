//! Per-connection resolution of logical roles to transport handles.

use heapless::LinearMap;
use log::{debug, warn};

use super::uuids::{CLIENT_CONFIG_DESCRIPTOR, Role, SERVICE_COOLER};
use super::{CharHandle, DescHandle, DiscoveredService};

/// Resolved handles for one connection.
///
/// Built once after discovery and dropped on disconnect. A role whose
/// characteristic was not discovered stays unbound and every later
/// operation against it is skipped.
#[derive(Debug, Default)]
pub struct CharacteristicBindings {
    handles: [Option<CharHandle>; Role::COUNT],
    cccds: [Option<DescHandle>; Role::COUNT],
    by_handle: LinearMap<CharHandle, Role, { Role::COUNT }>,
}

impl CharacteristicBindings {
    /// Find the cooler service among `services` and bind its roles.
    ///
    /// `None` when the cooler service is absent.
    pub fn from_services(services: &[DiscoveredService]) -> Option<Self> {
        services
            .iter()
            .find(|s| s.uuid == SERVICE_COOLER)
            .map(Self::resolve)
    }

    /// Bind every role found in `service`.
    pub fn resolve(service: &DiscoveredService) -> Self {
        let mut bindings = Self::default();
        for role in Role::ALL {
            let Some(found) = service.characteristic(role.uuid()) else {
                debug!("bindings: {} not present, skipping", role);
                continue;
            };
            if bindings.by_handle.insert(found.handle, role).is_err() {
                warn!("bindings: handle table full at {}", role);
                continue;
            }
            bindings.handles[role.index()] = Some(found.handle);
            bindings.cccds[role.index()] = found.descriptor(CLIENT_CONFIG_DESCRIPTOR);
        }
        bindings
    }

    pub fn handle(&self, role: Role) -> Option<CharHandle> {
        self.handles[role.index()]
    }

    /// Notification-configuration descriptor for `role`, if exposed.
    pub fn cccd(&self, role: Role) -> Option<DescHandle> {
        self.cccds[role.index()]
    }

    /// Reverse lookup used to route completions and notifications.
    pub fn role_of(&self, handle: CharHandle) -> Option<Role> {
        self.by_handle.get(&handle).copied()
    }

    pub fn is_bound(&self, role: Role) -> bool {
        self.handle(role).is_some()
    }

    /// Number of bound roles.
    pub fn bound_count(&self) -> usize {
        self.by_handle.len()
    }

    /// Roles whose characteristic was not found.
    pub fn missing(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| !self.is_bound(*r))
    }
}
