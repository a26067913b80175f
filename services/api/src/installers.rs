//! Installers wire cohesive groups of services into the container at startup

use common::{config::Configuration, container::ServiceCollection};
use tracing::info;

pub mod database;
pub mod security;

pub use database::DatabaseInstaller;
pub use security::SecurityInstaller;

/// Registers one group of services.
///
/// Installers only record factories; nothing is constructed or connected
/// until a service is first resolved.
pub trait Installer {
    fn install_services(&self, services: &mut ServiceCollection, configuration: &Configuration);
}

/// Every installer the service is built from, in registration order
pub fn installers() -> Vec<Box<dyn Installer>> {
    vec![Box::new(SecurityInstaller), Box::new(DatabaseInstaller)]
}

/// Run every installer against `services`
pub fn install_services_in_assembly(
    services: &mut ServiceCollection,
    configuration: &Configuration,
) {
    let installers = installers();
    for installer in &installers {
        installer.install_services(services, configuration);
    }
    info!(
        "Ran {} installer(s), {} service(s) registered",
        installers.len(),
        services.len()
    );
}
