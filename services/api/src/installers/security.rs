//! Token signing registration

use std::sync::Arc;

use common::{
    config::Configuration,
    container::ServiceCollection,
    error::ContainerError,
};

use crate::jwt::JwtService;

use super::Installer;

/// Registers the JWT service built from the `jwt` settings
pub struct SecurityInstaller;

impl Installer for SecurityInstaller {
    fn install_services(&self, services: &mut ServiceCollection, configuration: &Configuration) {
        let settings = configuration.settings().jwt.clone();

        services.add_singleton::<JwtService, _>(move |_| {
            JwtService::new(&settings)
                .map(Arc::new)
                .map_err(|e| ContainerError::construction::<JwtService>(e))
        });
    }
}
