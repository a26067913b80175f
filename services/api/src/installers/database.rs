//! Database, identity, and data-service registration

use std::sync::Arc;

use common::{
    config::Configuration,
    container::ServiceCollection,
    database::{DbContextOptions, LazyPool, TemplateContext},
};

use crate::{
    identity::{RoleManager, SignInManager, UserManager, add_identity},
    jwt::JwtService,
    services::{AuthService, IdentityAuthService, UserCrudService, UserService},
};

use super::Installer;

/// Name of the connection string the database context is bound to
pub const CONNECTION_STRING_NAME: &str = "TemplateAPI";

/// Registers the database context, identity, authentication, and the user
/// CRUD service
pub struct DatabaseInstaller;

impl Installer for DatabaseInstaller {
    fn install_services(&self, services: &mut ServiceCollection, configuration: &Configuration) {
        let pool = Arc::new(LazyPool::new(DbContextOptions::from_configuration(
            configuration,
            CONNECTION_STRING_NAME,
        )));
        services.add_scoped::<TemplateContext, _>(move |_| {
            Ok(Arc::new(TemplateContext::new(Arc::clone(&pool))))
        });

        add_identity(services, |options| {
            options.sign_in.require_confirmed_account = true;
        })
        .add_database_stores();

        // Auth
        services.add_scoped::<dyn AuthService, _>(|scope| {
            let service: Arc<dyn AuthService> = Arc::new(IdentityAuthService::new(
                scope.resolve::<UserManager>()?,
                scope.resolve::<SignInManager>()?,
                scope.resolve::<JwtService>()?,
            ));
            Ok(service)
        });

        // User
        services.add_scoped::<UserCrudService, _>(|scope| {
            let service: Arc<UserCrudService> = Arc::new(UserService::new(
                scope.resolve::<UserManager>()?,
                scope.resolve::<RoleManager>()?,
            ));
            Ok(service)
        });
    }
}
