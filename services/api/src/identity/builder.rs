//! Container registration for the identity subsystem

use std::sync::Arc;

use common::{container::ServiceCollection, database::TemplateContext};

use crate::repositories::{PgRoleStore, PgUserStore};

use super::{IdentityOptions, RoleManager, RoleStore, SignInManager, UserManager, UserStore};

/// Register the identity managers, configured by `configure`.
///
/// Stores must be added separately, e.g. with
/// [`IdentityBuilder::add_database_stores`].
pub fn add_identity<F>(services: &mut ServiceCollection, configure: F) -> IdentityBuilder<'_>
where
    F: FnOnce(&mut IdentityOptions),
{
    let mut options = IdentityOptions::default();
    configure(&mut options);

    services
        .add_instance(Arc::new(options))
        .add_scoped::<RoleManager, _>(|scope| {
            Ok(Arc::new(RoleManager::new(scope.resolve::<dyn RoleStore>()?)))
        })
        .add_scoped::<UserManager, _>(|scope| {
            Ok(Arc::new(UserManager::new(
                scope.resolve::<dyn UserStore>()?,
                scope.resolve::<RoleManager>()?,
                scope.resolve::<IdentityOptions>()?,
            )))
        })
        .add_scoped::<SignInManager, _>(|scope| {
            Ok(Arc::new(SignInManager::new(scope.resolve::<UserManager>()?)))
        });

    IdentityBuilder { services }
}

/// Follow-up registration for an identity subsystem
pub struct IdentityBuilder<'a> {
    services: &'a mut ServiceCollection,
}

impl IdentityBuilder<'_> {
    /// Persist users and roles through the scope's [`TemplateContext`]
    pub fn add_database_stores(self) -> Self {
        self.services
            .add_scoped::<dyn UserStore, _>(|scope| {
                let store: Arc<dyn UserStore> =
                    Arc::new(PgUserStore::new(scope.resolve::<TemplateContext>()?));
                Ok(store)
            })
            .add_scoped::<dyn RoleStore, _>(|scope| {
                let store: Arc<dyn RoleStore> =
                    Arc::new(PgRoleStore::new(scope.resolve::<TemplateContext>()?));
                Ok(store)
            });

        self
    }
}
