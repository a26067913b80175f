//! Common library for the Template API
//!
//! This crate provides the pieces every service binary is wired from:
//! layered configuration, the service container installers register into,
//! the lazily-connected database context, and the shared error types.

pub mod config;
pub mod container;
pub mod database;
pub mod error;

/// The startup sequence these modules are designed for
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use common::config::Configuration;
/// use common::container::ServiceCollection;
/// use common::database::{DbContextOptions, LazyPool, TemplateContext};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let configuration = Configuration::load()?;
///     let pool = Arc::new(LazyPool::new(DbContextOptions::from_configuration(
///         &configuration,
///         "TemplateAPI",
///     )));
///
///     let mut services = ServiceCollection::new();
///     services.add_scoped::<TemplateContext, _>(move |_| {
///         Ok(Arc::new(TemplateContext::new(Arc::clone(&pool))))
///     });
///
///     let scope = services.build().create_scope();
///     let context = scope.resolve::<TemplateContext>()?;
///     println!("Database health check: {}", context.health_check().await?);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
