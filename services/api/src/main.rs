use anyhow::Result;
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::{config::Configuration, container::ServiceCollection, database::TemplateContext};

mod contracts;
mod error;
mod identity;
mod installers;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod state;

#[cfg(test)]
mod testing;

use crate::{installers::database::CONNECTION_STRING_NAME, state::AppState};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[tokio::main]
async fn main() -> Result<()> {
    let configuration = Configuration::load()?;

    // Initialize logging; RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&configuration.settings().logging.level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting template API");

    let mut services = ServiceCollection::new();
    installers::install_services_in_assembly(&mut services, &configuration);
    let provider = services.build();

    if configuration
        .get_connection_string(CONNECTION_STRING_NAME)
        .is_some()
    {
        let context = provider.create_scope().resolve::<TemplateContext>()?;

        if context.health_check().await? {
            info!("Database connection successful");
        } else {
            anyhow::bail!("Failed to connect to database");
        }

        context.migrate(&MIGRATOR).await?;
        info!("Database migrations applied");
    } else {
        warn!(
            "Connection string '{}' is not configured; database operations will fail",
            CONNECTION_STRING_NAME
        );
    }

    let app = routes::create_router(AppState {
        services: provider,
    });

    let address = configuration.settings().server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Template API listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
