//! Palisade Server — application entry point.

mod config;

use palisade_core::id::IdGenerator;
use palisade_db::{DbManager, WsClient};
use palisade_db::repository::{
    SurrealCompanyRepository, SurrealPermissionRepository, SurrealRoleRepository,
    SurrealUserRepository,
};
use palisade_service::company::CompanyService;
use palisade_service::permission::PermissionService;
use palisade_service::role::RoleService;
use palisade_service::user::UserService;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Fully wired service layer, ready for a transport to mount.
#[allow(dead_code)]
pub struct AppServices {
    pub companies: CompanyService<SurrealCompanyRepository<WsClient>>,
    pub permissions:
        PermissionService<SurrealPermissionRepository<WsClient>, SurrealCompanyRepository<WsClient>>,
    pub roles: RoleService<
        SurrealRoleRepository<WsClient>,
        SurrealPermissionRepository<WsClient>,
        SurrealCompanyRepository<WsClient>,
    >,
    pub users: UserService<
        SurrealUserRepository<WsClient>,
        SurrealCompanyRepository<WsClient>,
        SurrealRoleRepository<WsClient>,
    >,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("palisade=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Palisade server...");

    let config = AppConfig::from_env();

    let db = match DbManager::initialize(&config.db_config()).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "database initialization failed");
            std::process::exit(1);
        }
    };

    let ids = match IdGenerator::from_env() {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "identifier generator initialization failed");
            std::process::exit(1);
        }
    };

    let client = db.client().clone();
    let service_config = config.service_config();
    let _services = AppServices {
        companies: CompanyService::new(
            SurrealCompanyRepository::new(client.clone()),
            ids.clone(),
            service_config.clone(),
        ),
        permissions: PermissionService::new(
            SurrealPermissionRepository::new(client.clone()),
            SurrealCompanyRepository::new(client.clone()),
            ids.clone(),
            service_config.clone(),
        ),
        roles: RoleService::new(
            SurrealRoleRepository::new(client.clone()),
            SurrealPermissionRepository::new(client.clone()),
            SurrealCompanyRepository::new(client.clone()),
            ids.clone(),
            service_config.clone(),
        ),
        users: UserService::new(
            SurrealUserRepository::new(client.clone()),
            SurrealCompanyRepository::new(client.clone()),
            SurrealRoleRepository::new(client),
            ids,
            service_config,
        ),
    };

    tracing::info!(env = %config.env, "core services ready");

    // TODO: mount the REST transport on top of AppServices
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }

    tracing::info!("Palisade server stopped.");
}
