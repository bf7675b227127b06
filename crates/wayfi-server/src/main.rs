//! wayfi provisioning server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use uuid::Uuid;
use wayfi_core::Config;
use wayfi_core::tracing_init::init_tracing;

use wayfi_server::http::{AppState, build_router};
use wayfi_server::notifications::Notifier;
use wayfi_server::provisioning::ProfileConfigResolver;
use wayfi_server::reachability::spawn_sweeper;
use wayfi_server::storage::{NewPasspointProfile, ProvisioningDatabase};

#[derive(Parser, Debug)]
#[command(name = "wayfi-server")]
#[command(version, about = "wayfi provisioning server - Passpoint credentials and device profiles")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a JSON settings file.
    #[arg(long, env = "WAYFI_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, global = true)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Externally reachable base URL used in provisioning links.
    #[arg(long, global = true)]
    public_base_url: Option<String>,

    /// FCM OAuth access token for push delivery.
    #[arg(long, env = "WAYFI_FCM_ACCESS_TOKEN", hide_env_values = true)]
    fcm_access_token: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Store the configured Passpoint defaults as the default + active
    /// deployment profile.
    SeedPasspoint {
        /// Identifier of the new profile.
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = wayfi_core::config::load_config(args.config.as_deref())?;
    apply_cli_overrides(&mut config, &args);

    init_tracing(&config.server.log_level, args.log_json);

    let db_path = match &config.server.database_path {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening provisioning database");
    let db = ProvisioningDatabase::open(&db_path).await?;

    match args.command {
        Some(Command::SeedPasspoint { id }) => seed_passpoint(&db, &config, id).await,
        Some(Command::Serve) | None => serve(db, config, args.fcm_access_token).await,
    }
}

async fn serve(
    db: ProvisioningDatabase,
    config: Config,
    fcm_access_token: Option<String>,
) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        "Starting wayfi-server"
    );

    if config.auth.uses_dev_secret() {
        warn!(
            "Bearer tokens are validated with the built-in development secret; \
             set auth.jwt_secret or WAYFI_JWT_SECRET before exposing this server"
        );
    }

    let resolver = ProfileConfigResolver::new(db.clone(), config.passpoint.clone());
    match resolver.resolve().await {
        Ok(resolved) => info!(
            passpoint_profile_id = %resolved.passpoint_profile_id,
            realm = %resolved.realm,
            "Active Passpoint profile resolved"
        ),
        Err(e) => warn!(
            error = %e,
            "No usable Passpoint profile; provisioning requests will fail until one is added \
             (see `wayfi-server seed-passpoint`)"
        ),
    }

    let notifier = Notifier::from_config(&config.notifications, fcm_access_token)?;

    let _sweeper = spawn_sweeper(
        db.clone(),
        Duration::from_secs(config.provisioning.sweep_interval_secs.max(1)),
        config.provisioning.stale_device_after_secs,
    );

    let app = build_router(AppState::new(db, &config, notifier));
    let listener = tokio::net::TcpListener::bind(config.server.addr).await?;
    info!(addr = %config.server.addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("wayfi-server stopped");
    Ok(())
}

async fn seed_passpoint(
    db: &ProvisioningDatabase,
    config: &Config,
    id: Option<String>,
) -> anyhow::Result<()> {
    let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let defaults = &config.passpoint;
    let ois = defaults.roaming_consortium_ois.join(",");

    db.insert_passpoint_profile(&NewPasspointProfile {
        id: &id,
        friendly_name: Some(&defaults.friendly_name),
        domain: Some(&defaults.domain),
        realm: Some(&defaults.realm),
        eap_method: Some(&defaults.eap_method),
        inner_auth: Some(&defaults.inner_auth),
        roaming_consortium_ois: Some(&ois),
        ssid: Some(&defaults.ssid),
        operator_name: Some(&defaults.operator_name),
        is_default: false,
        is_active: true,
    })
    .await?;
    db.set_default_passpoint(&id).await?;

    info!(passpoint_profile_id = %id, realm = %defaults.realm, "Passpoint profile seeded as default");
    Ok(())
}

fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(path) = &args.db_path {
        config.server.database_path = Some(path.clone());
    }
    if let Some(url) = &args.public_base_url {
        config.server.public_base_url.clone_from(url);
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Cannot determine a data directory"))?;
    Ok(base.join("wayfi").join("provisioning.db"))
}
