use std::sync::Arc;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::orders::{self, SqliteOrderStore};
use crate::realtime::{ChangeFeed, RealtimeBridge};

/// Shared application state
///
/// Built once at startup and handed to every component that needs it; there
/// is no module-level storage client. Cloning is shallow (pools, channels
/// and `Arc`s).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Config,
    /// SQLite connection pool
    pub db: SqlitePool,
    /// Change feed shared by the order store and the realtime bridge
    pub changes: ChangeFeed,
    /// Order storage (header/line/status writes publish on `changes`)
    pub orders: SqliteOrderStore,
    /// Scoped refresh subscriptions for customer and operator views
    pub bridge: RealtimeBridge,
    /// JWT identity service
    pub jwt_service: Arc<JwtService>,
    /// Cancels background workers on shutdown
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Initialize state: working directory, database, services
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir()?;

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?;

        let changes = ChangeFeed::new(1024);
        let orders = SqliteOrderStore::new(db.pool.clone(), changes.clone());
        let bridge = RealtimeBridge::new(changes.clone());
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self {
            config: config.clone(),
            db: db.pool,
            changes,
            orders,
            bridge,
            jwt_service,
            shutdown: CancellationToken::new(),
        })
    }

    /// Start background workers; call before `Server::run`
    pub fn start_background_tasks(&self) {
        orders::reconcile::spawn(
            self.orders.clone(),
            std::time::Duration::from_secs(self.config.reconcile_interval_secs),
            std::time::Duration::from_secs(self.config.orphan_grace_secs),
            self.shutdown.clone(),
        );
    }

    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
