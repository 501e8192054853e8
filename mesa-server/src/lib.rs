//! Mesa Server - campus canteen ordering backend
//!
//! # Module structure
//!
//! ```text
//! mesa-server/src/
//! ├── core/          # Config, state, server
//! ├── auth/          # JWT identity, extractor
//! ├── db/            # SQLite pool, row models, repositories
//! ├── orders/        # Checkout ingress, status engine, orphan sweep
//! ├── realtime/      # Change feed and scoped refresh bridge
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod realtime;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{AppState, Config, Server};
pub use orders::{OrderIngress, OrderStore, SqliteOrderStore, StatusEngine};
pub use realtime::{ChangeFeed, RealtimeBridge, Scope, Subscription};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   __  ___
  /  |/  /__  _________ _
 / /|_/ / _ \/ ___/ __ `/
/ /  / /  __(__  ) /_/ /
/_/  /_/\___/____/\__,_/
    "#
    );
}
