/// Blog Service Library
///
/// A multi-user blog: authenticated users publish posts, browse by category,
/// comment on posts and manage their own content.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers for feeds, posts and comments
/// - `models`: Rows and joined read models
/// - `services`: Visibility rules, feeds and ownership-checked mutations
/// - `db`: Repository traits with PostgreSQL and in-memory stores
/// - `forms`: Validate-then-save form input
/// - `pagination`: Page-number pagination with clamping
/// - `middleware`: Session identity, CSRF and request metrics
/// - `render`: HTML pages
/// - `routes`: Route table and path builders
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod render;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use db::BlogStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub config: Arc<Config>,
    /// Present when running on PostgreSQL; used for pool gauges.
    pub pool: Option<sqlx::PgPool>,
}

impl AppState {
    pub fn new(store: Arc<dyn BlogStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
