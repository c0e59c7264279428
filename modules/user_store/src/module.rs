use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use tracing::{debug, info};

use crate::api::rest::{request_id, routes};
use crate::config::{StorageBackend, UserStoreConfig};
use crate::contract::client::UserStoreApi;
use crate::domain::repo::UsersRepository;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::UserStoreLocalClient;
use crate::infra::storage::{InMemoryUsersRepository, SeaOrmUsersRepository};

const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// 408 after `secs` seconds; 0 disables the timeout.
fn request_timeout(secs: u64) -> Option<TimeoutLayer> {
    (secs > 0).then(|| {
        TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(secs))
    })
}

/// The wired user store: repository, domain service and HTTP surface.
#[derive(Clone)]
pub struct UserStore {
    service: Arc<Service>,
    config: UserStoreConfig,
}

impl UserStore {
    pub async fn init(cfg: UserStoreConfig) -> anyhow::Result<Self> {
        info!("Initializing user_store module");
        debug!(
            "Loaded user_store config: backend={:?}, default_page_size={}, max_page_size={}",
            cfg.backend, cfg.default_page_size, cfg.max_page_size
        );

        if cfg.max_page_size == 0 {
            anyhow::bail!("user_store.max_page_size must be greater than 0");
        }

        // Wire repository (infra) to domain service (port)
        let repo: Arc<dyn UsersRepository> = match cfg.backend {
            StorageBackend::Memory => Arc::new(InMemoryUsersRepository::new()),
            StorageBackend::Sqlite => {
                Arc::new(SeaOrmUsersRepository::connect(&cfg.database_url).await?)
            }
        };
        let service_config = ServiceConfig {
            default_page_size: cfg.default_page_size,
            max_page_size: cfg.max_page_size,
        };
        let service = Arc::new(Service::new(repo, service_config));

        if cfg.seed_sample_users {
            service
                .seed_sample_users()
                .await
                .map_err(|e| anyhow::anyhow!("failed to seed sample users: {e}"))?;
        }

        info!(backend = ?cfg.backend, "user_store initialized");
        Ok(Self {
            service,
            config: cfg,
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// Local in-process client for other crates.
    pub fn client(&self) -> Arc<dyn UserStoreApi> {
        Arc::new(UserStoreLocalClient::new(self.service.clone()))
    }

    /// Tool routes wrapped in the HTTP middleware stack.
    pub fn router(&self) -> Router {
        let mut router = routes::register_routes(Router::new(), self.service.clone());

        // Layers wrap what is already there, so the last one added runs first:
        // SetRequestId -> PropagateRequestId -> Trace -> Timeout -> CORS -> BodyLimit
        router = router.layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        if let Some(timeout) = request_timeout(self.config.request_timeout_sec) {
            router = router.layer(timeout);
        }

        // Trace with request_id/status/latency
        router = router.layer(request_id::create_trace_layer());

        // Echo x-request-id back on the response
        router = router.layer(PropagateRequestIdLayer::new(request_id::header()));

        // Generate x-request-id when missing
        router = router.layer(SetRequestIdLayer::new(
            request_id::header(),
            request_id::MakeReqId,
        ));

        router
    }
}
