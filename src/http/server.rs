//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with product, health and fallback handlers
//! - Put the admission gate ahead of every route except `/health`
//! - Wire up middleware (request id, tracing, timeout, limits, headers)
//! - Apply admission policy reloads while serving
//! - Serve until the shutdown broadcast fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admission::{
    admission_middleware, spawn_eviction_task, AdmissionError, AdmissionGate, AdmissionPolicy,
    AdmissionState,
};
use crate::config::{AdmissionConfig, AppConfig};
use crate::http::{handlers, request};
use crate::product::ProductService;
use crate::security;
use crate::store::Datastore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
}

/// HTTP server for the product API.
pub struct HttpServer {
    router: Router,
    gate: Arc<AdmissionGate>,
}

impl HttpServer {
    /// Create a server over `store`. Fails if the admission policy does not compile.
    pub fn new(config: AppConfig, store: Arc<dyn Datastore>) -> Result<Self, AdmissionError> {
        let gate = Arc::new(AdmissionGate::from_config(&config.admission)?);
        let state = AppState {
            products: Arc::new(ProductService::new(store)),
        };
        let admission = AdmissionState {
            gate: gate.clone(),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state, admission);
        Ok(Self { router, gate })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, admission: AdmissionState) -> Router {
        let app = Router::new()
            .route(
                "/api/products",
                get(handlers::list_products).post(handlers::create_product),
            )
            .route(
                "/api/products/{id}",
                get(handlers::get_product)
                    .put(handlers::update_product)
                    .delete(handlers::delete_product),
            )
            .fallback(handlers::not_found)
            .layer(middleware::from_fn_with_state(admission, admission_middleware))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size));

        security::apply(app, &config.security)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(request::track_metrics))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gate(&self) -> Arc<AdmissionGate> {
        self.gate.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Admission sections arriving on `policy_updates` replace the live policy
    /// when they compile.
    pub async fn run(
        self,
        listener: TcpListener,
        mut policy_updates: mpsc::UnboundedReceiver<AdmissionConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let eviction = spawn_eviction_task(self.gate.clone(), shutdown.resubscribe());

        let gate = self.gate.clone();
        let reloader = tokio::spawn(async move {
            while let Some(admission) = policy_updates.recv().await {
                match AdmissionPolicy::from_config(&admission) {
                    Ok(policy) => gate.reload(policy),
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected admission policy, keeping current one")
                    }
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        reloader.abort();
        let _ = eviction.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
