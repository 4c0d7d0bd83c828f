//! HTTP Server configuration and startup.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use inventory_types::{ExternalRateSource, InventoryRepository, RateHistoryRepository};

use super::handlers::{self, AppState};
use crate::{InventoryService, RateService};

/// HTTP Server for the inventory API.
pub struct HttpServer<S, R>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    state: Arc<AppState<S, R>>,
}

impl<S, R> HttpServer<S, R>
where
    S: ExternalRateSource,
    R: InventoryRepository + RateHistoryRepository,
{
    /// Creates a new HTTP server over the two application services.
    pub fn new(rates: Arc<RateService<S, R>>, inventory: InventoryService<R>) -> Self {
        Self {
            state: Arc::new(AppState { rates, inventory }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            // Exchange rate
            .route("/api/rates/current", get(handlers::current_rate::<S, R>))
            .route("/api/rates/refresh", post(handlers::refresh_rate::<S, R>))
            .route("/api/rates/manual", post(handlers::set_manual_rate::<S, R>))
            .route("/api/rates/history", get(handlers::rate_history::<S, R>))
            .route("/api/rates/convert", post(handlers::convert::<S, R>))
            // Catalog
            .route(
                "/api/categories",
                post(handlers::create_category::<S, R>).get(handlers::list_categories::<S, R>),
            )
            .route(
                "/api/categories/{id}",
                patch(handlers::update_category::<S, R>).delete(handlers::delete_category::<S, R>),
            )
            .route(
                "/api/suppliers",
                post(handlers::create_supplier::<S, R>).get(handlers::list_suppliers::<S, R>),
            )
            .route(
                "/api/suppliers/{id}",
                get(handlers::get_supplier::<S, R>)
                    .patch(handlers::update_supplier::<S, R>)
                    .delete(handlers::deactivate_supplier::<S, R>),
            )
            // Customers
            .route(
                "/api/customers",
                post(handlers::create_customer::<S, R>).get(handlers::list_customers::<S, R>),
            )
            .route(
                "/api/customers/{id}",
                get(handlers::get_customer::<S, R>)
                    .patch(handlers::update_customer::<S, R>)
                    .delete(handlers::deactivate_customer::<S, R>),
            )
            // Products
            .route(
                "/api/products",
                post(handlers::create_product::<S, R>).get(handlers::list_products::<S, R>),
            )
            .route(
                "/api/products/low-stock",
                get(handlers::low_stock_products::<S, R>),
            )
            .route("/api/products/export", get(handlers::export_products::<S, R>))
            .route(
                "/api/products/{id}",
                get(handlers::get_product::<S, R>)
                    .patch(handlers::update_product::<S, R>)
                    .delete(handlers::deactivate_product::<S, R>),
            )
            .route(
                "/api/products/{id}/stock",
                post(handlers::adjust_stock::<S, R>),
            )
            .route(
                "/api/stock-movements",
                get(handlers::list_stock_movements::<S, R>),
            )
            // Sales
            .route("/api/sales/quote", post(handlers::quote_sale::<S, R>))
            .route(
                "/api/sales",
                post(handlers::create_sale::<S, R>).get(handlers::list_sales::<S, R>),
            )
            .route("/api/sales/{id}", get(handlers::get_sale::<S, R>))
            .route("/api/sales/{id}/cancel", post(handlers::cancel_sale::<S, R>))
            // Purchase orders
            .route(
                "/api/orders",
                post(handlers::create_order::<S, R>).get(handlers::list_orders::<S, R>),
            )
            .route("/api/orders/{id}", get(handlers::get_order::<S, R>))
            .route(
                "/api/orders/{id}/status",
                post(handlers::update_order_status::<S, R>),
            )
            // Reports
            .route(
                "/api/reports/summary",
                get(handlers::inventory_summary::<S, R>),
            )
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server until `shutdown` resolves, then drains in-flight
    /// requests.
    pub async fn run(
        self,
        addr: &str,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
