//! Fieldline API Server
//!
//! Operations backend for a consignment delivery business: warehouse stock,
//! delivery-agent assignments, OTP-verified deliveries, Moniepoint payment
//! confirmation, fraud review and quarterly scorecards behind one
//! role-aware API. Uses hexagonal (ports & adapters) architecture for clean
//! separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{
    LogOtpNotifier, MemoryAgentRepository, MemoryDeliveryRepository, MemoryFraudFlagRepository,
    MemoryPaymentRepository, MemoryReturnRepository, MemoryStockRepository, MemoryUserRepository,
    SandboxGateway,
};
use app::ops_config::{SENSITIVE_ROUTE_BURST, SENSITIVE_ROUTE_PER_SECOND};
use app::{
    hash_token, ApprovalService, DeliveryService, FraudService, InventoryService, OverviewService,
    PaymentService, ScorecardService, UserService,
};
use config::Config;
use domain::entities::{NewUser, Role};
use domain::ports::UserRepository;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<MemoryUserRepository, MemoryAgentRepository>>,
    pub delivery_service: Arc<
        DeliveryService<
            MemoryDeliveryRepository,
            MemoryAgentRepository,
            MemoryStockRepository,
            MemoryPaymentRepository,
            MemoryFraudFlagRepository,
            LogOtpNotifier,
        >,
    >,
    pub approval_service: Arc<
        ApprovalService<
            MemoryDeliveryRepository,
            MemoryPaymentRepository,
            MemoryFraudFlagRepository,
            MemoryStockRepository,
            MemoryAgentRepository,
        >,
    >,
    pub payment_service: Arc<
        PaymentService<
            MemoryPaymentRepository,
            MemoryDeliveryRepository,
            MemoryFraudFlagRepository,
            MemoryAgentRepository,
            SandboxGateway,
        >,
    >,
    pub inventory_service: Arc<
        InventoryService<
            MemoryStockRepository,
            MemoryAgentRepository,
            MemoryReturnRepository,
            MemoryFraudFlagRepository,
        >,
    >,
    pub fraud_service: Arc<
        FraudService<MemoryFraudFlagRepository, MemoryAgentRepository, MemoryDeliveryRepository>,
    >,
    pub scorecard_service: Arc<
        ScorecardService<
            MemoryDeliveryRepository,
            MemoryPaymentRepository,
            MemoryFraudFlagRepository,
            MemoryAgentRepository,
        >,
    >,
    pub overview_service: Arc<
        OverviewService<
            MemoryDeliveryRepository,
            MemoryPaymentRepository,
            MemoryFraudFlagRepository,
            MemoryStockRepository,
            MemoryAgentRepository,
            MemoryReturnRepository,
        >,
    >,
    pub user_repo: Arc<MemoryUserRepository>,
    pub agent_repo: Arc<MemoryAgentRepository>,
    pub stock_repo: Arc<MemoryStockRepository>,
    pub delivery_repo: Arc<MemoryDeliveryRepository>,
    pub payment_repo: Arc<MemoryPaymentRepository>,
    pub flag_repo: Arc<MemoryFraudFlagRepository>,
    pub return_repo: Arc<MemoryReturnRepository>,
    pub config: Config,
}

impl AppState {
    /// Wire fresh in-memory adapters into the full service stack
    pub fn build(config: Config) -> Self {
        let user_repo = Arc::new(MemoryUserRepository::new());
        let agent_repo = Arc::new(MemoryAgentRepository::new());
        let stock_repo = Arc::new(MemoryStockRepository::new());
        let delivery_repo = Arc::new(MemoryDeliveryRepository::new());
        let payment_repo = Arc::new(MemoryPaymentRepository::new());
        let flag_repo = Arc::new(MemoryFraudFlagRepository::new());
        let return_repo = Arc::new(MemoryReturnRepository::new());
        let gateway = Arc::new(SandboxGateway::new());
        let notifier = Arc::new(LogOtpNotifier);

        let user_service = Arc::new(UserService::new(user_repo.clone(), agent_repo.clone()));
        let delivery_service = Arc::new(DeliveryService::new(
            delivery_repo.clone(),
            agent_repo.clone(),
            stock_repo.clone(),
            payment_repo.clone(),
            flag_repo.clone(),
            notifier,
        ));
        let approval_service = Arc::new(ApprovalService::new(
            delivery_repo.clone(),
            payment_repo.clone(),
            flag_repo.clone(),
            stock_repo.clone(),
            agent_repo.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            payment_repo.clone(),
            delivery_repo.clone(),
            flag_repo.clone(),
            agent_repo.clone(),
            gateway,
        ));
        let inventory_service = Arc::new(InventoryService::new(
            stock_repo.clone(),
            agent_repo.clone(),
            return_repo.clone(),
            flag_repo.clone(),
        ));
        let fraud_service = Arc::new(FraudService::new(
            flag_repo.clone(),
            agent_repo.clone(),
            delivery_repo.clone(),
        ));
        let scorecard_service = Arc::new(ScorecardService::new(
            delivery_repo.clone(),
            payment_repo.clone(),
            flag_repo.clone(),
            agent_repo.clone(),
        ));
        let overview_service = Arc::new(OverviewService::new(
            delivery_repo.clone(),
            payment_repo.clone(),
            flag_repo.clone(),
            stock_repo.clone(),
            agent_repo.clone(),
            return_repo.clone(),
        ));

        Self {
            user_service,
            delivery_service,
            approval_service,
            payment_service,
            inventory_service,
            fraud_service,
            scorecard_service,
            overview_service,
            user_repo,
            agent_repo,
            stock_repo,
            delivery_repo,
            payment_repo,
            flag_repo,
            return_repo,
            config,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Assemble the route tree: open health check, then the `/api` surface
/// behind bearer-token auth, with the OTP and payment-initiation routes
/// additionally rate limited per client IP.
fn build_router(state: AppState) -> Router {
    // Rate limiting config: 2 req/sec sustained, burst of 5
    // Uses PeerIpKeyExtractor to get client IP from socket connection
    // (SmartIpKeyExtractor requires X-Forwarded-For headers from reverse proxy)
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(SENSITIVE_ROUTE_PER_SECOND)
            .burst_size(SENSITIVE_ROUTE_BURST)
            .finish()
            .expect("Failed to build governor config"),
    );

    // OTP codes and payment references are guessable inputs
    let sensitive_routes = Router::new()
        .route("/deliveries/:id/otp", post(handlers::submit_otp))
        .route(
            "/payments/moniepoint/initiate",
            post(handlers::initiate_payment),
        )
        .layer(GovernorLayer {
            config: governor_config,
        });

    let api_routes = Router::new()
        // Accounts
        .route("/users", post(handlers::create_user))
        .route("/users/me", get(handlers::me))
        // DA roster
        .route("/das", get(handlers::list_das).post(handlers::register_da))
        .route("/das/:id", get(handlers::get_da))
        // Warehouse and consignment stock
        .route("/product-stocks", get(handlers::list_stock))
        .route(
            "/product-stocks/restock-suggestions",
            get(handlers::restock_suggestions),
        )
        .route("/product-stocks/:sku", get(handlers::get_stock))
        .route("/inventory/assignments", post(handlers::assign_stock))
        // Returns from the field
        .route("/inventory/returns-from-da", post(handlers::submit_return))
        .route("/inventory/returns", get(handlers::list_returns))
        .route("/inventory/returns/:id", get(handlers::get_return))
        .route(
            "/inventory/returns/:id/inspect",
            post(handlers::inspect_return),
        )
        // Delivery lifecycle
        .route(
            "/deliveries",
            get(handlers::list_deliveries).post(handlers::create_delivery),
        )
        .route("/deliveries/sla-board", get(handlers::sla_board))
        .route("/deliveries/:id", get(handlers::get_delivery))
        .route("/deliveries/:id/dispatch", post(handlers::dispatch_delivery))
        .route("/deliveries/:id/otp/reissue", post(handlers::reissue_otp))
        .route("/deliveries/:id/photo", post(handlers::attach_photo))
        .route("/deliveries/:id/approve", post(handlers::approve_delivery))
        .route("/deliveries/:id/reject", post(handlers::reject_delivery))
        .route("/deliveries/:id/fail", post(handlers::fail_delivery))
        .route("/deliveries/:id/cancel", post(handlers::cancel_delivery))
        // Payments
        .route("/payments", get(handlers::list_payments))
        .route("/payments/:id", get(handlers::get_payment))
        .route("/payments/:id/confirm", post(handlers::confirm_payment))
        // Fraud review
        .route(
            "/fraud-flags",
            get(handlers::list_flags).post(handlers::raise_flag),
        )
        .route("/fraud-flags/:id", get(handlers::get_flag))
        .route("/fraud-flags/:id/review", post(handlers::review_flag))
        // Quarterly scorecards
        .route("/scorecards/das", get(handlers::leaderboard))
        .route("/scorecards/das/:id", get(handlers::da_scorecard))
        .route("/scorecards/company", get(handlers::company_scorecard))
        // Role-aware home screen
        .route("/overview", get(handlers::get_overview))
        // Merge rate-limited routes
        .merge(sensitive_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        .nest("/api", api_routes)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fieldline_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fieldline API...");

    // Load configuration
    let config = Config::from_env();

    let state = AppState::build(config.clone());

    if config.demo_seed {
        adapters::seed::seed_demo(
            state.user_repo.as_ref(),
            state.agent_repo.as_ref(),
            state.stock_repo.as_ref(),
            state.delivery_repo.as_ref(),
            state.payment_repo.as_ref(),
            state.flag_repo.as_ref(),
            state.return_repo.as_ref(),
        )
        .await
        .expect("Failed to seed demo data");
    }

    // A fixed admin token lets an operator script the first real accounts
    if let Some(token) = &config.bootstrap_admin_token {
        let admin = NewUser {
            name: "Bootstrap Admin".to_string(),
            phone: None,
            role: Role::Admin,
            da_id: None,
            token_hash: hash_token(token),
        };
        state
            .user_repo
            .create(&admin)
            .await
            .expect("Failed to create bootstrap admin");
        tracing::info!("Bootstrap admin account ready");
    }

    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
