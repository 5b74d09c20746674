use std::time::Duration;

use axum::Router;
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::cors::CorsLayer;

use naturewatch::auth::{AuthApiState, AuthService, JwtService, auth_api_router};
use naturewatch::config::Config;
use naturewatch::db::{
    DbConfig, RevokedTokenRepository, SightingRepository, UserRepository,
    create_pool_with_migrations,
};
use naturewatch::sightings::{SightingsApiState, sightings_router};

/// How often the revocation sweeper runs
const REVOCATION_SWEEP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load application config from environment variables
    let config = Config::from_env();

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, secret_key={}, bind_addr={}",
        config.has_database(),
        config.has_secret_key(),
        config.bind_addr_or_default()
    );

    let db_config = DbConfig {
        database_url: config.database_url_or_panic().to_string(),
        ..Default::default()
    };

    let pool = create_pool_with_migrations(&db_config)
        .await
        .expect("Failed to connect to database");

    let jwt_service = JwtService::from_env().expect("Failed to load JWT configuration");

    let user_repo = UserRepository::new(pool.clone());
    let revoked_repo = RevokedTokenRepository::new(pool.clone());
    let sighting_repo = SightingRepository::new(pool);

    let auth_service = AuthService::new(user_repo, revoked_repo.clone(), jwt_service);

    // Revoked-token records carry their token's natural expiry; past that
    // point they are dead weight, so sweep them periodically.
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(REVOCATION_SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match revoked_repo.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::info!("Dropped {} expired revocation records", removed)
                }
                Err(e) => tracing::warn!("Revocation cleanup failed: {}", e),
            }
        }
    });

    // Build the application router
    let app = Router::new()
        .merge(auth_api_router(AuthApiState {
            auth_service: auth_service.clone(),
        }))
        .merge(sightings_router(SightingsApiState {
            sighting_repo,
            auth_service,
        }))
        // Compresses responses > 1KB, skips already compressed formats
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Best),
        )
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr_or_default();
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
