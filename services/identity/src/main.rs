use std::sync::Arc;

use anyhow::Result;
use common::{cache::RedisPool, database, telemetry};
use tokio::net::TcpListener;
use tracing::{info, warn};

mod error;
mod extract;
mod jwt;
mod middleware;
mod models;
mod oauth;
mod password;
mod repositories;
mod routes;
mod service;
mod settings;
mod state;
mod validation;

use crate::{
    jwt::JwtService,
    oauth::OAuthClient,
    repositories::{TokenRepository, UserRepository},
    settings::Settings,
    state::{AppState, GoogleLogin},
};

const DEFAULT_LOG_FILTER: &str = "identity=debug,common=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    telemetry::init(DEFAULT_LOG_FILTER, telemetry::LogFormat::from_env());

    info!("Starting identity service");
    let settings = Settings::load()?;

    let pool = database::init_pool(&settings.database_config()).await?;
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    database::run_migrations(&pool, &sqlx::migrate!("./migrations")).await?;

    let jwt_service = JwtService::new(settings.jwt_config()?)?;
    let google = google_login(&settings).await?;

    let app_state = AppState::new(
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(TokenRepository::new(pool)),
        jwt_service,
        google,
    );

    let app = routes::create_router(app_state).layer(routes::cors_layer(&settings.cors_allow_origin)?);

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!(%address, "Identity service listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Google sign-in is only wired up when its credentials are configured
async fn google_login(settings: &Settings) -> Result<Option<GoogleLogin>> {
    let Some(google_config) = settings.google_oauth() else {
        info!("Google OAuth not configured; OAuth endpoints disabled");
        return Ok(None);
    };

    let redis = RedisPool::new(&settings.redis_config())?;
    match redis.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        _ => warn!("Redis is unreachable; Google sign-in will fail until it is up"),
    }

    Ok(Some(GoogleLogin {
        client: OAuthClient::google(&google_config)?,
        redis,
        success_redirect: settings.oauth_success_redirect.clone(),
    }))
}
