use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use super::InfraError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Run embedded migrations on startup.
    pub run_migrations: bool,
    /// HS256 secret Supabase Auth signs access tokens with.
    pub supabase_jwt_secret: SecretString,
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    /// Price id of the pro plan subscription.
    pub stripe_pro_price_id: String,
    /// Dashboard origin; checkout and portal redirects land here.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    /// Request body limit, sized for CSV uploads.
    pub max_upload_bytes: usize,
    pub rate_limit_window_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let database_url: String = get_env("DATABASE_URL");
        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);
        let run_migrations: bool = get_env_default("RUN_MIGRATIONS", true);

        let supabase_jwt_secret =
            SecretString::new(get_env::<String>("SUPABASE_JWT_SECRET").into());
        let stripe_secret_key = SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_webhook_secret =
            SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into());
        let stripe_pro_price_id: String = get_env("STRIPE_PRO_PRICE_ID");

        let app_origin: Url = get_env_default(
            "APP_ORIGIN",
            Url::parse("http://localhost:3000").map_err(|_| InfraError::ConfigInvalid {
                var: "APP_ORIGIN",
            })?,
        );
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "CORS_ORIGIN" })?;

        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        let max_upload_bytes: usize = get_env_default("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);

        Ok(Self {
            database_url,
            db_max_connections,
            run_migrations,
            supabase_jwt_secret,
            stripe_secret_key,
            stripe_webhook_secret,
            stripe_pro_price_id,
            app_origin,
            cors_origin,
            bind_addr,
            max_upload_bytes,
            rate_limit_window_secs,
        })
    }
}
