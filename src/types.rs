pub use crate::utils::database;

use crate::utils::database::DatabaseConnection;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub name: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub api_endpoint: String,
    pub secret_key: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Clone)]
pub struct IdentityConfig {
    pub certs_endpoint: String,
    pub project_id: String,
}

#[derive(Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub payment: PaymentConfig,
    pub identity: IdentityConfig,
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
}

#[derive(Clone)]
pub struct PaymentContext {
    pub api_endpoint: String,
    pub secret_key: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A single RSA public key published by the identity provider, keyed by `kid`.
#[derive(Clone, Deserialize)]
pub struct IdentityKey {
    pub kid: String,
    pub n: String,
    pub e: String,
}

#[derive(Deserialize)]
pub struct IdentityKeySet {
    pub keys: Vec<IdentityKey>,
}

pub struct CachedIdentityKeys {
    pub keys: HashMap<String, IdentityKey>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct IdentityContext {
    pub certs_endpoint: String,
    pub project_id: String,
    pub keys: Arc<Mutex<Option<CachedIdentityKeys>>>,
}

pub struct Context {
    pub app: AppContext,
    pub db_conn: DatabaseConnection,
    pub payment: PaymentContext,
    pub identity: IdentityContext,
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        let db_conn = database::connect(&self.database.url, &self.database.name).await;
        database::migrate(db_conn.clone()).await;

        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
            },
            db_conn,
            payment: PaymentContext {
                api_endpoint: self.payment.api_endpoint,
                secret_key: self.payment.secret_key,
                success_url: self.payment.success_url,
                cancel_url: self.payment.cancel_url,
            },
            identity: IdentityContext {
                certs_endpoint: self.identity.certs_endpoint,
                project_id: self.identity.project_id,
                keys: Arc::new(Mutex::new(None)),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let database_url = env::var("MONGODB_URI").expect("MONGODB_URI not set");
        let database_name =
            env::var("DATABASE_NAME").unwrap_or_else(|_| "chef_bazaar".to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u32>()
            .expect("Invalid PORT number");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let payment_api_endpoint = env::var("STRIPE_API_ENDPOINT")
            .unwrap_or_else(|_| "https://api.stripe.com".to_string());
        let payment_secret_key = env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY not set");
        let payment_success_url =
            env::var("CHECKOUT_SUCCESS_URL").expect("CHECKOUT_SUCCESS_URL not set");
        let payment_cancel_url =
            env::var("CHECKOUT_CANCEL_URL").expect("CHECKOUT_CANCEL_URL not set");
        let identity_certs_endpoint = env::var("IDENTITY_CERTS_ENDPOINT").unwrap_or_else(|_| {
            "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
                .to_string()
        });
        let identity_project_id =
            env::var("IDENTITY_PROJECT_ID").expect("IDENTITY_PROJECT_ID not set");

        Self {
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
            },
            database: DatabaseConfig {
                url: database_url,
                name: database_name,
            },
            payment: PaymentConfig {
                api_endpoint: payment_api_endpoint,
                secret_key: payment_secret_key,
                success_url: payment_success_url,
                cancel_url: payment_cancel_url,
            },
            identity: IdentityConfig {
                certs_endpoint: identity_certs_endpoint,
                project_id: identity_project_id,
            },
        }
    }
}
