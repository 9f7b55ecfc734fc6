use std::env;

/// Runtime settings, read once at startup from the environment (a `.env`
/// file is honored). Everything except the MongoDB URI has a default.
#[derive(Clone, Debug)]
pub struct Settings {
    pub mongodb_uri: String,
    pub database_name: String,
    pub bind_address: String,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
}

const DEFAULT_SECRET_KEY: &str = "your-secret-key-change-in-production";

impl Settings {
    pub fn from_env() -> Settings {
        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| {
            tracing::warn!("SECRET_KEY not set, using the insecure default");
            DEFAULT_SECRET_KEY.to_string()
        });
        Settings {
            mongodb_uri: env::var("MONGODB_URI")
                .expect("You need to add the MONGODB_URI to the env"),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "splitledger".to_string()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            secret_key,
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|minutes| minutes.parse().ok())
                .unwrap_or(30),
        }
    }
}
