pub mod auth {
    /// Seconds before `expires_at` at which a token is treated as stale.
    pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;
    pub const TOKEN_PATH: &str = "/tokens";
    pub const TOKEN_SUCCESS_STATUSES: &[u16] = &[200, 201];
    pub const EXPIRY_FIELDS: &[&str] = &["expired_at", "expires_at"];
}

pub mod http {
    pub const SUCCESS_STATUSES: &[u16] = &[200, 201, 204];
    pub const ACCEPT_JSON: &str = "application/json";
    pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
    pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];
}

pub mod environments {
    pub const STAGING: &str = "staging";
    pub const PRODUCTION: &str = "production";
    pub const DEFAULT: &str = PRODUCTION;
    pub const STAGING_BASE_URL: &str =
        "https://testreproductiveamerica.api-staging.nableivf.com/api/v1";
    pub const PRODUCTION_BASE_URL: &str = "https://reproductiveamerica.api.nableivf.com/api/v1";
}

pub mod env_vars {
    pub const ENVIRONMENT: &str = "NABLE_ENV";
    pub const PREFIX: &str = "NABLE";
    pub const BASE_URL: &str = "BASE_URL";
    pub const USERNAME: &str = "USERNAME";
    pub const PASSWORD: &str = "PASSWORD";
}

pub mod server {
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
    pub const SERVER_NAME: &str = "nable-api";
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}
