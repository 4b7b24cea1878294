use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL.
    pub database_url: String,

    /// Header secret tenants present alongside `X-API-Key` to prove tenant
    /// ownership out-of-band of the per-tenant secret.
    pub global_tenant_secret: String,

    /// Access token lifetime in seconds.
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds. Defaults a couple seconds past 2h;
    /// see the Open Question decision in DESIGN.md.
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: i64,

    /// Maximum attempts allowed within `rate_limit_window_secs`.
    #[serde(default = "default_rate_limit_max_attempts")]
    pub rate_limit_max_attempts: u32,

    /// Sliding window width, in seconds, for the rate limiter.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// How long an invitation code remains redeemable.
    #[serde(default = "default_invitation_ttl_hours")]
    pub invitation_ttl_hours: i64,

    /// Comma-separated allow-list of SSO redirect origins.
    #[serde(default)]
    pub sso_allowed_origins: String,

    /// Argon2 memory cost, in KiB.
    #[serde(default = "default_password_hash_memory_kib")]
    pub password_hash_memory_kib: u32,

    /// Argon2 iteration count.
    #[serde(default = "default_password_hash_iterations")]
    pub password_hash_iterations: u32,

    /// Argon2 parallelism (lanes).
    #[serde(default = "default_password_hash_parallelism")]
    pub password_hash_parallelism: u32,

    /// Server bind host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_access_token_ttl_secs() -> i64 {
    900
}

fn default_refresh_token_ttl_secs() -> i64 {
    7202
}

fn default_rate_limit_max_attempts() -> u32 {
    10
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_invitation_ttl_hours() -> i64 {
    24
}

fn default_password_hash_memory_kib() -> u32 {
    19_456 // Argon2id OWASP-recommended baseline (19 MiB)
}

fn default_password_hash_iterations() -> u32 {
    2
}

fn default_password_hash_parallelism() -> u32 {
    1
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables, falling back to `.env`
    /// when present.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .set_default("database_url", "")?
            .set_default("global_tenant_secret", "")?
            .set_default("access_token_ttl_secs", default_access_token_ttl_secs())?
            .set_default("refresh_token_ttl_secs", default_refresh_token_ttl_secs())?
            .set_default("rate_limit_max_attempts", default_rate_limit_max_attempts())?
            .set_default("rate_limit_window_secs", default_rate_limit_window_secs() as i64)?
            .set_default("invitation_ttl_hours", default_invitation_ttl_hours())?
            .set_default("sso_allowed_origins", "")?
            .set_default("password_hash_memory_kib", default_password_hash_memory_kib())?
            .set_default("password_hash_iterations", default_password_hash_iterations())?
            .set_default("password_hash_parallelism", default_password_hash_parallelism())?
            .set_default("host", default_host())?
            .set_default("port", default_port() as i64)?
            .add_source(config::Environment::default());

        builder.build()?.try_deserialize::<Config>()
    }

    /// Parses `sso_allowed_origins` into a list of trimmed, non-empty origins.
    pub fn sso_allowed_origins(&self) -> Vec<String> {
        self.sso_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sso_allowed_origins_splits_and_trims() {
        let cfg = Config {
            database_url: String::new(),
            global_tenant_secret: String::new(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 7202,
            rate_limit_max_attempts: 10,
            rate_limit_window_secs: 60,
            invitation_ttl_hours: 24,
            sso_allowed_origins: " https://a.example.com ,https://b.example.com,".to_string(),
            password_hash_memory_kib: 19_456,
            password_hash_iterations: 2,
            password_hash_parallelism: 1,
            host: "0.0.0.0".to_string(),
            port: 3000,
        };

        assert_eq!(
            cfg.sso_allowed_origins(),
            vec!["https://a.example.com".to_string(), "https://b.example.com".to_string()]
        );
    }
}
