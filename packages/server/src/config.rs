use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Account created (or promoted) at startup with superuser rights.
#[derive(Debug, Deserialize, Clone)]
pub struct SuperuserConfig {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued access tokens.
    pub token_ttl_hours: i64,
    /// Lifetime of a confirmation code sent at sign-up.
    pub confirmation_code_ttl_minutes: i64,
    #[serde(default)]
    pub superuser: Option<SuperuserConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 168)?
            .set_default("auth.confirmation_code_ttl_minutes", 30)?
            .set_default("mail.from", "noreply@critic.local")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., CRITIC__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("CRITIC").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
