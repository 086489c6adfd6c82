use crate::error::ConfigError as SettingsError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// "dev" enables the destructive admin reset endpoint
    #[serde(default)]
    pub platform: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Run against the in-process store instead of Postgres
    #[serde(default)]
    pub in_memory: bool,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    /// Server-level connection, used to create throwaway test databases
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token signing and credential settings.
///
/// Loaded once at startup and handed to the session coordinator; nothing
/// mutates it afterwards.
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64, // seconds
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64, // seconds
    /// Shared key the payment provider presents on webhooks
    pub polka_key: String,
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
}

impl AuthSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(SettingsError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(SettingsError::InvalidValue(
                "token expiry must be positive".to_string(),
            ));
        }
        // bcrypt accepts costs 4..=31
        if !(4..=31).contains(&self.password_hash_cost) {
            return Err(SettingsError::InvalidValue(format!(
                "auth.password_hash_cost {} out of range 4..=31",
                self.password_hash_cost
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_issuer() -> String {
    "chirpy".to_string()
}

fn default_access_token_expiry() -> i64 {
    60 * 60
}

fn default_refresh_token_expiry() -> i64 {
    60 * 24 * 60 * 60
}

fn default_password_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Load settings from `configuration.yaml` (optional) overlaid with
/// `APP__SECTION__KEY` environment variables.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
