use config::{
    builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, FileFormat,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API with credentials. Empty disables CORS.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Server {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub max_connections: u32,
    /// Full connection string; wins over the individual fields when set.
    #[serde(default)]
    pub url: Option<String>,
}

impl Database {
    pub fn url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.database
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// Send the session cookie only over HTTPS.
    pub secure: bool,
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub session: Session,
}

impl Settings {
    /// Defaults, then `config.toml` if present, then `ROOMUS__SECTION__KEY`
    /// environment variables. `DATABASE_URL` overrides the database URL.
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let builder = defaults()?
            .add_source(
                File::with_name("config.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("ROOMUS")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?;

        Self::from_builder(builder)
    }

    pub(crate) fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.cors_origins", Vec::<String>::new())?
        .set_default("database.user", "roomus")?
        .set_default("database.password", "password")?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432)?
        .set_default("database.database", "roomus")?
        .set_default("database.max_connections", 5)?
        .set_default("session.secure", false)?
        .set_default("session.expiry_days", 7)
}
