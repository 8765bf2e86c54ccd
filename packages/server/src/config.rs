use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
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

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

/// Razorpay credentials and endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub key_id: String,
    /// Secret for order API auth and client-side signature verification.
    pub key_secret: String,
    /// Secret for webhook body signatures. Distinct from `key_secret`.
    pub webhook_secret: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the local media store.
    pub media_root: String,
    /// Base URL media objects are served from.
    pub public_base_url: String,
}

/// Blockchain anchoring middleware. Anchoring is disabled when `base_url`
/// is unset.
#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_images_milestone: u32,
    pub max_images_property: u32,
    pub max_videos: u32,
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub chain: ChainConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", vec!["*".to_string()])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_days", 7)?
            .set_default("gateway.base_url", "https://api.razorpay.com/v1")?
            .set_default("gateway.timeout_secs", 30)?
            .set_default("storage.media_root", "./media")?
            .set_default("storage.public_base_url", "http://127.0.0.1:3000/media")?
            .set_default("chain.timeout_secs", 10)?
            .set_default("upload.max_images_milestone", 10)?
            .set_default("upload.max_images_property", 15)?
            .set_default("upload.max_videos", 5)?
            .set_default("upload.max_image_bytes", 10 * 1024 * 1024)?
            .set_default("upload.max_video_bytes", 50 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., APNAGHAR__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("APNAGHAR").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
