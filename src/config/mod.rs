use chrono::Duration;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::layout::LayoutConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub share: ShareConfig,
    pub layout: LayoutConfig,
    pub source: SourceConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Base used to build public share links, e.g. `https://org.example.com/`.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    pub default_ttl_secs: i64,
    pub max_ttl_secs: i64,
    /// 0 disables the background sweep.
    pub sweep_interval_secs: u64,
    /// How long an expired snapshot is kept so it still reports "expired".
    pub expired_retention_secs: i64,
    /// JSON file for snapshots; `None` keeps them in memory.
    pub store_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub employees_file: Option<PathBuf>,
    pub database_url: Option<String>,
    pub staff_table: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Upper bound for every share duration setting (100 years).
pub const SHARE_SECS_LIMIT: i64 = 100 * 365 * 24 * 3600;

impl ShareConfig {
    /// Requested TTL clamped to `[0, max_ttl_secs]`; `None` means the default.
    pub fn effective_ttl_secs(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_ttl_secs)
            .clamp(0, self.max_ttl_secs.clamp(0, SHARE_SECS_LIMIT))
    }

    pub fn ttl(&self, requested: Option<i64>) -> Duration {
        Duration::seconds(self.effective_ttl_secs(requested))
    }

    pub fn expired_retention(&self) -> Duration {
        Duration::seconds(self.expired_retention_secs.clamp(0, SHARE_SECS_LIMIT))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("ORGCHART_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("ORGCHART_PUBLIC_BASE_URL") {
            self.server.public_base_url = v;
        }

        // Share overrides
        if let Ok(v) = env::var("SHARE_DEFAULT_TTL_SECS") {
            self.share.default_ttl_secs = v.parse().unwrap_or(self.share.default_ttl_secs);
        }
        if let Ok(v) = env::var("SHARE_MAX_TTL_SECS") {
            self.share.max_ttl_secs = v.parse().unwrap_or(self.share.max_ttl_secs);
        }
        if let Ok(v) = env::var("SHARE_SWEEP_INTERVAL_SECS") {
            self.share.sweep_interval_secs = v.parse().unwrap_or(self.share.sweep_interval_secs);
        }
        if let Ok(v) = env::var("SHARE_EXPIRED_RETENTION_SECS") {
            self.share.expired_retention_secs = v.parse().unwrap_or(self.share.expired_retention_secs);
        }

        self.share.default_ttl_secs = self.share.default_ttl_secs.clamp(0, SHARE_SECS_LIMIT);
        self.share.max_ttl_secs = self.share.max_ttl_secs.clamp(0, SHARE_SECS_LIMIT);
        self.share.expired_retention_secs = self.share.expired_retention_secs.clamp(0, SHARE_SECS_LIMIT);
        if let Ok(v) = env::var("SHARE_STORE_PATH") {
            self.share.store_path = Some(PathBuf::from(v)).filter(|p| !p.as_os_str().is_empty());
        }

        // Layout overrides
        if let Ok(v) = env::var("LAYOUT_NODE_PITCH") {
            self.layout.node_pitch = v.parse().unwrap_or(self.layout.node_pitch);
        }
        if let Ok(v) = env::var("LAYOUT_ROW_PITCH") {
            self.layout.row_pitch = v.parse().unwrap_or(self.layout.row_pitch);
        }
        if let Ok(v) = env::var("LAYOUT_NODE_WIDTH") {
            self.layout.node_width = v.parse().unwrap_or(self.layout.node_width);
        }
        if let Ok(v) = env::var("LAYOUT_NODE_HEIGHT") {
            self.layout.node_height = v.parse().unwrap_or(self.layout.node_height);
        }

        // Source overrides
        if let Ok(v) = env::var("ORGCHART_EMPLOYEES_FILE") {
            self.source.employees_file = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.source.database_url = Some(v);
        }
        if let Ok(v) = env::var("STAFF_TABLE") {
            self.source.staff_table = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.source.max_connections = v.parse().unwrap_or(self.source.max_connections);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("ORGCHART_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                public_base_url: "http://localhost:3000/".to_string(),
            },
            share: ShareConfig {
                default_ttl_secs: 7 * 24 * 3600, // 1 week
                max_ttl_secs: 30 * 24 * 3600,
                sweep_interval_secs: 0,
                expired_retention_secs: 24 * 3600,
                store_path: None,
            },
            layout: LayoutConfig::default(),
            source: SourceConfig {
                employees_file: None,
                database_url: None,
                staff_table: "staff".to_string(),
                max_connections: 5,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                public_base_url: "https://staging.example.com/".to_string(),
            },
            share: ShareConfig {
                default_ttl_secs: 7 * 24 * 3600,
                max_ttl_secs: 30 * 24 * 3600,
                sweep_interval_secs: 3600,
                expired_retention_secs: 7 * 24 * 3600,
                store_path: Some(PathBuf::from("data/shares.json")),
            },
            layout: LayoutConfig::default(),
            source: SourceConfig {
                employees_file: None,
                database_url: None,
                staff_table: "staff".to_string(),
                max_connections: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                public_base_url: "https://app.example.com/".to_string(),
            },
            share: ShareConfig {
                default_ttl_secs: 3 * 24 * 3600,
                max_ttl_secs: 14 * 24 * 3600,
                sweep_interval_secs: 900,
                expired_retention_secs: 7 * 24 * 3600,
                store_path: Some(PathBuf::from("data/shares.json")),
            },
            layout: LayoutConfig::default(),
            source: SourceConfig {
                employees_file: None,
                database_url: None,
                staff_table: "staff".to_string(),
                max_connections: 20,
            },
            security: SecurityConfig {
                enable_cors: false,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macro for environment checks
#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
