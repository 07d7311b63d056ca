use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Account created at startup with admin rights, if configured.
#[derive(Debug, Clone, Deserialize)]
pub struct SuperuserSeed {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub password_hash: PasswordHashConfig,
    pub cors_origins: Vec<String>,
    pub superuser: Option<SuperuserSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(30),
        };
        if jwt.ttl_minutes <= 0 {
            anyhow::bail!("JWT_TTL_MINUTES must be positive");
        }

        let defaults = PasswordHashConfig::default();
        let password_hash = PasswordHashConfig {
            memory_kib: env_parse("PASSWORD_HASH_MEMORY_KIB").unwrap_or(defaults.memory_kib),
            iterations: env_parse("PASSWORD_HASH_ITERATIONS").unwrap_or(defaults.iterations),
            parallelism: env_parse("PASSWORD_HASH_PARALLELISM").unwrap_or(defaults.parallelism),
        };

        let cors_origins = std::env::var("BACKEND_CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        let superuser = match (
            std::env::var("ADMIN_EMAIL"),
            std::env::var("ADMIN_USERNAME"),
            std::env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(username), Ok(password)) => Some(SuperuserSeed {
                email,
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "usergate".into()),
            app_version: std::env::var("APP_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").into()),
            database_url,
            jwt,
            password_hash,
            cors_origins,
            superuser,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

/// Accepts either `a,b,c` or a JSON array `["a","b"]`.
pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw).unwrap_or_default();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
