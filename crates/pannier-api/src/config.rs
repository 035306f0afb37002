//! Server configuration.

use serde::{Deserialize, Serialize};

use pannier_core::{Error, Result};

/// Configuration for the pannier API server.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Optional shared secret required to access `/metrics`.
    ///
    /// When set to a non-empty value, callers must provide either:
    /// - `X-Metrics-Secret: <secret>`, or
    /// - `Authorization: Bearer <secret>`
    ///
    /// Empty/whitespace values are treated as unset.
    #[serde(default)]
    pub metrics_secret: Option<String>,

    /// Enable debug mode.
    ///
    /// When enabled:
    /// - the basket owner is taken from the `X-User-Id` header (dev/tests)
    ///
    /// When disabled:
    /// - the owner comes from a verified JWT `Authorization` bearer token
    pub debug: bool,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,

    /// JWT authentication configuration (used when `debug` is false).
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Storage configuration (bucket/backend selection).
    #[serde(default)]
    pub storage: StorageConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("http_port", &self.http_port)
            .field(
                "metrics_secret",
                &self.metrics_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("debug", &self.debug)
            .field("cors", &self.cors)
            .field("jwt", &self.jwt)
            .field("storage", &self.storage)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            metrics_secret: None,
            debug: false,
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// CORS configuration for browser-based access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. Use `["*"]` to allow all origins (development only).
    /// Empty list disables CORS entirely.
    pub allowed_origins: Vec<String>,

    /// Max age for preflight cache (seconds).
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // Default: disabled (secure-by-default).
            // Set to `["*"]` for local development, or explicit origins for production.
            allowed_origins: Vec::new(),
            max_age_seconds: 3600, // 1 hour
        }
    }
}

/// JWT configuration for production authentication.
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 secret used to verify bearer tokens.
    ///
    /// In production this should be delivered via secret manager / env var,
    /// not checked into config files.
    #[serde(default)]
    pub hs256_secret: Option<String>,

    /// RS256 public key in PEM format for verifying bearer tokens.
    #[serde(default)]
    pub rs256_public_key_pem: Option<String>,

    /// Optional issuer (`iss`) to enforce.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Optional audience (`aud`) to enforce.
    #[serde(default)]
    pub audience: Option<String>,

    /// Claim name that contains the basket owner identifier.
    #[serde(default = "default_owner_claim")]
    pub owner_claim: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field(
                "hs256_secret",
                &self.hs256_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("rs256_public_key_pem", &self.rs256_public_key_pem)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("owner_claim", &self.owner_claim)
            .finish()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            hs256_secret: None,
            rs256_public_key_pem: None,
            issuer: None,
            audience: None,
            owner_claim: default_owner_claim(),
        }
    }
}

fn default_owner_claim() -> String {
    "sub".to_string()
}

/// Storage configuration for the API server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Object storage bucket name (e.g., `my-bucket`, `gs://my-bucket`, `s3://my-bucket`).
    #[serde(default)]
    pub bucket: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// This is the canonical runtime configuration path for container
    /// deployments.
    ///
    /// Supported env vars:
    /// - `PANNIER_HTTP_PORT`
    /// - `PANNIER_METRICS_SECRET`
    /// - `PANNIER_DEBUG`
    /// - `PANNIER_CORS_ALLOWED_ORIGINS` (comma-separated, or `*`)
    /// - `PANNIER_CORS_MAX_AGE_SECONDS`
    /// - `PANNIER_JWT_HS256_SECRET`
    /// - `PANNIER_JWT_RS256_PUBLIC_KEY_PEM`
    /// - `PANNIER_JWT_ISSUER`
    /// - `PANNIER_JWT_AUDIENCE`
    /// - `PANNIER_JWT_OWNER_CLAIM`
    /// - `PANNIER_STORAGE_BUCKET`
    ///
    /// JWTs must include an owner identifier claim. The claim defaults to
    /// `sub` unless overridden via `PANNIER_JWT_OWNER_CLAIM`.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(port) = env_u16("PANNIER_HTTP_PORT")? {
            config.http_port = port;
        }
        config.metrics_secret = env_string("PANNIER_METRICS_SECRET");
        if let Some(debug) = env_bool("PANNIER_DEBUG")? {
            config.debug = debug;
        }

        if let Some(origins) = env_string("PANNIER_CORS_ALLOWED_ORIGINS") {
            config.cors.allowed_origins = parse_cors_allowed_origins(&origins);
        }
        if let Some(max_age) = env_u64("PANNIER_CORS_MAX_AGE_SECONDS")? {
            config.cors.max_age_seconds = max_age;
        }

        if let Some(secret) = env_string("PANNIER_JWT_HS256_SECRET") {
            config.jwt.hs256_secret = Some(secret);
        }
        if let Some(pem) = env_string("PANNIER_JWT_RS256_PUBLIC_KEY_PEM") {
            config.jwt.rs256_public_key_pem = Some(normalize_pem(&pem));
        }
        if let Some(issuer) = env_string("PANNIER_JWT_ISSUER") {
            config.jwt.issuer = Some(issuer);
        }
        if let Some(audience) = env_string("PANNIER_JWT_AUDIENCE") {
            config.jwt.audience = Some(audience);
        }
        if let Some(claim) = env_string("PANNIER_JWT_OWNER_CLAIM") {
            config.jwt.owner_claim = claim;
        }

        if let Some(bucket) = env_string("PANNIER_STORAGE_BUCKET") {
            config.storage.bucket = Some(bucket);
        }

        Ok(config)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u16(name: &str) -> Result<Option<u16>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u16>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    v.parse::<u64>()
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(v) = env_string(name) else {
        return Ok(None);
    };
    parse_bool(name, &v).map(Some)
}

fn parse_cors_allowed_origins(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if trimmed == "*" {
        return vec!["*".to_string()];
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_pem(pem: &str) -> String {
    let trimmed = pem.trim();
    if trimmed.contains("\\n") && !trimmed.contains('\n') {
        trimmed.replace("\\n", "\n")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_production_shaped() {
        let config = Config::default();
        assert_eq!(config.http_port, 8080);
        assert!(!config.debug);
        assert!(config.cors.allowed_origins.is_empty());
        assert!(config.jwt.hs256_secret.is_none());
        assert_eq!(config.jwt.owner_claim, "sub");
    }

    #[test]
    fn parse_bool_accepts_true_values() {
        assert!(parse_bool("TEST", "true").unwrap());
        assert!(parse_bool("TEST", "1").unwrap());
        assert!(parse_bool("TEST", "yes").unwrap());
        assert!(parse_bool("TEST", "TRUE").unwrap());
    }

    #[test]
    fn parse_bool_accepts_false_values() {
        assert!(!parse_bool("TEST", "false").unwrap());
        assert!(!parse_bool("TEST", "0").unwrap());
        assert!(!parse_bool("TEST", "no").unwrap());
        assert!(!parse_bool("TEST", "FALSE").unwrap());
    }

    #[test]
    fn parse_bool_rejects_invalid_values() {
        assert!(parse_bool("TEST", "maybe").is_err());
        assert!(parse_bool("TEST", "").is_err());
    }

    #[test]
    fn cors_origins_split_on_commas() {
        let origins = parse_cors_allowed_origins("https://a.example, https://b.example,,");
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn cors_origins_wildcard_is_preserved() {
        assert_eq!(parse_cors_allowed_origins("*"), vec!["*"]);
        assert!(parse_cors_allowed_origins("  ").is_empty());
    }

    #[test]
    fn normalize_pem_unescapes_single_line_values() {
        let pem = "-----BEGIN PUBLIC KEY-----\\nabc\\n-----END PUBLIC KEY-----";
        let normalized = normalize_pem(pem);
        assert!(normalized.contains('\n'));
        assert!(!normalized.contains("\\n"));
    }

    #[test]
    fn jwt_debug_redacts_secret() {
        let jwt = JwtConfig {
            hs256_secret: Some("super-secret".to_string()),
            ..JwtConfig::default()
        };
        let dbg = format!("{jwt:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("super-secret"));
    }

    #[test]
    fn config_debug_redacts_metrics_secret() {
        let config = Config {
            metrics_secret: Some("metrics-secret".to_string()),
            ..Config::default()
        };
        let dbg = format!("{config:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("metrics-secret"));
    }
}
