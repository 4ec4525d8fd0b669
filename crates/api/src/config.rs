use studioplan_core::import::ImportOptions;
use studioplan_core::project::{DEFAULT_CODE_PREFIX, DEFAULT_CURRENCY, DEFAULT_WEEKLY_CAPACITY};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Timeout for ordinary API requests in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Timeout for import previews and commits, which may wait on the
    /// remote column mapper (default: `120`).
    pub import_timeout_secs: u64,
    /// Largest accepted spreadsheet upload in bytes, from `MAX_UPLOAD_MB`
    /// (default: 20 MB).
    pub max_upload_bytes: usize,
    /// Base URL of the remote functions. AI features are off when unset.
    pub functions_url: Option<String>,
    /// Bearer key sent to the remote functions.
    pub functions_api_key: Option<String>,
    /// Defaults applied to imported rows.
    pub import: ImportOptions,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `IMPORT_TIMEOUT_SECS`     | `120`                      |
    /// | `MAX_UPLOAD_MB`           | `20`                       |
    /// | `FUNCTIONS_URL`           | unset (AI disabled)        |
    /// | `FUNCTIONS_API_KEY`       | unset                      |
    /// | `IMPORT_CODE_PREFIX`      | `PROJ`                     |
    /// | `IMPORT_DEFAULT_CURRENCY` | `USD`                      |
    /// | `DEFAULT_WEEKLY_CAPACITY` | `40`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let import_timeout_secs: u64 = std::env::var("IMPORT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("IMPORT_TIMEOUT_SECS must be a valid u64");

        let max_upload_mb: usize = std::env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("MAX_UPLOAD_MB must be a whole number of megabytes");

        let functions_url = non_empty_var("FUNCTIONS_URL");
        let functions_api_key = non_empty_var("FUNCTIONS_API_KEY");

        let code_prefix =
            non_empty_var("IMPORT_CODE_PREFIX").unwrap_or_else(|| DEFAULT_CODE_PREFIX.into());

        let default_currency = non_empty_var("IMPORT_DEFAULT_CURRENCY")
            .map(|c| {
                studioplan_core::project::normalize_currency(&c)
                    .expect("IMPORT_DEFAULT_CURRENCY must be a three-letter currency code")
            })
            .unwrap_or_else(|| DEFAULT_CURRENCY.into());

        let default_weekly_capacity: f64 = non_empty_var("DEFAULT_WEEKLY_CAPACITY")
            .map(|v| {
                v.parse()
                    .expect("DEFAULT_WEEKLY_CAPACITY must be a number of hours")
            })
            .unwrap_or(DEFAULT_WEEKLY_CAPACITY);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            import_timeout_secs,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            functions_url,
            functions_api_key,
            import: ImportOptions {
                code_prefix,
                default_currency,
                default_weekly_capacity,
            },
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
