use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://app.americansocceranalysis.com/api/v1";
pub const DEFAULT_UPSTREAM_BASE: &str = "https://app.americansocceranalysis.com";
pub const DEFAULT_PROXY_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_SEASON: &str = "2025";
const DEFAULT_SEASONS: &[&str] = &["2025", "2024", "2023", "2022", "2021", "2020"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub upstream_base: String,
    pub proxy_bind: SocketAddr,
    pub page_size: usize,
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub default_season: String,
    pub seasons: Vec<String>,
    pub fetch_parallelism: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            upstream_base: DEFAULT_UPSTREAM_BASE.to_string(),
            proxy_bind: default_bind(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: 500,
            request_timeout: Duration::from_secs(30),
            default_season: DEFAULT_SEASON.to_string(),
            seasons: DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect(),
            fetch_parallelism: 4,
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base = string_env("ASA_API_BASE")
            .map(|v| trim_base(&v))
            .unwrap_or(defaults.api_base);
        let upstream_base = string_env("ASA_UPSTREAM_BASE")
            .map(|v| trim_base(&v))
            .unwrap_or(defaults.upstream_base);
        let proxy_bind = string_env("PROXY_BIND")
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or(defaults.proxy_bind);
        let page_size = parsed_env::<usize>("ASA_PAGE_SIZE")
            .unwrap_or(defaults.page_size)
            .clamp(1, 10_000);
        let max_pages = parsed_env::<usize>("ASA_MAX_PAGES")
            .unwrap_or(defaults.max_pages)
            .max(1);
        let timeout_secs = parsed_env::<u64>("HTTP_TIMEOUT_SECS")
            .unwrap_or(defaults.request_timeout.as_secs())
            .clamp(1, 600);
        let default_season = string_env("DEFAULT_SEASON").unwrap_or(defaults.default_season);
        let seasons = string_env("SEASONS")
            .map(|raw| parse_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.seasons);
        let fetch_parallelism = parsed_env::<usize>("FETCH_PARALLELISM")
            .unwrap_or(defaults.fetch_parallelism)
            .clamp(1, 32);

        Self {
            api_base,
            upstream_base,
            proxy_bind,
            page_size,
            max_pages,
            request_timeout: Duration::from_secs(timeout_secs),
            default_season,
            seasons,
            fetch_parallelism,
        }
    }
}

/// Load `.env.local` then `.env`; missing files are fine.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}

fn string_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    string_env(key).and_then(|v| v.parse::<T>().ok())
}

fn trim_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
