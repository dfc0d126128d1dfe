//! Environment-driven configuration of the ingestion side.

use std::path::PathBuf;

use chrono::NaiveDate;

pub const PORTAL_BASE_URL: &str =
    "https://portaldatransparencia.gov.br/download-de-dados/despesas/";

/// The upstream refuses requests without a browser-looking user agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub portal_base_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub cache_dir: PathBuf,
    pub work_dir: PathBuf,
    pub sync_cron: String,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            portal_base_url: PORTAL_BASE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            http_timeout_secs: 120,
            cache_dir: PathBuf::from("tmp/zips"),
            work_dir: PathBuf::from("tmp/data"),
            sync_cron: "0 30 6 * * *".to_string(),
        }
    }
}

impl EtlConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            portal_base_url: std::env::var("VERBA_PORTAL_URL")
                .unwrap_or(defaults.portal_base_url),
            user_agent: std::env::var("VERBA_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout_secs: std::env::var("VERBA_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            cache_dir: std::env::var("VERBA_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            work_dir: std::env::var("VERBA_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            sync_cron: std::env::var("VERBA_SYNC_CRON").unwrap_or(defaults.sync_cron),
        }
    }
}

/// `YYYYMMDD`, the date spelling the portal uses in URLs and file names.
pub fn day_code(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `despesas_YYYYMMDD.zip`.
pub fn archive_name(date: NaiveDate) -> String {
    format!("despesas_{}.zip", day_code(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_matches_the_portal_convention() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert_eq!(archive_name(date), "despesas_20250116.zip");
        assert_eq!(day_code(date), "20250116");
    }
}
