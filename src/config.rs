//! Environment-driven configuration, read once at startup.

use reqwest::Url;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MODEL: &str = "gpt-5.2-2025-12-11";
const DEFAULT_FALLBACK_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_NEXTCLOUD_DIR: &str = "/Photos";
const WEB_UI_FILES_MARKER: &str = "/apps/files/files";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub local_folders: Vec<PathBuf>,
    pub openai: OpenAiConfig,
    pub nextcloud: NextcloudConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub fallback_model: String,
}

#[derive(Debug, Clone, Default)]
pub struct NextcloudConfig {
    pub base_url: String,
    pub dir: String,
    pub username: String,
    pub app_password: String,
}

impl NextcloudConfig {
    /// Remote-share features need all three credentials parts.
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.username.is_empty() && !self.app_password.is_empty()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = read("PORT")
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let (base_url, dir) = resolve_nextcloud_location(
            read("NEXTCLOUD_BASE_URL").as_deref().unwrap_or(""),
            read("NEXTCLOUD_DIR").as_deref().unwrap_or(""),
        );

        let local_folders = lookup("PLANNER_LOCAL_FOLDERS")
            .map(|raw| {
                std::env::split_paths(&raw)
                    .filter(|path| !path.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        AppConfig {
            host: read("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            data_dir: read("PLANNER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            local_folders,
            openai: OpenAiConfig {
                api_key: read("OPENAI_API_KEY"),
                base_url: read("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: read("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                fallback_model: read("OPENAI_FALLBACK_MODEL")
                    .unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_string()),
            },
            nextcloud: NextcloudConfig {
                base_url,
                dir: if dir.is_empty() {
                    DEFAULT_NEXTCLOUD_DIR.to_string()
                } else {
                    dir
                },
                username: read("NEXTCLOUD_USERNAME").unwrap_or_default(),
                app_password: read("NEXTCLOUD_APP_PASSWORD").unwrap_or_default(),
            },
        }
    }
}

/// Splits a configured share location into `(origin, directory)`.
///
/// A URL copied from the Nextcloud web UI (`.../apps/files/files?dir=/Photos`)
/// carries the directory in its `dir` query parameter; an explicitly configured
/// directory still wins. Unparseable input is passed through untouched.
pub fn resolve_nextcloud_location(base_input: &str, dir_input: &str) -> (String, String) {
    let mut base_url = base_input.trim().to_string();
    let mut dir = dir_input.trim().to_string();

    if !base_url.is_empty() {
        if let Ok(parsed) = Url::parse(&base_url) {
            if base_url.contains(WEB_UI_FILES_MARKER) && dir.is_empty() {
                dir = parsed
                    .query_pairs()
                    .find(|(key, _)| key == "dir")
                    .map(|(_, value)| value.into_owned())
                    .unwrap_or_default();
            }
            base_url = parsed.origin().ascii_serialization();
        }
    }

    (base_url.trim_end_matches('/').to_string(), dir)
}
