use std::env;

use crate::services::reconcile::ActivityPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub summary_timeout_secs: u64,

    pub activity_policy: ActivityPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://uplift.db?mode=rwc".into()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            gemini_model: env::var("GEMINI_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "gemini-2.5-flash".into()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            summary_timeout_secs: env::var("SUMMARY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .expect("SUMMARY_TIMEOUT_SECS must be a number"),

            activity_policy: parse_activity_policy(env::var("ACTIVITY_POLICY").ok().as_deref()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Standing warning shown while nightly summaries cannot be generated.
    pub fn summary_warning(&self) -> Option<String> {
        match self.gemini_api_key {
            Some(_) => None,
            None => Some(
                "GEMINI_API_KEY is not set; nightly check-ins cannot be summarized".into(),
            ),
        }
    }
}

fn parse_activity_policy(raw: Option<&str>) -> ActivityPolicy {
    raw.map(|p| p.parse().expect("ACTIVITY_POLICY must be merge or replace"))
        .unwrap_or_default()
}

#[cfg(test)]
impl Config {
    /// Config for tests: in-memory database, no summarization credential.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".into(),
            gemini_base_url: "http://127.0.0.1:9".into(),
            summary_timeout_secs: 5,
            activity_policy: ActivityPolicy::Merge,
        }
    }
}
