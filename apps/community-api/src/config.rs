/// Community API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When unset the service runs on the
    /// in-memory store and nothing survives a restart.
    pub database_url: Option<String>,
    /// Maximum number of pooled Postgres connections.
    pub db_pool_size: usize,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Upper bound for the `limit` of a single feed page.
    pub max_feed_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            db_pool_size: 20,
            port: 4010,
            max_feed_limit: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_pool_size: parsed_var("DB_POOL_SIZE")
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.db_pool_size),
            port: parsed_var("PORT").unwrap_or(defaults.port),
            max_feed_limit: parsed_var("MAX_FEED_LIMIT")
                .filter(|limit: &i64| *limit > 0)
                .unwrap_or(defaults.max_feed_limit),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// `postgres://host/yaksa?x=y` -> `postgres://host/yaksa_test?x=y`.
pub fn with_test_db_suffix(database_url: &str) -> String {
    let (base, query) = match database_url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (database_url, None),
    };
    let Some((prefix, db_name)) = base.rsplit_once('/') else {
        return database_url.to_string();
    };
    if db_name.is_empty() || db_name.ends_with("_test") {
        return database_url.to_string();
    }

    let mut updated = format!("{prefix}/{db_name}_test");
    if let Some(query) = query {
        updated.push('?');
        updated.push_str(query);
    }
    updated
}
