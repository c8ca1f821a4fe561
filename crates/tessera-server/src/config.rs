//! Server configuration read from the environment.

use tessera_content::ContentConfig;
use tessera_db::DbConfig;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub content: ContentConfig,
}

impl ServerConfig {
    /// Read `TESSERA_DB_*` variables, keeping the default for any that
    /// are unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut db = DbConfig::default();
        let fields = [
            ("TESSERA_DB_URL", &mut db.url),
            ("TESSERA_DB_NAMESPACE", &mut db.namespace),
            ("TESSERA_DB_DATABASE", &mut db.database),
            ("TESSERA_DB_USER", &mut db.username),
            ("TESSERA_DB_PASSWORD", &mut db.password),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        Self {
            db,
            content: ContentConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unset_variables_keep_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.db.url, "127.0.0.1:8000");
        assert_eq!(config.db.namespace, "tessera");
        assert_eq!(config.content.duplicate_name_prefix, "Copy of ");
    }

    #[test]
    fn set_variables_override_fields() {
        let env: HashMap<&str, &str> = [
            ("TESSERA_DB_URL", "db.internal:8000"),
            ("TESSERA_DB_PASSWORD", "s3cret"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.db.url, "db.internal:8000");
        assert_eq!(config.db.password, "s3cret");
        assert_eq!(config.db.username, "root");
        assert_eq!(config.db.database, "content");
    }
}
