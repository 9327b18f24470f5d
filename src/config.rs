//! Generator configuration (`strata.toml`).
//!
//! ```toml
//! [generator]
//! platform = "mysql"
//! identifier_quoting = true
//! heavy_indexing = false
//!
//! [mysql]
//! table_type = "InnoDB"
//! table_engine_keyword = "ENGINE"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StrataError, StrataResult};
use crate::model::{Database, Schema};
use crate::platform::{Platform, PlatformConfig, PlatformKind};

/// File looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "strata.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub mysql: MysqlConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_true")]
    pub identifier_quoting: bool,
    /// Forces heavy indexing on every database.
    #[serde(default)]
    pub heavy_indexing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysqlConfig {
    #[serde(default = "default_table_type")]
    pub table_type: String,
    #[serde(default = "default_engine_keyword")]
    pub table_engine_keyword: String,
}

fn default_true() -> bool {
    true
}

fn default_platform() -> String {
    PlatformKind::Sql.as_str().to_string()
}

fn default_table_type() -> String {
    PlatformConfig::default().mysql_table_type
}

fn default_engine_keyword() -> String {
    PlatformConfig::default().mysql_table_engine_keyword
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            identifier_quoting: true,
            heavy_indexing: false,
        }
    }
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            table_type: default_table_type(),
            table_engine_keyword: default_engine_keyword(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> StrataResult<Self> {
        toml::from_str(content)
            .map_err(|e| StrataError::Config(e.to_string().trim_end().to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            StrataError::Config(format!("{}: {}", path.display(), e.to_string().trim_end()))
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Explicit path, then `./strata.toml`, then the user config directory.
    /// Falls back to defaults when nothing is found.
    pub fn discover(explicit: Option<&Path>) -> StrataResult<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        for candidate in Self::candidates() {
            if candidate.is_file() {
                return Self::from_path(candidate);
            }
        }
        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("strata").join("config.toml"));
        }
        paths
    }

    pub fn platform_kind(&self) -> StrataResult<PlatformKind> {
        PlatformKind::from_name(&self.generator.platform)
    }

    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            identifier_quoting: self.generator.identifier_quoting,
            mysql_table_type: self.mysql.table_type.clone(),
            mysql_table_engine_keyword: self.mysql.table_engine_keyword.clone(),
        }
    }

    pub fn platform(&self) -> StrataResult<Box<dyn Platform>> {
        Ok(self.platform_kind()?.platform(&self.platform_config()))
    }

    /// Dialect for one database: `forced`, else the platform the database
    /// declares, else the configured one.
    pub fn platform_for(
        &self,
        database: &Database,
        forced: Option<PlatformKind>,
    ) -> StrataResult<Box<dyn Platform>> {
        let kind = match forced.or(database.platform()) {
            Some(kind) => kind,
            None => self.platform_kind()?,
        };
        Ok(kind.platform(&self.platform_config()))
    }

    /// Apply generator-wide switches to a loaded schema.
    pub fn apply(&self, schema: &mut Schema) {
        if self.generator.heavy_indexing {
            for database in schema.databases_mut() {
                database.set_heavy_indexing(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.platform_kind().unwrap(), PlatformKind::Sql);
        assert_eq!(config.platform_config(), PlatformConfig::default());
    }

    #[test]
    fn test_sections() {
        let config = Config::from_toml(
            r#"
            [generator]
            platform = "postgres"
            identifier_quoting = false

            [mysql]
            table_type = "MyISAM"
            "#,
        )
        .unwrap();
        assert_eq!(config.platform().unwrap().kind(), PlatformKind::Pgsql);
        let platform_config = config.platform_config();
        assert!(!platform_config.identifier_quoting);
        assert_eq!(platform_config.mysql_table_type, "MyISAM");
        assert_eq!(platform_config.mysql_table_engine_keyword, "ENGINE");
    }

    #[test]
    fn test_unknown_platform() {
        let config = Config::from_toml("[generator]\nplatform = \"oracle\"").unwrap();
        assert!(matches!(
            config.platform(),
            Err(StrataError::UnknownPlatform(name)) if name == "oracle"
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml("[generator\nplatform"),
            Err(StrataError::Config(_))
        ));
    }

    #[test]
    fn test_declared_platform_wins_over_config() {
        let config = Config::from_toml("[generator]\nplatform = \"sqlite\"").unwrap();
        let mut database = Database::new("bookstore");
        assert_eq!(
            config.platform_for(&database, None).unwrap().kind(),
            PlatformKind::Sqlite
        );
        database.set_platform(Some(PlatformKind::Pgsql));
        assert_eq!(
            config.platform_for(&database, None).unwrap().kind(),
            PlatformKind::Pgsql
        );
        assert_eq!(
            config
                .platform_for(&database, Some(PlatformKind::Mysql))
                .unwrap()
                .kind(),
            PlatformKind::Mysql
        );
    }

    #[test]
    fn test_heavy_indexing_is_forced() {
        let mut schema = Schema::new();
        schema
            .add_database(Database::new("bookstore"))
            .unwrap();
        let config = Config::from_toml("[generator]\nheavy_indexing = true").unwrap();
        config.apply(&mut schema);
        assert!(schema.databases()[0].is_heavy_indexing());
    }
}
