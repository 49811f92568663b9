//! Registry and schema generation settings

use std::env;

use serde::{Deserialize, Serialize};

use crate::dialect::Driver;
use crate::error::ConfigError;
use crate::naming::NameStrategy;

pub const DEFAULT_MYSQL_ENGINE: &str = "INNODB";

/// Storage engine names are bare identifiers; they are written into DDL as is
pub(crate) fn is_engine_name(engine: &str) -> bool {
    !engine.is_empty() && engine.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Settings shared by a registry and the schema generator reading it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// Dialect used when no driver is given explicitly
    pub driver: Driver,
    /// `ENGINE=` clause for MySQL tables without their own engine
    pub mysql_engine: String,
    /// How type and field identifiers become table and column names
    pub name_strategy: NameStrategy,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            driver: Driver::MySQL,
            mysql_engine: DEFAULT_MYSQL_ENGINE.to_string(),
            name_strategy: NameStrategy::Snake,
        }
    }
}

impl OrmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_mysql_engine(mut self, engine: impl Into<String>) -> Self {
        self.mysql_engine = engine.into();
        self
    }

    pub fn with_name_strategy(mut self, strategy: NameStrategy) -> Self {
        self.name_strategy = strategy;
        self
    }

    /// Load configuration from `ORM_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(driver) = env::var("ORM_DRIVER") {
            config.driver = driver.parse()?;
        }

        if let Ok(engine) = env::var("ORM_MYSQL_ENGINE") {
            config.mysql_engine = engine;
        }

        if let Ok(strategy) = env::var("ORM_NAME_STRATEGY") {
            config.name_strategy = strategy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_engine_name(self.mysql_engine.trim()) {
            return Err(ConfigError::InvalidValue {
                field: "mysql_engine".to_string(),
                value: self.mysql_engine.clone(),
                expected: "a storage engine name such as INNODB or MyISAM".to_string(),
            });
        }

        Ok(())
    }
}
