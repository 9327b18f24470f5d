//! Generic SQL.

use super::{Platform, PlatformConfig, PlatformKind};

/// Renders with every default of [`Platform`].
#[derive(Debug, Clone, Default)]
pub struct SqlPlatform {
    config: PlatformConfig,
}

impl SqlPlatform {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }
}

impl Platform for SqlPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Sql
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
