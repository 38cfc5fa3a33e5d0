//! Engine configuration: types, builder and getters.

mod builder;
mod getters;
mod types;

pub use builder::EngineConfigBuilder;
pub use types::EngineConfig;

impl EngineConfig {
    /// Builder with defaults.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Defaults plus `SHOPSCOUT_*` environment overrides.
    pub fn from_env() -> anyhow::Result<Self> {
        EngineConfigBuilder::new().env_overrides().build()
    }
}
