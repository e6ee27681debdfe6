pub mod course;
pub mod init;
pub mod list_models;
pub mod take;
pub mod validate;

use std::sync::Arc;

use anyhow::Result;

use mocktest_providers::{create_provider, LlmStudyPlanner, MocktestConfig, PlannerConfig};

/// Build a planner on the named (or default) provider.
pub(crate) fn planner_from_config(
    config: &MocktestConfig,
    provider: Option<&str>,
) -> Result<LlmStudyPlanner> {
    let (name, provider_config) = config.provider(provider)?;
    let generator = create_provider(name, provider_config)?;
    Ok(LlmStudyPlanner::new(
        Arc::from(generator),
        &config.default_model,
        PlannerConfig::from(config),
    ))
}
