mod checker;
mod config;
mod consistency;
mod core;
mod delegate;
mod dispatch;
mod engine;
mod jobs;
mod redis_manager;
mod reliability;
mod runner;

use anyhow::Result;
use tracing::{error, info};

use crate::config::{init_config, EvaluatorConfig};
use crate::dispatch::CodeEvaluator;
use crate::jobs::process_job;
use crate::redis_manager::RedisManager;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("answer_evaluator=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = init_config(EvaluatorConfig::load()?)?;
    info!(
        "Execution config: node={}, resolution={}ms, case={}ms, suite={}ms, memory={}MB",
        config.execution.node_binary,
        config.execution.resolution_timeout_ms,
        config.execution.case_timeout_ms,
        config.execution.suite_wall_time_ms,
        config.execution.memory_limit_mb
    );

    let evaluator = CodeEvaluator::from_config(config)?;

    info!("Starting Answer Evaluation Worker...");
    let mut redis = RedisManager::from_env().await?;

    info!("Waiting for jobs...");

    loop {
        let job = match redis.pop_job().await {
            Ok(job) => job,
            Err(e) => {
                error!("Failed to receive job: {:#}", e);
                continue;
            }
        };

        let result = process_job(job, &evaluator).await;

        if let Err(e) = redis.store_result(&result).await {
            error!("Failed to store result {}: {:#}", result.key_suffix(), e);
        }
    }
}
