//! Worker jobs
//!
//! Every job pulled from the queue maps to one evaluation operation. Job
//! processing cannot fail: each operation already folds its failures into a
//! well-formed report.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

use crate::consistency::{self, ConsistencyReport};
use crate::core::ExecutionResult;
use crate::dispatch::{CodeEvaluator, CodeSubmission};
use crate::reliability::{self, ReliabilityReport};
use crate::runner::Runner;

/// Worker job enum - represents different types of jobs the worker can process
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum WorkerJob {
    /// Execute a coding submission against its test cases
    #[serde(rename = "execute")]
    Execute(ExecuteJob),
    /// Score the reliability of a text evaluation
    #[serde(rename = "reliability")]
    Reliability(ReliabilityJob),
    /// Check resume claims against measured performance
    #[serde(rename = "consistency")]
    Consistency(ConsistencyJob),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteJob {
    pub submission_id: i64,
    #[serde(flatten)]
    pub submission: CodeSubmission,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReliabilityJob {
    pub submission_id: i64,
    pub response: String,
    #[serde(default, deserialize_with = "lenient_scores")]
    pub attempt_scores: Vec<f64>,
}

/// Keep the numeric entries; `null` or any other shape is no scores at all
fn lenient_scores<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(Value::as_f64).collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsistencyJob {
    pub interview_id: i64,
    /// Stored resume, any shape
    #[serde(default)]
    pub resume: Value,
    /// topic -> `{score}`
    #[serde(default)]
    pub performance: Value,
}

/// Result of one job, tagged like the job it answers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "job_type", rename_all = "snake_case")]
pub enum JobResult {
    Execute {
        submission_id: i64,
        #[serde(flatten)]
        result: ExecutionResult,
    },
    Reliability {
        submission_id: i64,
        #[serde(flatten)]
        report: ReliabilityReport,
    },
    Consistency {
        interview_id: i64,
        #[serde(flatten)]
        report: ConsistencyReport,
    },
}

impl JobResult {
    /// Storage key segment: `<kind>:<id>`
    pub fn key_suffix(&self) -> String {
        match self {
            JobResult::Execute { submission_id, .. } => format!("execute:{}", submission_id),
            JobResult::Reliability { submission_id, .. } => {
                format!("reliability:{}", submission_id)
            }
            JobResult::Consistency { interview_id, .. } => {
                format!("consistency:{}", interview_id)
            }
        }
    }
}

/// Run one job to completion
pub async fn process_job<R: Runner>(job: WorkerJob, evaluator: &CodeEvaluator<R>) -> JobResult {
    match job {
        WorkerJob::Execute(job) => {
            info!(
                "Processing execute job for submission {} ({}, {})",
                job.submission_id,
                job.submission.language,
                if crate::dispatch::is_native_language(&job.submission.language) {
                    "native"
                } else {
                    "delegated"
                }
            );
            let result = evaluator.evaluate(&job.submission).await;
            info!(
                "Submission {} done: score={}, all_passed={}",
                job.submission_id,
                result.execution_score,
                result.is_success()
            );
            JobResult::Execute {
                submission_id: job.submission_id,
                result,
            }
        }
        WorkerJob::Reliability(job) => {
            info!("Processing reliability job for submission {}", job.submission_id);
            let report = reliability::calculate(&job.response, &job.attempt_scores);
            info!(
                "Submission {} reliability={} confidence={}",
                job.submission_id, report.evaluation_reliability, report.ai_confidence_score
            );
            JobResult::Reliability {
                submission_id: job.submission_id,
                report,
            }
        }
        WorkerJob::Consistency(job) => {
            info!("Processing consistency job for interview {}", job.interview_id);
            let claimed = consistency::claimed_skills_from_resume(&job.resume);
            let performance = consistency::performance_from_value(&job.performance);
            let report = consistency::analyze(&claimed, &performance);
            info!(
                "Interview {} claim accuracy={}%, inflated={}, underutilized={}",
                job.interview_id,
                report.resume_claim_accuracy,
                report.inflated_skills.len(),
                report.underutilized_skills.len()
            );
            JobResult::Consistency {
                interview_id: job.interview_id,
                report,
            }
        }
    }
}
