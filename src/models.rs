use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub graduation_year: i32,
}

/// GitHub account snapshot persisted by the external sync adapter.
/// This crate only reads it; `sync_status` is owned by the adapter.
#[derive(Debug, Clone)]
pub struct GitHubProfileRecord {
    pub user_id: Uuid,
    pub username: String,
    pub total_commits: i32,
    pub total_pull_requests: i32,
    pub total_stars: i32,
    pub languages: Vec<String>,
    pub sync_status: SyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Pending,
    Syncing,
    Completed,
    Failed,
}

impl std::str::FromStr for SyncStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "completed" => Ok(SyncStatus::Completed),
            "failed" => Ok(SyncStatus::Failed),
            other => Err(anyhow::anyhow!("unknown sync status {other:?}")),
        }
    }
}

/// Computed per-user score. Sub-scores and total are always 0-100;
/// `total` is a fixed weighting of the sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub ats: i32,
    pub github: i32,
    pub badges: i32,
    pub total: i32,
}

/// One user with their score, if any. Unit of input for the analytics
/// roll-ups; users without a score still count toward cohort size and
/// the engagement denominator.
#[derive(Debug, Clone)]
pub struct StudentRow {
    pub department: String,
    pub graduation_year: i32,
    pub score: Option<ScoreRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AverageScores {
    pub ats: f64,
    pub github: f64,
    pub badges: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformSummary {
    pub total_users: usize,
    pub scored_users: usize,
    pub github_connections: i64,
    /// Whole percent, scored users over all users.
    pub engagement_rate: u32,
    pub average_scores: AverageScores,
}

/// Integer percentages of a cohort's scored population. Sums to 100
/// whenever the cohort has at least one score.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Distribution {
    pub developing: u32,
    pub progressing: u32,
    pub advanced: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortMetrics {
    pub department: String,
    pub graduation_year: i32,
    pub student_count: usize,
    pub scored_count: usize,
    pub average_scores: AverageScores,
    pub distribution: Distribution,
}

impl CohortMetrics {
    pub fn label(&self) -> String {
        format!("{} {}", self.department, self.graduation_year)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AtRiskCohort {
    pub cohort: CohortMetrics,
    pub developing_percentage: u32,
    pub recommendation: String,
}

/// Final tally of a full sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<SyncFailure>,
    pub consistency_defects: usize,
}

impl SyncReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.succeeded == 0
    }
}

#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub user_id: Uuid,
    pub reason: String,
}
