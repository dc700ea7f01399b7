use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db;
use crate::error::SyncError;
use crate::models::{ScoreRecord, SyncFailure, SyncReport, UserRecord};
use crate::score::{self, ScoreInputs};

/// Upper bound on any single input read so one slow user cannot stall
/// the whole batch.
const INPUT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Recomputes and persists one user's score from the latest resume
/// analysis, GitHub stats, and badge count. The score is assembled fully
/// in memory and written with a single upsert, so no partial record is
/// ever visible.
pub async fn recalculate_user_score(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<ScoreRecord, SyncError> {
    let user = db::fetch_user(pool, user_id)
        .await?
        .ok_or(SyncError::NotFound(user_id))?;

    let inputs = load_inputs(pool, &user).await?;
    if let Some(profile) = &inputs.github {
        debug!(
            user = %profile.user_id,
            github = %profile.username,
            status = ?profile.sync_status,
            last_synced = ?profile.last_synced_at,
            "github snapshot loaded"
        );
    }
    let computed = score::compute_score(&inputs);
    db::upsert_score(pool, user.id, &computed).await?;
    Ok(computed)
}

async fn load_inputs(pool: &PgPool, user: &UserRecord) -> Result<ScoreInputs, SyncError> {
    let github = bounded(user.id, "github profile", db::fetch_github_profile(pool, user.id)).await?;
    let ats_score = bounded(user.id, "resume analysis", db::fetch_latest_ats_score(pool, user.id)).await?;
    let badge_count = bounded(user.id, "badges", db::fetch_badge_count(pool, user.id)).await?;

    Ok(ScoreInputs {
        ats_score,
        github,
        badge_count,
    })
}

async fn bounded<T>(
    user_id: Uuid,
    what: &str,
    fut: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, SyncError> {
    match tokio::time::timeout(INPUT_READ_TIMEOUT, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(SyncError::UpstreamUnavailable {
            user_id,
            detail: format!("{what} read timed out after {INPUT_READ_TIMEOUT:?}"),
        }),
    }
}

/// Full resync: recalculates every user sequentially, collecting per-user
/// failures instead of aborting. Only a store-level failure ends the run
/// early.
pub async fn sync_all(pool: &PgPool) -> anyhow::Result<SyncReport> {
    let orphans = db::orphaned_github_profiles(pool)
        .await
        .context("consistency check failed")?;
    for profile_id in &orphans {
        let defect = SyncError::ConsistencyViolation(format!(
            "github profile {profile_id} references a missing user"
        ));
        error!(error = %defect, "needs operator investigation");
    }

    let users = db::fetch_all_users(pool)
        .await
        .context("failed to enumerate users")?;
    info!(users = users.len(), "starting full score sync");

    let mut outcomes: Vec<Result<Uuid, SyncFailure>> = Vec::with_capacity(users.len());
    for user in &users {
        match recalculate_user_score(pool, user.id).await {
            Ok(score) => {
                info!(user = %user.name, id = %user.id, total = score.total, "score updated");
                outcomes.push(Ok(user.id));
            }
            Err(err) if err.is_fatal() => {
                return Err(anyhow::Error::from(err).context("store failure aborted the sync run"));
            }
            Err(err) => {
                warn!(user = %user.email, id = %user.id, error = %err, "skipping user");
                outcomes.push(Err(SyncFailure {
                    user_id: user.id,
                    reason: err.to_string(),
                }));
            }
        }
    }

    Ok(tally(outcomes, orphans.len()))
}

/// Folds tagged per-user outcomes into the final report.
pub fn tally(
    outcomes: Vec<Result<Uuid, SyncFailure>>,
    consistency_defects: usize,
) -> SyncReport {
    let attempted = outcomes.len();
    let mut succeeded = 0usize;
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(_) => succeeded += 1,
            Err(failure) => failures.push(failure),
        }
    }

    SyncReport {
        attempted,
        succeeded,
        failures,
        consistency_defects,
    }
}
