use crate::models::{GitHubProfileRecord, ScoreRecord, SyncStatus};

const ATS_WEIGHT: f64 = 0.50;
const GITHUB_WEIGHT: f64 = 0.30;
const BADGES_WEIGHT: f64 = 0.20;

/// Snapshot of everything the weighting function needs for one user.
/// Built from store reads so the score write can be a single upsert.
#[derive(Debug, Clone, Default)]
pub struct ScoreInputs {
    pub ats_score: Option<i32>,
    pub github: Option<GitHubProfileRecord>,
    pub badge_count: i64,
}

pub fn compute_score(inputs: &ScoreInputs) -> ScoreRecord {
    let ats = inputs.ats_score.map(clamp_score).unwrap_or(0);
    let github = inputs
        .github
        .as_ref()
        .map(github_contribution)
        .unwrap_or(0);
    let badges = badges_contribution(inputs.badge_count);

    ScoreRecord {
        ats,
        github,
        badges,
        total: total_score(ats, github, badges),
    }
}

pub fn total_score(ats: i32, github: i32, badges: i32) -> i32 {
    let weighted = ATS_WEIGHT * ats as f64
        + GITHUB_WEIGHT * github as f64
        + BADGES_WEIGHT * badges as f64;
    clamp_score(weighted.round() as i32)
}

/// Capped blend of activity stats. A profile whose sync never completed
/// carries stale or empty stats, so it contributes nothing.
pub fn github_contribution(profile: &GitHubProfileRecord) -> i32 {
    if profile.sync_status != SyncStatus::Completed {
        return 0;
    }

    let commits = capped_ratio(profile.total_commits, 200) * 40.0;
    let prs = capped_ratio(profile.total_pull_requests, 50) * 25.0;
    let stars = capped_ratio(profile.total_stars, 100) * 20.0;
    let languages = capped_ratio(profile.languages.len() as i32, 5) * 15.0;

    clamp_score((commits + prs + stars + languages).round() as i32)
}

pub fn badges_contribution(badge_count: i64) -> i32 {
    clamp_score((badge_count * 10).min(100) as i32)
}

fn capped_ratio(value: i32, cap: i32) -> f64 {
    value.clamp(0, cap) as f64 / cap as f64
}

fn clamp_score(value: i32) -> i32 {
    value.clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn profile(commits: i32, prs: i32, stars: i32, languages: usize) -> GitHubProfileRecord {
        GitHubProfileRecord {
            user_id: Uuid::new_v4(),
            username: "octocat".to_string(),
            total_commits: commits,
            total_pull_requests: prs,
            total_stars: stars,
            languages: (0..languages).map(|i| format!("lang{i}")).collect(),
            sync_status: SyncStatus::Completed,
            last_synced_at: None,
        }
    }

    #[test]
    fn github_stats_are_capped() {
        assert_eq!(github_contribution(&profile(200, 50, 100, 5)), 100);
        assert_eq!(github_contribution(&profile(5000, 900, 2000, 12)), 100);
    }

    #[test]
    fn github_blend_matches_weights() {
        // half the commit cap, everything else zero
        assert_eq!(github_contribution(&profile(100, 0, 0, 0)), 20);
        assert_eq!(github_contribution(&profile(0, 25, 0, 0)), 13);
    }

    #[test]
    fn incomplete_sync_contributes_zero() {
        for status in [SyncStatus::Pending, SyncStatus::Syncing, SyncStatus::Failed] {
            let mut p = profile(200, 50, 100, 5);
            p.sync_status = status;
            assert_eq!(github_contribution(&p), 0);
        }
    }

    #[test]
    fn failed_sync_still_produces_a_score() {
        let mut p = profile(200, 50, 100, 5);
        p.sync_status = SyncStatus::Failed;
        let score = compute_score(&ScoreInputs {
            ats_score: Some(80),
            github: Some(p),
            badge_count: 3,
        });
        assert_eq!(score.github, 0);
        assert_eq!(score.ats, 80);
        assert_eq!(score.badges, 30);
        assert_eq!(score.total, total_score(80, 0, 30));
    }

    #[test]
    fn badges_cap_at_one_hundred() {
        assert_eq!(badges_contribution(0), 0);
        assert_eq!(badges_contribution(4), 40);
        assert_eq!(badges_contribution(25), 100);
    }

    #[test]
    fn missing_inputs_score_zero() {
        let score = compute_score(&ScoreInputs::default());
        assert_eq!(
            score,
            ScoreRecord {
                ats: 0,
                github: 0,
                badges: 0,
                total: 0
            }
        );
    }

    #[test]
    fn ats_score_is_clamped() {
        let score = compute_score(&ScoreInputs {
            ats_score: Some(140),
            github: None,
            badge_count: 0,
        });
        assert_eq!(score.ats, 100);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let inputs = ScoreInputs {
            ats_score: Some(72),
            github: Some(profile(120, 10, 30, 3)),
            badge_count: 2,
        };
        assert_eq!(compute_score(&inputs), compute_score(&inputs));
    }

    #[test]
    fn total_uses_fixed_weights() {
        // 0.5*80 + 0.3*60 + 0.2*40 = 66
        assert_eq!(total_score(80, 60, 40), 66);
        assert_eq!(total_score(0, 0, 0), 0);
        assert_eq!(total_score(100, 100, 100), 100);
    }
}
