use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AtRiskCohort, CohortMetrics, PlatformSummary};

pub fn build_report(
    generated_on: NaiveDate,
    summary: &PlatformSummary,
    breakdown: &[CohortMetrics],
    at_risk: &[AtRiskCohort],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# ATS Leaderboard Admin Report");
    let _ = writeln!(output, "Generated on {generated_on}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Platform");
    let _ = writeln!(output, "- Users: {}", summary.total_users);
    let _ = writeln!(output, "- Scored users: {}", summary.scored_users);
    let _ = writeln!(output, "- GitHub connections: {}", summary.github_connections);
    let _ = writeln!(output, "- Engagement rate: {}%", summary.engagement_rate);
    let _ = writeln!(
        output,
        "- Average scores: total {:.1} (ats {:.1}, github {:.1}, badges {:.1})",
        summary.average_scores.total,
        summary.average_scores.ats,
        summary.average_scores.github,
        summary.average_scores.badges
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cohorts");

    if breakdown.is_empty() {
        let _ = writeln!(output, "No cohorts to report.");
    } else {
        for cohort in breakdown {
            let _ = writeln!(
                output,
                "- {}: {} students ({} scored), avg total {:.1}, \
                 developing {}% / progressing {}% / advanced {}%",
                cohort.label(),
                cohort.student_count,
                cohort.scored_count,
                cohort.average_scores.total,
                cohort.distribution.developing,
                cohort.distribution.progressing,
                cohort.distribution.advanced
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## At-Risk Cohorts");

    if at_risk.is_empty() {
        let _ = writeln!(output, "No cohorts above the developing threshold.");
    } else {
        for flagged in at_risk {
            let _ = writeln!(
                output,
                "- {} ({}% developing): {}",
                flagged.cohort.label(),
                flagged.developing_percentage,
                flagged.recommendation
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{at_risk_cohorts, cohort_breakdown, platform_summary};
    use crate::models::{ScoreRecord, StudentRow};

    #[test]
    fn empty_platform_renders_without_error() {
        let summary = platform_summary(&[], 0);
        let report = build_report(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            &summary,
            &[],
            &[],
        );
        assert!(report.contains("No cohorts to report."));
        assert!(report.contains("No cohorts above the developing threshold."));
        assert!(report.contains("Engagement rate: 0%"));
    }

    #[test]
    fn at_risk_cohorts_appear_with_recommendations() {
        let rows = vec![StudentRow {
            department: "CS".to_string(),
            graduation_year: 2026,
            score: Some(ScoreRecord {
                ats: 20,
                github: 10,
                badges: 0,
                total: 16,
            }),
        }];
        let summary = platform_summary(&rows, 0);
        let breakdown = cohort_breakdown(&rows);
        let at_risk = at_risk_cohorts(&breakdown, 40);
        let report = build_report(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            &summary,
            &breakdown,
            &at_risk,
        );
        assert!(report.contains("CS 2026 (100% developing)"));
        assert!(report.contains("resume review"));
    }
}
