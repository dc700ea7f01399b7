use std::collections::BTreeMap;

use crate::models::{
    AtRiskCohort, AverageScores, CohortMetrics, Distribution, PlatformSummary, ScoreRecord,
    StudentRow,
};

pub const DEVELOPING_CEILING: i32 = 40;
pub const ADVANCED_FLOOR: i32 = 75;
pub const DEFAULT_AT_RISK_THRESHOLD: u32 = 40;

pub fn platform_summary(rows: &[StudentRow], github_connections: i64) -> PlatformSummary {
    let scores: Vec<ScoreRecord> = rows.iter().filter_map(|row| row.score).collect();
    let engagement_rate = if rows.is_empty() {
        0
    } else {
        (scores.len() as f64 * 100.0 / rows.len() as f64).round() as u32
    };

    PlatformSummary {
        total_users: rows.len(),
        scored_users: scores.len(),
        github_connections,
        engagement_rate,
        average_scores: average_scores(&scores),
    }
}

/// Groups users by (department, graduation year) and rolls each group up.
/// Ordered by department then year so repeated runs print identically.
pub fn cohort_breakdown(rows: &[StudentRow]) -> Vec<CohortMetrics> {
    let mut cohorts: BTreeMap<(String, i32), Vec<&StudentRow>> = BTreeMap::new();
    for row in rows {
        cohorts
            .entry((row.department.clone(), row.graduation_year))
            .or_default()
            .push(row);
    }

    cohorts
        .into_iter()
        .map(|((department, graduation_year), members)| {
            let scores: Vec<ScoreRecord> =
                members.iter().filter_map(|row| row.score).collect();
            CohortMetrics {
                department,
                graduation_year,
                student_count: members.len(),
                scored_count: scores.len(),
                average_scores: average_scores(&scores),
                distribution: distribution(&scores),
            }
        })
        .collect()
}

pub fn at_risk_cohorts(breakdown: &[CohortMetrics], threshold: u32) -> Vec<AtRiskCohort> {
    let mut flagged: Vec<AtRiskCohort> = breakdown
        .iter()
        .filter(|cohort| cohort.distribution.developing > threshold)
        .map(|cohort| AtRiskCohort {
            developing_percentage: cohort.distribution.developing,
            recommendation: recommendation(cohort),
            cohort: cohort.clone(),
        })
        .collect();

    flagged.sort_by(|a, b| {
        b.developing_percentage
            .cmp(&a.developing_percentage)
            .then_with(|| a.cohort.label().cmp(&b.cohort.label()))
    });
    flagged
}

fn recommendation(cohort: &CohortMetrics) -> String {
    format!(
        "{}% of scored students in {} are still developing. \
         Schedule resume review sessions and guided GitHub project work for this cohort.",
        cohort.distribution.developing,
        cohort.label()
    )
}

fn average_scores(scores: &[ScoreRecord]) -> AverageScores {
    if scores.is_empty() {
        return AverageScores {
            ats: 0.0,
            github: 0.0,
            badges: 0.0,
            total: 0.0,
        };
    }

    let n = scores.len() as f64;
    let mean = |pick: fn(&ScoreRecord) -> i32| {
        round1(scores.iter().map(|s| pick(s) as f64).sum::<f64>() / n)
    };

    AverageScores {
        ats: mean(|s| s.ats),
        github: mean(|s| s.github),
        badges: mean(|s| s.badges),
        total: mean(|s| s.total),
    }
}

/// Buckets scored students by total score and converts counts to integer
/// percentages that sum to exactly 100. The rounding residual lands on the
/// largest bucket; among equally large buckets the earliest of
/// developing/progressing/advanced takes it.
fn distribution(scores: &[ScoreRecord]) -> Distribution {
    if scores.is_empty() {
        return Distribution {
            developing: 0,
            progressing: 0,
            advanced: 0,
        };
    }

    let mut counts = [0usize; 3];
    for score in scores {
        if score.total < DEVELOPING_CEILING {
            counts[0] += 1;
        } else if score.total < ADVANCED_FLOOR {
            counts[1] += 1;
        } else {
            counts[2] += 1;
        }
    }

    let n = scores.len() as f64;
    let mut pcts: Vec<i64> = counts
        .iter()
        .map(|&count| (count as f64 * 100.0 / n).round() as i64)
        .collect();

    let residual = 100 - pcts.iter().sum::<i64>();
    if residual != 0 {
        let largest = (0..3usize)
            .max_by_key(|&i| (counts[i], std::cmp::Reverse(i)))
            .unwrap_or(0);
        pcts[largest] += residual;
    }

    Distribution {
        developing: pcts[0] as u32,
        progressing: pcts[1] as u32,
        advanced: pcts[2] as u32,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(department: &str, year: i32, total: i32) -> StudentRow {
        StudentRow {
            department: department.to_string(),
            graduation_year: year,
            score: Some(ScoreRecord {
                ats: total,
                github: total,
                badges: total,
                total,
            }),
        }
    }

    fn unscored(department: &str, year: i32) -> StudentRow {
        StudentRow {
            department: department.to_string(),
            graduation_year: year,
            score: None,
        }
    }

    #[test]
    fn engagement_rate_counts_all_users_in_denominator() {
        let rows = vec![
            scored("CS", 2026, 50),
            unscored("CS", 2026),
            unscored("CS", 2026),
            unscored("CS", 2026),
        ];
        let summary = platform_summary(&rows, 1);
        assert_eq!(summary.total_users, 4);
        assert_eq!(summary.scored_users, 1);
        assert_eq!(summary.engagement_rate, 25);
    }

    #[test]
    fn empty_platform_yields_zeroes() {
        let summary = platform_summary(&[], 0);
        assert_eq!(summary.total_users, 0);
        assert_eq!(summary.engagement_rate, 0);
        assert_eq!(summary.average_scores.total, 0.0);
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let rows = vec![
            scored("CS", 2026, 30),
            scored("CS", 2026, 80),
            scored("CS", 2026, 80),
        ];
        let summary = platform_summary(&rows, 0);
        // (30 + 80 + 80) / 3 = 63.333...
        assert_eq!(summary.average_scores.total, 63.3);
    }

    #[test]
    fn cs_2026_scenario_splits_fifty_fifty() {
        let rows = vec![scored("CS", 2026, 30), scored("CS", 2026, 80)];
        let breakdown = cohort_breakdown(&rows);
        assert_eq!(breakdown.len(), 1);
        let cohort = &breakdown[0];
        assert_eq!(cohort.average_scores.total, 55.0);
        assert_eq!(cohort.distribution.developing, 50);
        assert_eq!(cohort.distribution.progressing, 0);
        assert_eq!(cohort.distribution.advanced, 50);
    }

    #[test]
    fn bucket_boundaries_are_inclusive_on_lower_bound() {
        let rows = vec![
            scored("CS", 2026, 39),
            scored("CS", 2026, 40),
            scored("CS", 2026, 74),
            scored("CS", 2026, 75),
        ];
        let cohort = &cohort_breakdown(&rows)[0];
        assert_eq!(cohort.distribution.developing, 25);
        assert_eq!(cohort.distribution.progressing, 50);
        assert_eq!(cohort.distribution.advanced, 25);
    }

    #[test]
    fn distribution_always_sums_to_one_hundred() {
        // one student per bucket rounds to 33/33/33; residual goes to the
        // first of the tied buckets
        let rows = vec![
            scored("CS", 2026, 10),
            scored("CS", 2026, 50),
            scored("CS", 2026, 90),
        ];
        let d = cohort_breakdown(&rows)[0].distribution;
        assert_eq!(d.developing, 34);
        assert_eq!(d.progressing, 33);
        assert_eq!(d.advanced, 33);
        assert_eq!(d.developing + d.progressing + d.advanced, 100);
    }

    #[test]
    fn distribution_overshoot_is_pulled_from_largest_bucket() {
        // 1/1/4 of 6 rounds to 17/17/67; the largest bucket absorbs the -1
        let mut rows = vec![scored("CS", 2026, 10), scored("CS", 2026, 50)];
        rows.extend((0..4).map(|_| scored("CS", 2026, 90)));
        let d = cohort_breakdown(&rows)[0].distribution;
        assert_eq!((d.developing, d.progressing, d.advanced), (17, 17, 66));
    }

    #[test]
    fn unscored_students_count_toward_cohort_size_only() {
        let rows = vec![scored("CS", 2026, 80), unscored("CS", 2026)];
        let cohort = &cohort_breakdown(&rows)[0];
        assert_eq!(cohort.student_count, 2);
        assert_eq!(cohort.scored_count, 1);
        assert_eq!(cohort.distribution.advanced, 100);
    }

    #[test]
    fn cohort_with_no_scores_reports_zero_distribution() {
        let rows = vec![unscored("EE", 2027)];
        let cohort = &cohort_breakdown(&rows)[0];
        assert_eq!(cohort.scored_count, 0);
        let d = cohort.distribution;
        assert_eq!((d.developing, d.progressing, d.advanced), (0, 0, 0));
    }

    #[test]
    fn breakdown_is_ordered_by_department_then_year() {
        let rows = vec![
            scored("ME", 2025, 50),
            scored("CS", 2027, 50),
            scored("CS", 2026, 50),
        ];
        let labels: Vec<String> = cohort_breakdown(&rows)
            .iter()
            .map(|c| c.label())
            .collect();
        assert_eq!(labels, vec!["CS 2026", "CS 2027", "ME 2025"]);
    }

    #[test]
    fn at_risk_is_a_sorted_subset_of_the_breakdown() {
        let mut rows = Vec::new();
        // CS 2026: 100% developing
        rows.push(scored("CS", 2026, 10));
        // EE 2026: 50% developing
        rows.push(scored("EE", 2026, 10));
        rows.push(scored("EE", 2026, 90));
        // ME 2025: 0% developing
        rows.push(scored("ME", 2025, 90));

        let breakdown = cohort_breakdown(&rows);
        let flagged = at_risk_cohorts(&breakdown, DEFAULT_AT_RISK_THRESHOLD);

        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].cohort.label(), "CS 2026");
        assert_eq!(flagged[0].developing_percentage, 100);
        assert_eq!(flagged[1].cohort.label(), "EE 2026");
        assert!(flagged
            .iter()
            .all(|f| breakdown.iter().any(|c| c.label() == f.cohort.label())));
    }

    #[test]
    fn threshold_is_exclusive() {
        let rows = vec![
            scored("CS", 2026, 10),
            scored("CS", 2026, 10),
            scored("CS", 2026, 90),
            scored("CS", 2026, 90),
            scored("CS", 2026, 90),
        ];
        let breakdown = cohort_breakdown(&rows);
        assert_eq!(breakdown[0].distribution.developing, 40);
        assert!(at_risk_cohorts(&breakdown, 40).is_empty());
        assert_eq!(at_risk_cohorts(&breakdown, 39).len(), 1);
    }

    #[test]
    fn at_risk_ties_break_on_cohort_label() {
        let rows = vec![scored("EE", 2026, 10), scored("CS", 2026, 10)];
        let flagged = at_risk_cohorts(&cohort_breakdown(&rows), 40);
        assert_eq!(flagged.len(), 2);
        assert_eq!(flagged[0].cohort.label(), "CS 2026");
        assert_eq!(flagged[1].cohort.label(), "EE 2026");
    }
}
