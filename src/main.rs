use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod analytics;
mod db;
mod error;
mod models;
mod report;
mod score;
mod sync;

#[derive(Parser)]
#[command(name = "ats-leaderboard")]
#[command(about = "Score sync and cohort analytics for the ATS Leaderboard platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Register users in bulk from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Recalculate every user's score
    SyncAll,
    /// Print the platform-wide summary
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Print per-cohort averages and score distribution
    Cohorts,
    /// Print cohorts whose developing share exceeds the threshold
    AtRisk {
        #[arg(long, default_value_t = analytics::DEFAULT_AT_RISK_THRESHOLD)]
        threshold: u32,
    },
    /// Generate a markdown admin report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let imported = db::import_users_csv(&pool, &csv).await?;
            println!("Imported {imported} users from {}.", csv.display());
        }
        Commands::SyncAll => {
            let report = sync::sync_all(&pool).await?;
            println!(
                "Sync finished: {} attempted, {} succeeded, {} failed.",
                report.attempted,
                report.succeeded,
                report.failed()
            );
            for failure in &report.failures {
                println!("- {}: {}", failure.user_id, failure.reason);
            }
            if report.consistency_defects > 0 {
                println!(
                    "{} consistency defect(s) found; see the log for details.",
                    report.consistency_defects
                );
            }
            if report.all_failed() {
                anyhow::bail!("every user failed to sync");
            }
        }
        Commands::Summary { json } => {
            let rows = db::fetch_student_rows(&pool).await?;
            let connections = db::count_github_connections(&pool).await?;
            let summary = analytics::platform_summary(&rows, connections);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} users, {} scored ({}% engagement), {} GitHub connections",
                    summary.total_users,
                    summary.scored_users,
                    summary.engagement_rate,
                    summary.github_connections
                );
                println!(
                    "Average scores: total {:.1}, ats {:.1}, github {:.1}, badges {:.1}",
                    summary.average_scores.total,
                    summary.average_scores.ats,
                    summary.average_scores.github,
                    summary.average_scores.badges
                );
            }
        }
        Commands::Cohorts => {
            let rows = db::fetch_student_rows(&pool).await?;
            let breakdown = analytics::cohort_breakdown(&rows);

            if breakdown.is_empty() {
                println!("No cohorts found.");
                return Ok(());
            }

            for cohort in &breakdown {
                println!(
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
        Commands::AtRisk { threshold } => {
            let rows = db::fetch_student_rows(&pool).await?;
            let breakdown = analytics::cohort_breakdown(&rows);
            let flagged = analytics::at_risk_cohorts(&breakdown, threshold);

            if flagged.is_empty() {
                println!("No cohorts above {threshold}% developing.");
                return Ok(());
            }

            println!("At-risk cohorts (developing share over {threshold}%):");
            for entry in &flagged {
                println!(
                    "- {} ({}% developing): {}",
                    entry.cohort.label(),
                    entry.developing_percentage,
                    entry.recommendation
                );
            }
        }
        Commands::Report { out } => {
            let rows = db::fetch_student_rows(&pool).await?;
            let connections = db::count_github_connections(&pool).await?;
            let summary = analytics::platform_summary(&rows, connections);
            let breakdown = analytics::cohort_breakdown(&rows);
            let flagged =
                analytics::at_risk_cohorts(&breakdown, analytics::DEFAULT_AT_RISK_THRESHOLD);
            let report = report::build_report(
                Utc::now().date_naive(),
                &summary,
                &breakdown,
                &flagged,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
