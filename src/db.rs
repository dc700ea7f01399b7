use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{GitHubProfileRecord, ScoreRecord, StudentRow, UserRecord};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery Lee",
            "avery.lee@example.edu",
            "CS",
            2026,
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules Moreno",
            "jules.moreno@example.edu",
            "CS",
            2026,
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara Patel",
            "kiara.patel@example.edu",
            "EE",
            2025,
        ),
        (
            Uuid::parse_str("7b1f3f62-5f41-4a84-9a43-0b2f6f9e1c55")?,
            "Tomas Ruiz",
            "tomas.ruiz@example.edu",
            "EE",
            2025,
        ),
    ];

    for (id, name, email, department, graduation_year) in users {
        sqlx::query(
            r#"
            INSERT INTO ats_leaderboard.users (id, name, email, role, department, graduation_year)
            VALUES ($1, $2, $3, 'student', $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name,
                department = EXCLUDED.department,
                graduation_year = EXCLUDED.graduation_year
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(department)
        .bind(graduation_year)
        .execute(pool)
        .await?;
    }

    let profiles = vec![
        ("avery.lee@example.edu", "averylee", 340, 22, 48, "completed"),
        ("jules.moreno@example.edu", "jmoreno", 0, 0, 0, "failed"),
        ("kiara.patel@example.edu", "kiarap", 85, 6, 12, "completed"),
    ];

    for (email, username, commits, prs, stars, status) in profiles {
        let user_id = user_id_by_email(pool, email).await?;
        sqlx::query(
            r#"
            INSERT INTO ats_leaderboard.github_profiles
            (id, user_id, username, total_commits, total_pull_requests, total_stars,
             languages, sync_status, last_synced_at)
            VALUES ($1, $2, $3, $4, $5, $6, '{"JavaScript","Python"}', $7, now())
            ON CONFLICT (user_id) DO UPDATE
            SET total_commits = EXCLUDED.total_commits,
                total_pull_requests = EXCLUDED.total_pull_requests,
                total_stars = EXCLUDED.total_stars,
                sync_status = EXCLUDED.sync_status,
                last_synced_at = EXCLUDED.last_synced_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(username)
        .bind(commits)
        .bind(prs)
        .bind(stars)
        .bind(status)
        .execute(pool)
        .await?;
    }

    let analyses = vec![
        ("avery.lee@example.edu", 82, NaiveDate::from_ymd_opt(2026, 2, 2)),
        ("jules.moreno@example.edu", 35, NaiveDate::from_ymd_opt(2026, 1, 30)),
        ("kiara.patel@example.edu", 64, NaiveDate::from_ymd_opt(2026, 1, 28)),
    ];

    for (email, ats_score, analyzed_on) in analyses {
        let user_id = user_id_by_email(pool, email).await?;
        let analyzed_on = analyzed_on.context("invalid date")?;
        sqlx::query(
            r#"
            INSERT INTO ats_leaderboard.resume_analyses (id, user_id, ats_score, analyzed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, analyzed_at) DO UPDATE
            SET ats_score = EXCLUDED.ats_score
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(ats_score)
        .bind(analyzed_on.and_hms_opt(9, 0, 0).context("invalid time")?.and_utc())
        .execute(pool)
        .await?;
    }

    let badges = vec![
        ("avery.lee@example.edu", "first-resume"),
        ("avery.lee@example.edu", "github-connected"),
        ("avery.lee@example.edu", "streak-week"),
        ("kiara.patel@example.edu", "first-resume"),
    ];

    for (email, badge) in badges {
        let user_id = user_id_by_email(pool, email).await?;
        sqlx::query(
            r#"
            INSERT INTO ats_leaderboard.badges (id, user_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(badge)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn user_id_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM ats_leaderboard.users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(row.get("id"))
}

pub async fn import_users_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        name: String,
        email: String,
        role: Option<String>,
        department: String,
        graduation_year: i32,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let role = row.role.unwrap_or_else(|| "student".to_string());
        sqlx::query(
            r#"
            INSERT INTO ats_leaderboard.users (id, name, email, role, department, graduation_year)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE
            SET name = EXCLUDED.name,
                role = EXCLUDED.role,
                department = EXCLUDED.department,
                graduation_year = EXCLUDED.graduation_year
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.name)
        .bind(&row.email)
        .bind(&role)
        .bind(&row.department)
        .bind(row.graduation_year)
        .execute(pool)
        .await?;
        imported += 1;
    }

    Ok(imported)
}

pub async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, name, email, department, graduation_year \
         FROM ats_leaderboard.users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        department: row.get("department"),
        graduation_year: row.get("graduation_year"),
    }))
}

pub async fn fetch_all_users(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, name, email, department, graduation_year \
         FROM ats_leaderboard.users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserRecord {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            department: row.get("department"),
            graduation_year: row.get("graduation_year"),
        })
        .collect())
}

pub async fn fetch_github_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<GitHubProfileRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT user_id, username, total_commits, total_pull_requests, total_stars, \
         languages, sync_status, last_synced_at \
         FROM ats_leaderboard.github_profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        let sync_status: String = row.get("sync_status");
        Ok(GitHubProfileRecord {
            user_id: row.get("user_id"),
            username: row.get("username"),
            total_commits: row.get("total_commits"),
            total_pull_requests: row.get("total_pull_requests"),
            total_stars: row.get("total_stars"),
            languages: row.get("languages"),
            sync_status: sync_status
                .parse()
                .map_err(|err: anyhow::Error| sqlx::Error::Decode(err.into()))?,
            last_synced_at: row.get("last_synced_at"),
        })
    })
    .transpose()
}

pub async fn fetch_latest_ats_score(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<i32>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT ats_score FROM ats_leaderboard.resume_analyses \
         WHERE user_id = $1 ORDER BY analyzed_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| row.get("ats_score")))
}

pub async fn fetch_badge_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM ats_leaderboard.badges WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("count"))
}

/// Single-statement replace-or-insert so readers never observe a
/// half-updated score.
pub async fn upsert_score(
    pool: &PgPool,
    user_id: Uuid,
    score: &ScoreRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ats_leaderboard.scores (user_id, ats, github, badges, total, updated_at)
        VALUES ($1, $2, $3, $4, $5, now())
        ON CONFLICT (user_id) DO UPDATE
        SET ats = EXCLUDED.ats,
            github = EXCLUDED.github,
            badges = EXCLUDED.badges,
            total = EXCLUDED.total,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(user_id)
    .bind(score.ats)
    .bind(score.github)
    .bind(score.badges)
    .bind(score.total)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_student_rows(pool: &PgPool) -> anyhow::Result<Vec<StudentRow>> {
    let rows = sqlx::query(
        "SELECT u.department, u.graduation_year, s.ats, s.github, s.badges, s.total \
         FROM ats_leaderboard.users u \
         LEFT JOIN ats_leaderboard.scores s ON s.user_id = u.id \
         WHERE u.role = 'student'",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let total: Option<i32> = row.get("total");
            let score = total.map(|total| ScoreRecord {
                ats: row.get("ats"),
                github: row.get("github"),
                badges: row.get("badges"),
                total,
            });
            StudentRow {
                department: row.get("department"),
                graduation_year: row.get("graduation_year"),
                score,
            }
        })
        .collect())
}

pub async fn count_github_connections(pool: &PgPool) -> anyhow::Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM ats_leaderboard.github_profiles")
        .fetch_one(pool)
        .await?;
    Ok(row.get("count"))
}

/// Profiles whose user row is gone. The foreign key makes this impossible
/// through this schema, but imported data has violated it before.
pub async fn orphaned_github_profiles(pool: &PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT gp.id FROM ats_leaderboard.github_profiles gp \
         LEFT JOIN ats_leaderboard.users u ON u.id = gp.user_id \
         WHERE u.id IS NULL",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("id")).collect())
}
