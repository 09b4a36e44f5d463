/// Impact reports and impact aggregation
///
/// An impact report records a measurable outcome of volunteering. One is
/// written automatically when a task is completed; seed data adds a few
/// manual ones.
///
/// Aggregates come in two shapes:
///
/// - per user: summed metrics plus the raw reports, newest first
/// - community: summed metrics over every report, distinct volunteer count and
///   a top-5 leaderboard by summed hours
///
/// Sums over an empty set are zero, never NULL.
///
/// # Example
///
/// ```no_run
/// use volunhub_shared::models::impact_report::ImpactReport;
/// # use sqlx::SqlitePool;
/// # async fn example(pool: SqlitePool) -> Result<(), sqlx::Error> {
/// let mine = ImpactReport::user_impact(&pool, 2).await?;
/// println!("{} hours over {} reports", mine.totals.total_hours, mine.totals.total_reports);
///
/// let everyone = ImpactReport::community_impact(&pool).await?;
/// println!("{} volunteers", everyone.totals.total_volunteers);
/// # Ok(())
/// # }
/// ```

use crate::db::sql_timestamp;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// Carbon saved per volunteered hour (kg)
pub const CARBON_KG_PER_HOUR: f64 = 0.4;

/// Stored impact report joined with its task title
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ImpactReport {
    pub id: i64,
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub hours_logged: f64,
    pub items_fixed: i64,
    pub bags_collected: i64,
    pub people_helped: i64,
    pub carbon_saved_kg: f64,
    pub notes: String,
    pub created_at: NaiveDateTime,
    pub task_title: Option<String>,
}

/// Input for recording a report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateImpactReport {
    pub user_id: i64,
    pub task_id: Option<i64>,
    pub hours_logged: f64,
    pub items_fixed: i64,
    pub bags_collected: i64,
    pub people_helped: i64,
    pub carbon_saved_kg: f64,
    pub notes: String,
}

impl CreateImpactReport {
    /// Report derived from a completed task
    ///
    /// `hours = duration / 60`, one person helped, carbon at 0.4 kg per hour
    /// rounded to two decimals.
    pub fn for_completed_task(user_id: i64, task_id: i64, duration_minutes: i64, notes: &str) -> Self {
        let hours = duration_minutes as f64 / 60.0;
        Self {
            user_id,
            task_id: Some(task_id),
            hours_logged: hours,
            people_helped: 1,
            carbon_saved_kg: round2(hours * CARBON_KG_PER_HOUR),
            notes: notes.to_string(),
            ..Default::default()
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-user sums
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserImpactTotals {
    pub total_hours: f64,
    pub total_items_fixed: i64,
    pub total_bags: i64,
    pub total_people: i64,
    pub total_carbon: f64,
    pub total_reports: i64,
}

/// Community-wide sums
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommunityImpactTotals {
    pub total_hours: f64,
    pub total_items_fixed: i64,
    pub total_bags: i64,
    pub total_people: i64,
    pub total_carbon: f64,
    pub total_volunteers: i64,
}

/// Leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopVolunteer {
    pub user_id: i64,
    pub name: String,
    pub avatar_initials: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserImpact {
    pub reports: Vec<ImpactReport>,
    pub totals: UserImpactTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunityImpact {
    pub totals: CommunityImpactTotals,
    pub top_volunteers: Vec<TopVolunteer>,
}

const LEADERBOARD_SIZE: i64 = 5;

impl ImpactReport {
    /// Records a report and returns its id
    pub async fn create(
        conn: &mut SqliteConnection,
        data: &CreateImpactReport,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO impact_reports (user_id, task_id, hours_logged, items_fixed, bags_collected,
                                        people_helped, carbon_saved_kg, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.user_id)
        .bind(data.task_id)
        .bind(data.hours_logged)
        .bind(data.items_fixed)
        .bind(data.bags_collected)
        .bind(data.people_helped)
        .bind(data.carbon_saved_kg)
        .bind(&data.notes)
        .bind(sql_timestamp(chrono::Utc::now().naive_utc()))
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Reports written for a task
    pub async fn list_for_task(pool: &SqlitePool, task_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ImpactReport>(
            r#"
            SELECT ir.id, ir.user_id, ir.task_id, ir.hours_logged, ir.items_fixed, ir.bags_collected,
                   ir.people_helped, ir.carbon_saved_kg, ir.notes, ir.created_at,
                   t.title AS task_title
            FROM impact_reports ir
            LEFT JOIN tasks t ON ir.task_id = t.id
            WHERE ir.task_id = ?
            ORDER BY ir.id
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// A user's reports (newest first) and their sums
    pub async fn user_impact(pool: &SqlitePool, user_id: i64) -> Result<UserImpact, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let reports = sqlx::query_as::<_, ImpactReport>(
            r#"
            SELECT ir.id, ir.user_id, ir.task_id, ir.hours_logged, ir.items_fixed, ir.bags_collected,
                   ir.people_helped, ir.carbon_saved_kg, ir.notes, ir.created_at,
                   t.title AS task_title
            FROM impact_reports ir
            LEFT JOIN tasks t ON ir.task_id = t.id
            WHERE ir.user_id = ?
            ORDER BY ir.created_at DESC, ir.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let totals = sqlx::query_as::<_, UserImpactTotals>(
            r#"
            SELECT
                COALESCE(SUM(hours_logged), 0.0) AS total_hours,
                COALESCE(SUM(items_fixed), 0) AS total_items_fixed,
                COALESCE(SUM(bags_collected), 0) AS total_bags,
                COALESCE(SUM(people_helped), 0) AS total_people,
                COALESCE(SUM(carbon_saved_kg), 0.0) AS total_carbon,
                COUNT(*) AS total_reports
            FROM impact_reports
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(UserImpact { reports, totals })
    }

    /// Sums over every report plus the top-5 volunteers by hours
    pub async fn community_impact(pool: &SqlitePool) -> Result<CommunityImpact, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let totals = sqlx::query_as::<_, CommunityImpactTotals>(
            r#"
            SELECT
                COALESCE(SUM(hours_logged), 0.0) AS total_hours,
                COALESCE(SUM(items_fixed), 0) AS total_items_fixed,
                COALESCE(SUM(bags_collected), 0) AS total_bags,
                COALESCE(SUM(people_helped), 0) AS total_people,
                COALESCE(SUM(carbon_saved_kg), 0.0) AS total_carbon,
                COUNT(DISTINCT user_id) AS total_volunteers
            FROM impact_reports
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        let top_volunteers = sqlx::query_as::<_, TopVolunteer>(
            r#"
            SELECT u.id AS user_id, u.name, u.avatar_initials,
                   COALESCE(SUM(ir.hours_logged), 0.0) AS hours
            FROM impact_reports ir
            JOIN users u ON ir.user_id = u.id
            GROUP BY ir.user_id
            ORDER BY hours DESC, u.id
            LIMIT ?
            "#,
        )
        .bind(LEADERBOARD_SIZE)
        .fetch_all(&mut *conn)
        .await?;

        Ok(CommunityImpact {
            totals,
            top_volunteers,
        })
    }
}
