/// Task matching for volunteers
///
/// Ranks open, unassigned tasks by how well their skills overlap a
/// volunteer's declared skills:
///
/// ```text
/// match_pct = min(99, round(overlap / max(task_skills, 1) * 80 + bonus))
/// bonus     = uniform integer in [10, 20]
/// ```
///
/// The bonus keeps equally-matched tasks from always ranking the same way.
/// Sorting is stable, so ties keep their newest-first arrival order.

use crate::models::skill::Skill;
use crate::models::task::{Task, TaskSummary};
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Mutex;

/// Highest score a task can get
pub const MAX_MATCH_PCT: u32 = 99;

/// Weight of full skill coverage before the bonus
const OVERLAP_WEIGHT: f64 = 80.0;

/// A task with its match score
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTask {
    #[serde(flatten)]
    pub task: TaskSummary,
    pub match_pct: u32,
}

/// Score for one task given the overlap and a drawn bonus
pub fn match_pct(overlap: usize, task_skill_count: usize, bonus: u32) -> u32 {
    let coverage = overlap as f64 / task_skill_count.max(1) as f64;
    let raw = (coverage * OVERLAP_WEIGHT + bonus as f64).round() as u32;
    raw.min(MAX_MATCH_PCT)
}

/// Scores and ranks tasks against a volunteer's skills
///
/// One bonus is drawn per task, in input order.
pub fn score_tasks<R: Rng + ?Sized>(
    volunteer_skills: &[String],
    tasks: Vec<TaskSummary>,
    rng: &mut R,
) -> Vec<ScoredTask> {
    let mine: HashSet<&str> = volunteer_skills.iter().map(String::as_str).collect();

    let mut scored: Vec<ScoredTask> = tasks
        .into_iter()
        .map(|task| {
            let overlap = task
                .skills
                .iter()
                .filter(|skill| mine.contains(skill.as_str()))
                .count();
            let bonus = rng.gen_range(10..=20);
            ScoredTask {
                match_pct: match_pct(overlap, task.skills.len(), bonus),
                task,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.match_pct.cmp(&a.match_pct));
    scored
}

/// Ranks every open, unassigned task for a volunteer
///
/// An unknown volunteer has no skills, so every task scores on bonus alone.
/// The RNG lock is only held while scoring.
pub async fn match_tasks_for<R: Rng>(
    pool: &SqlitePool,
    user_id: i64,
    rng: &Mutex<R>,
) -> Result<Vec<ScoredTask>, sqlx::Error> {
    let volunteer_skills = {
        let mut conn = pool.acquire().await?;
        Skill::names_for_user(&mut conn, user_id).await?
    };
    let tasks = Task::list_open_unassigned(pool).await?;

    tracing::debug!(
        user_id,
        skills = volunteer_skills.len(),
        candidates = tasks.len(),
        "Scoring open tasks"
    );

    let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(score_tasks(&volunteer_skills, tasks, &mut *rng))
}
