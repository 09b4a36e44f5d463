/// Integration tests for the task lifecycle, impact aggregation and matching
///
/// Each test runs against its own in-memory database with the skill
/// vocabulary but no sample data.

use chrono::{Duration, Utc};
use rand::{rngs::StdRng, SeedableRng};
use sqlx::SqlitePool;
use std::sync::Mutex;
use volunhub_shared::db::migrations::run_migrations;
use volunhub_shared::db::pool::{create_pool, DatabaseConfig};
use volunhub_shared::db::seed::seed_if_empty;
use volunhub_shared::db::sql_timestamp;
use volunhub_shared::lifecycle::{CompleteTask, CreateTask, LifecycleError, TaskLifecycle};
use volunhub_shared::matching::match_tasks_for;
use volunhub_shared::models::impact_report::ImpactReport;
use volunhub_shared::models::skill::Skill;
use volunhub_shared::models::task::{NewTask, Task, TaskFilter, TaskStatus};
use volunhub_shared::models::user::{CreateUser, User};
use volunhub_shared::quota::DailyPostQuota;

async fn setup() -> (SqlitePool, TaskLifecycle) {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Migrations failed");
    seed_if_empty(&pool, false).await.expect("Seed failed");

    let lifecycle = TaskLifecycle::new(pool.clone(), DailyPostQuota::new(5));
    (pool, lifecycle)
}

async fn user(pool: &SqlitePool, name: &str, email: &str) -> User {
    User::create(pool, CreateUser::new(name, email))
        .await
        .expect("Failed to create user")
}

async fn give_skills(pool: &SqlitePool, user_id: i64, names: &[&str]) {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    let mut conn = pool.acquire().await.unwrap();
    Skill::replace_for_user(&mut conn, user_id, &names)
        .await
        .expect("Failed to set skills");
}

async fn find(pool: &SqlitePool, task_id: i64) -> Task {
    let mut conn = pool.acquire().await.unwrap();
    Task::find_by_id(&mut conn, task_id)
        .await
        .unwrap()
        .expect("task should exist")
}

async fn find_user(pool: &SqlitePool, user_id: i64) -> User {
    let mut conn = pool.acquire().await.unwrap();
    User::find_by_id(&mut conn, user_id)
        .await
        .unwrap()
        .expect("user should exist")
}

fn task_input(poster: i64, title: &str, description: &str) -> CreateTask {
    CreateTask {
        task: NewTask {
            title: title.to_string(),
            description: description.to_string(),
            posted_by: poster,
            duration_minutes: 60,
            location_address: "1 High Street".to_string(),
            city: "London".to_string(),
            latitude: 51.5072,
            longitude: -0.1276,
            scheduled_date: "2026-11-01".to_string(),
            scheduled_time: "10:00".to_string(),
        },
        skills: Vec::new(),
    }
}

fn with_skills(mut input: CreateTask, skills: &[&str]) -> CreateTask {
    input.skills = skills.iter().map(|s| s.to_string()).collect();
    input
}

fn with_duration(mut input: CreateTask, minutes: i64) -> CreateTask {
    input.task.duration_minutes = minutes;
    input
}

fn with_city(mut input: CreateTask, city: &str) -> CreateTask {
    input.task.city = city.to_string();
    input
}

#[tokio::test]
async fn test_create_tags_empty_skill_list() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;

    let created = lifecycle
        .create(task_input(poster.id, "Help with garden cleanup", "need lawn mowing help"))
        .await
        .expect("create failed");

    assert!(created.ai_suggested_skills.contains(&"Gardening".to_string()));
    assert!(created.task.skills.contains(&"Gardening".to_string()));
    assert_eq!(created.task.task.status, TaskStatus::Open);
    assert_eq!(created.task.task.assigned_to, None);
    assert!(!created.task.task.is_verified);
    assert_eq!(created.task.poster_name, "Pat Poster");
    assert_eq!(created.task.poster_initials, "PP");
}

#[tokio::test]
async fn test_create_keeps_explicit_skills_and_ignores_unknown() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;

    let input = with_skills(
        task_input(poster.id, "Garden day", "weeding"),
        &["Cooking", "Juggling"],
    );
    let created = lifecycle.create(input).await.expect("create failed");

    // Explicit list wins over suggestions; only vocabulary names are linked
    assert_eq!(created.ai_suggested_skills, vec!["Cooking", "Juggling"]);
    assert_eq!(created.task.skills, vec!["Cooking"]);
}

#[tokio::test]
async fn test_create_rejects_unknown_poster() {
    let (_pool, lifecycle) = setup().await;

    let result = lifecycle.create(task_input(404, "Anything", "")).await;
    assert!(matches!(result, Err(LifecycleError::UserNotFound(404))));
}

#[tokio::test]
async fn test_sixth_post_in_a_day_is_rate_limited() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Busy Poster", "busy@example.com").await;

    for i in 0..5 {
        lifecycle
            .create(task_input(poster.id, &format!("Task {i}"), ""))
            .await
            .expect("posts under the limit should succeed");
    }

    match lifecycle.create(task_input(poster.id, "Task 6", "")).await {
        Err(LifecycleError::RateLimited {
            posts_today,
            daily_limit,
        }) => {
            assert_eq!(posts_today, 5);
            assert_eq!(daily_limit, 5);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }

    let limit = lifecycle.posting_limit(poster.id).await.unwrap();
    assert_eq!(limit.posts_today, 5);
    assert_eq!(limit.remaining, 0);
    assert!(!limit.can_post);

    // Nothing was written by the rejected call
    let posted = Task::list_posted_by(&pool, poster.id).await.unwrap();
    assert_eq!(posted.len(), 5);
}

#[tokio::test]
async fn test_post_allowed_again_once_oldest_ages_out() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Busy Poster", "busy@example.com").await;

    let mut ids = Vec::new();
    for i in 0..5 {
        let created = lifecycle
            .create(task_input(poster.id, &format!("Task {i}"), ""))
            .await
            .unwrap();
        ids.push(created.task.task.id);
    }
    assert!(lifecycle.create(task_input(poster.id, "Blocked", "")).await.is_err());

    let aged = sql_timestamp(Utc::now().naive_utc() - Duration::hours(25));
    sqlx::query("UPDATE tasks SET created_at = ? WHERE id = ?")
        .bind(aged)
        .bind(ids[0])
        .execute(&pool)
        .await
        .unwrap();

    lifecycle
        .create(task_input(poster.id, "Allowed again", ""))
        .await
        .expect("aged-out post should free a slot");
}

#[tokio::test]
async fn test_window_is_rolling_not_calendar() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Busy Poster", "busy@example.com").await;
    let start = Utc::now().naive_utc();

    for i in 0..5 {
        lifecycle
            .create_at(task_input(poster.id, &format!("Task {i}"), ""), start)
            .await
            .unwrap();
    }

    // 23 hours later all five still count
    let later = start + Duration::hours(23);
    assert!(matches!(
        lifecycle.create_at(task_input(poster.id, "Too soon", ""), later).await,
        Err(LifecycleError::RateLimited { .. })
    ));

    // 25 hours later none do
    let much_later = start + Duration::hours(25);
    lifecycle
        .create_at(task_input(poster.id, "Fine now", ""), much_later)
        .await
        .expect("window should have rolled");
}

#[tokio::test]
async fn test_volunteer_holds_one_task_at_a_time() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let volunteer = user(&pool, "Vera Volunteer", "vera@example.com").await;

    let first = lifecycle.create(task_input(poster.id, "First", "")).await.unwrap();
    let second = lifecycle.create(task_input(poster.id, "Second", "")).await.unwrap();
    let first_id = first.task.task.id;
    let second_id = second.task.task.id;

    let accepted = lifecycle.accept(first_id, volunteer.id).await.unwrap();
    assert_eq!(accepted.status, TaskStatus::Accepted);
    assert_eq!(accepted.assigned_to, Some(volunteer.id));

    let blocked = lifecycle.accept(second_id, volunteer.id).await;
    assert!(matches!(blocked, Err(LifecycleError::ActiveTaskExists { .. })));

    // The rejected accept left the second task untouched
    let untouched = find(&pool, second_id).await;
    assert_eq!(untouched.status, TaskStatus::Open);
    assert_eq!(untouched.assigned_to, None);

    let active = lifecycle.active_for(volunteer.id).await.unwrap();
    assert_eq!(active.count, 1);
    assert!(active.has_active);

    lifecycle
        .complete(first_id, CompleteTask::default())
        .await
        .unwrap();

    let now_free = lifecycle.accept(second_id, volunteer.id).await.unwrap();
    assert_eq!(now_free.status, TaskStatus::Accepted);
}

#[tokio::test]
async fn test_accept_rejections() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let vera = user(&pool, "Vera Volunteer", "vera@example.com").await;
    let will = user(&pool, "Will Helper", "will@example.com").await;

    let task = lifecycle.create(task_input(poster.id, "Only one", "")).await.unwrap();
    let task_id = task.task.task.id;
    lifecycle.accept(task_id, vera.id).await.unwrap();

    assert!(matches!(
        lifecycle.accept(task_id, will.id).await,
        Err(LifecycleError::TaskNotOpen(id)) if id == task_id
    ));
    assert!(matches!(
        lifecycle.accept(9999, will.id).await,
        Err(LifecycleError::TaskNotFound(9999))
    ));
    assert!(matches!(
        lifecycle.accept(task_id, 9999).await,
        Err(LifecycleError::UserNotFound(9999))
    ));
}

#[tokio::test]
async fn test_completion_records_impact_and_stats() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let volunteer = user(&pool, "Vera Volunteer", "vera@example.com").await;

    let task = lifecycle
        .create(with_duration(task_input(poster.id, "Long job", ""), 90))
        .await
        .unwrap();
    let task_id = task.task.task.id;
    lifecycle.accept(task_id, volunteer.id).await.unwrap();

    let done = lifecycle
        .complete(
            task_id,
            CompleteTask {
                completion_photo: Some("photo.jpg".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("complete failed");

    assert_eq!(done.completed_by, volunteer.id);
    assert_eq!(done.hours_logged, 1.5);
    assert_eq!(done.carbon_saved_kg, 0.6);

    let stored = find(&pool, task_id).await;
    assert_eq!(stored.status, TaskStatus::Completed);
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.completion_photo, "photo.jpg");
    assert_eq!(stored.completion_notes, "Task completed");

    let reports = ImpactReport::list_for_task(&pool, task_id).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].user_id, volunteer.id);
    assert_eq!(reports[0].hours_logged, 1.5);
    assert_eq!(reports[0].people_helped, 1);
    assert_eq!(reports[0].notes, "Task completed");

    let after = find_user(&pool, volunteer.id).await;
    assert_eq!(after.total_hours, volunteer.total_hours + 1.5);
    assert_eq!(after.tasks_completed, volunteer.tasks_completed + 1);

    let again = lifecycle.complete(task_id, CompleteTask::default()).await;
    assert!(matches!(again, Err(LifecycleError::TaskAlreadyCompleted(_))));
    assert_eq!(ImpactReport::list_for_task(&pool, task_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_open_task_completed_by_poster_gets_assigned() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;

    let task = lifecycle.create(task_input(poster.id, "Quick one", "")).await.unwrap();
    let task_id = task.task.task.id;

    let done = lifecycle
        .complete(
            task_id,
            CompleteTask {
                completion_notes: Some("Did it myself".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(done.completed_by, poster.id);

    let stored = find(&pool, task_id).await;
    assert_eq!(stored.assigned_to, Some(poster.id));
    assert_eq!(stored.completion_notes, "Did it myself");
}

#[tokio::test]
async fn test_unknown_actor_writes_nothing() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;

    let task = lifecycle.create(task_input(poster.id, "Quick one", "")).await.unwrap();
    let task_id = task.task.task.id;

    let result = lifecycle
        .complete(
            task_id,
            CompleteTask {
                user_id: Some(777),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(LifecycleError::UserNotFound(777))));

    assert_eq!(find(&pool, task_id).await.status, TaskStatus::Open);
    assert!(ImpactReport::list_for_task(&pool, task_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_complete_unknown_task() {
    let (_pool, lifecycle) = setup().await;

    let result = lifecycle.complete(31337, CompleteTask::default()).await;
    assert!(matches!(result, Err(LifecycleError::TaskNotFound(31337))));
}

#[tokio::test]
async fn test_impact_totals_are_zero_without_reports() {
    let (pool, _lifecycle) = setup().await;
    let volunteer = user(&pool, "Vera Volunteer", "vera@example.com").await;

    let mine = ImpactReport::user_impact(&pool, volunteer.id).await.unwrap();
    assert!(mine.reports.is_empty());
    assert_eq!(mine.totals.total_hours, 0.0);
    assert_eq!(mine.totals.total_items_fixed, 0);
    assert_eq!(mine.totals.total_bags, 0);
    assert_eq!(mine.totals.total_people, 0);
    assert_eq!(mine.totals.total_carbon, 0.0);
    assert_eq!(mine.totals.total_reports, 0);

    let everyone = ImpactReport::community_impact(&pool).await.unwrap();
    assert_eq!(everyone.totals.total_hours, 0.0);
    assert_eq!(everyone.totals.total_volunteers, 0);
    assert!(everyone.top_volunteers.is_empty());
}

#[tokio::test]
async fn test_community_leaderboard_orders_by_hours() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let vera = user(&pool, "Vera Volunteer", "vera@example.com").await;
    let will = user(&pool, "Will Helper", "will@example.com").await;

    let short = lifecycle
        .create(with_duration(task_input(poster.id, "Short", ""), 30))
        .await
        .unwrap();
    let long = lifecycle
        .create(with_duration(task_input(poster.id, "Long", ""), 180))
        .await
        .unwrap();

    lifecycle.accept(short.task.task.id, vera.id).await.unwrap();
    lifecycle.complete(short.task.task.id, CompleteTask::default()).await.unwrap();
    lifecycle.accept(long.task.task.id, will.id).await.unwrap();
    lifecycle.complete(long.task.task.id, CompleteTask::default()).await.unwrap();

    let everyone = ImpactReport::community_impact(&pool).await.unwrap();
    assert_eq!(everyone.totals.total_volunteers, 2);
    assert_eq!(everyone.totals.total_hours, 3.5);
    assert_eq!(everyone.totals.total_people, 2);

    let names: Vec<&str> = everyone
        .top_volunteers
        .iter()
        .map(|v| v.name.as_str())
        .collect();
    assert_eq!(names, vec!["Will Helper", "Vera Volunteer"]);

    let vera_impact = ImpactReport::user_impact(&pool, vera.id).await.unwrap();
    assert_eq!(vera_impact.totals.total_reports, 1);
    assert_eq!(vera_impact.totals.total_hours, 0.5);
    assert_eq!(vera_impact.reports[0].task_title.as_deref(), Some("Short"));
}

#[tokio::test]
async fn test_full_skill_coverage_scores_high() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let volunteer = user(&pool, "Vera Volunteer", "vera@example.com").await;
    give_skills(&pool, volunteer.id, &["Gardening", "Cooking", "Pet Care"]).await;

    for (title, skills) in [
        ("Weeding", &["Gardening"][..]),
        ("Soup kitchen", &["Cooking"][..]),
        ("Dog sitting", &["Pet Care", "Cooking"][..]),
    ] {
        lifecycle
            .create(with_skills(task_input(poster.id, title, ""), skills))
            .await
            .unwrap();
    }

    let rng = Mutex::new(StdRng::seed_from_u64(11));
    let ranked = match_tasks_for(&pool, volunteer.id, &rng).await.unwrap();

    assert_eq!(ranked.len(), 3);
    for scored in &ranked {
        assert!((90..=99).contains(&scored.match_pct), "got {}", scored.match_pct);
    }
}

#[tokio::test]
async fn test_match_skips_taken_tasks() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let vera = user(&pool, "Vera Volunteer", "vera@example.com").await;
    let will = user(&pool, "Will Helper", "will@example.com").await;

    let taken = lifecycle.create(task_input(poster.id, "Taken", "")).await.unwrap();
    lifecycle.create(task_input(poster.id, "Free", "")).await.unwrap();
    lifecycle.accept(taken.task.task.id, will.id).await.unwrap();

    let rng = Mutex::new(StdRng::seed_from_u64(5));
    let ranked = match_tasks_for(&pool, vera.id, &rng).await.unwrap();

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].task.task.title, "Free");
    // No declared skills: bonus only
    assert!((10..=20).contains(&ranked[0].match_pct));
}

#[tokio::test]
async fn test_task_list_filters() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let volunteer = user(&pool, "Vera Volunteer", "vera@example.com").await;

    let garden = lifecycle
        .create(with_city(
            with_skills(task_input(poster.id, "Garden", ""), &["Gardening"]),
            "Leeds",
        ))
        .await
        .unwrap();
    lifecycle
        .create(with_skills(task_input(poster.id, "Cook", ""), &["Cooking"]))
        .await
        .unwrap();
    lifecycle.accept(garden.task.task.id, volunteer.id).await.unwrap();

    let all = Task::list(&pool, &TaskFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].task.title, "Cook", "newest first");

    let leeds = TaskFilter {
        city: Some("Leeds".to_string()),
        ..Default::default()
    };
    assert_eq!(Task::list(&pool, &leeds).await.unwrap().len(), 1);

    let open = TaskFilter {
        status: Some(TaskStatus::Open),
        ..Default::default()
    };
    let open_tasks = Task::list(&pool, &open).await.unwrap();
    assert_eq!(open_tasks.len(), 1);
    assert_eq!(open_tasks[0].task.title, "Cook");

    let cooking = TaskFilter {
        skill: Some("Cooking".to_string()),
        ..Default::default()
    };
    assert_eq!(Task::list(&pool, &cooking).await.unwrap().len(), 1);

    let mine = TaskFilter {
        user_id: Some(volunteer.id),
        ..Default::default()
    };
    let mine = Task::list(&pool, &mine).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].task.title, "Garden");

    let cities = Task::cities(&pool).await.unwrap();
    assert_eq!(cities, vec!["Leeds", "London"]);
}

#[tokio::test]
async fn test_posted_by_counts_and_schedule() {
    let (pool, lifecycle) = setup().await;
    let poster = user(&pool, "Pat Poster", "pat@example.com").await;
    let volunteer = user(&pool, "Vera Volunteer", "vera@example.com").await;

    let a = lifecycle.create(task_input(poster.id, "A", "")).await.unwrap();
    let b = lifecycle.create(task_input(poster.id, "B", "")).await.unwrap();
    lifecycle.create(task_input(poster.id, "C", "")).await.unwrap();

    lifecycle.accept(a.task.task.id, volunteer.id).await.unwrap();
    lifecycle.complete(a.task.task.id, CompleteTask::default()).await.unwrap();
    lifecycle.accept(b.task.task.id, volunteer.id).await.unwrap();

    let posted = lifecycle.posted_by(poster.id).await.unwrap();
    assert_eq!(posted.total, 3);
    assert_eq!(posted.status_counts.open, 1);
    assert_eq!(posted.status_counts.accepted, 1);
    assert_eq!(posted.status_counts.completed, 1);
    assert_eq!(posted.posts_today, 3);
    assert_eq!(posted.daily_limit, 5);
    assert!(posted.can_post);

    let upcoming = Task::schedule_for(&pool, volunteer.id, false).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].task.title, "B");

    let everything = Task::schedule_for(&pool, volunteer.id, true).await.unwrap();
    assert_eq!(everything.len(), 2);

    let profile = User::profile(&pool, poster.id).await.unwrap().unwrap();
    assert_eq!(profile.posted_tasks.total_posted, 3);
    assert_eq!(profile.posted_tasks.completed_posted, 1);
}
