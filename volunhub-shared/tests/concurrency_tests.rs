/// Concurrency tests against a file database
///
/// Unlike the in-memory suites these run on a WAL file with several pooled
/// connections, so lifecycle transactions really interleave.

use sqlx::SqlitePool;
use std::path::PathBuf;
use volunhub_shared::db::migrations::run_migrations;
use volunhub_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use volunhub_shared::db::seed::seed_if_empty;
use volunhub_shared::lifecycle::{CompleteTask, CreateTask, LifecycleError, TaskLifecycle};
use volunhub_shared::models::availability::{Availability, CreateAvailability};
use volunhub_shared::models::task::NewTask;
use volunhub_shared::models::user::{CreateUser, User};
use volunhub_shared::quota::DailyPostQuota;

fn temp_dir(prefix: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("{prefix}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

struct FileDb {
    pool: SqlitePool,
    dir: PathBuf,
}

impl FileDb {
    async fn open(prefix: &str) -> Self {
        let dir = temp_dir(prefix);
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.join("hub.db").display()),
            max_connections: 8,
            ..DatabaseConfig::default()
        };

        let pool = create_pool(config).await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        seed_if_empty(&pool, false).await.expect("Seed failed");

        FileDb { pool, dir }
    }

    fn lifecycle(&self, daily_limit: u32) -> TaskLifecycle {
        TaskLifecycle::new(self.pool.clone(), DailyPostQuota::new(daily_limit))
    }

    async fn user(&self, name: &str, email: &str) -> User {
        User::create(&self.pool, CreateUser::new(name, email))
            .await
            .expect("Failed to create user")
    }

    async fn close(self) {
        close_pool(self.pool).await;
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn task_input(poster: i64, title: &str) -> CreateTask {
    CreateTask {
        task: NewTask {
            title: title.to_string(),
            description: "Carry boxes to the hall".to_string(),
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

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_posts_stop_exactly_at_the_limit() {
    let db = FileDb::open("volunhub_parallel_posts").await;
    let lifecycle = db.lifecycle(5);
    let poster = db.user("Pat Poster", "pat@example.com").await;
    let poster_id = poster.id;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let lifecycle = lifecycle.clone();
            let input = task_input(poster_id, &format!("Job {i}"));
            tokio::spawn(async move { lifecycle.create(input).await })
        })
        .collect();

    let mut created = 0;
    let mut limited = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => created += 1,
            Err(LifecycleError::RateLimited {
                posts_today,
                daily_limit,
            }) => {
                assert_eq!(posts_today, 5);
                assert_eq!(daily_limit, 5);
                limited += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 5);
    assert_eq!(limited, 5);

    let limit = lifecycle.posting_limit(poster.id).await.unwrap();
    assert_eq!(limit.posts_today, 5);
    assert!(!limit.can_post);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_posts_from_different_posters_all_land() {
    let db = FileDb::open("volunhub_parallel_posters").await;
    let lifecycle = db.lifecycle(5);

    let mut posters = Vec::new();
    for i in 0..6 {
        posters.push(db.user(&format!("Poster {i}"), &format!("poster{i}@example.com")).await);
    }

    let handles: Vec<_> = posters
        .iter()
        .map(|poster| {
            let lifecycle = lifecycle.clone();
            let input = task_input(poster.id, "Shared shift");
            tokio::spawn(async move { lifecycle.create(input).await })
        })
        .collect();

    for handle in handles {
        let created = handle.await.expect("task panicked").expect("create failed");
        assert_eq!(created.ai_suggested_skills, vec!["Heavy Lifting".to_string()]);
    }

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(total, 6);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_accepts_by_one_volunteer_admit_one() {
    let db = FileDb::open("volunhub_parallel_accepts").await;
    let lifecycle = db.lifecycle(20);
    let poster = db.user("Pat Poster", "pat@example.com").await;
    let volunteer = db.user("Vera Volunteer", "vera@example.com").await;

    let mut task_ids = Vec::new();
    for i in 0..10 {
        let created = lifecycle
            .create(task_input(poster.id, &format!("Job {i}")))
            .await
            .unwrap();
        task_ids.push(created.task.task.id);
    }
    let volunteer_id = volunteer.id;

    let handles: Vec<_> = task_ids
        .iter()
        .map(|&task_id| {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.accept(task_id, volunteer_id).await })
        })
        .collect();

    let mut accepted = 0;
    let mut blocked = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => accepted += 1,
            Err(LifecycleError::ActiveTaskExists { user_id }) => {
                assert_eq!(user_id, volunteer.id);
                blocked += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(blocked, 9);

    let active = lifecycle.active_for(volunteer.id).await.unwrap();
    assert_eq!(active.count, 1);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_completions_all_commit() {
    let db = FileDb::open("volunhub_parallel_completes").await;
    let lifecycle = db.lifecycle(20);
    let poster = db.user("Pat Poster", "pat@example.com").await;

    let mut jobs = Vec::new();
    for i in 0..6 {
        let volunteer = db
            .user(&format!("Volunteer {i}"), &format!("volunteer{i}@example.com"))
            .await;
        let created = lifecycle
            .create(task_input(poster.id, &format!("Job {i}")))
            .await
            .unwrap();
        let task_id = created.task.task.id;
        lifecycle.accept(task_id, volunteer.id).await.unwrap();
        jobs.push((task_id, volunteer.id));
    }

    let handles: Vec<_> = jobs
        .iter()
        .map(|&(task_id, _)| {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.complete(task_id, CompleteTask::default()).await })
        })
        .collect();

    for (handle, &(_, volunteer_id)) in handles.into_iter().zip(&jobs) {
        let done = handle.await.expect("task panicked").expect("complete failed");
        assert_eq!(done.completed_by, volunteer_id);
        assert_eq!(done.hours_logged, 1.0);
    }

    let reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM impact_reports")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(reports, 6);

    for &(_, volunteer_id) in &jobs {
        let mut conn = db.pool.acquire().await.unwrap();
        let volunteer = User::find_by_id(&mut conn, volunteer_id)
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(volunteer.tasks_completed, 1);
        assert_eq!(volunteer.total_hours, 1.0);
    }

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_completions_of_one_task_record_once() {
    let db = FileDb::open("volunhub_parallel_same_task").await;
    let lifecycle = db.lifecycle(5);
    let poster = db.user("Pat Poster", "pat@example.com").await;
    let volunteer = db.user("Vera Volunteer", "vera@example.com").await;

    let created = lifecycle.create(task_input(poster.id, "Move sofa")).await.unwrap();
    let task_id = created.task.task.id;
    lifecycle.accept(task_id, volunteer.id).await.unwrap();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.complete(task_id, CompleteTask::default()).await })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => completed += 1,
            Err(LifecycleError::TaskAlreadyCompleted(id)) => assert_eq!(id, task_id),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(completed, 1);

    let mut conn = db.pool.acquire().await.unwrap();
    let after = User::find_by_id(&mut conn, volunteer.id)
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(after.tasks_completed, 1);
    drop(conn);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_availability_writes() {
    let db = FileDb::open("volunhub_parallel_availability").await;
    let volunteer = db.user("Vera Volunteer", "vera@example.com").await;
    let volunteer_id = volunteer.id;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = db.pool.clone();
            tokio::spawn(async move {
                let mut tx = pool.begin().await?;
                let id = Availability::create(
                    &mut tx,
                    &CreateAvailability {
                        user_id: volunteer_id,
                        date: format!("2026-11-{:02}", i + 1),
                        start_time: "09:00".to_string(),
                        end_time: "12:00".to_string(),
                    },
                )
                .await?;
                tx.commit().await?;
                Ok::<_, sqlx::Error>(id)
            })
        })
        .collect();

    for handle in handles {
        let id = handle.await.expect("task panicked").expect("insert failed");
        assert!(id.is_some());
    }

    let windows = Availability::list_for_user(&db.pool, volunteer.id).await.unwrap();
    assert_eq!(windows.len(), 8);

    let mut conn = db.pool.acquire().await.unwrap();
    let missing = Availability::create(
        &mut conn,
        &CreateAvailability {
            user_id: 9_999,
            date: "2026-11-01".to_string(),
            start_time: "09:00".to_string(),
            end_time: "12:00".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(missing, None);
    drop(conn);

    db.close().await;
}
