/// Skill vocabulary and first-run sample data
///
/// The vocabulary is inserted on every start (existing names are skipped).
/// Sample users, tasks, posts, badges, impact reports and availability are
/// inserted once, only when the users table is empty. Everything runs in one
/// transaction.

use crate::db::sql_timestamp;
use crate::models::skill::Skill;
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

struct SampleUser {
    name: &'static str,
    email: &'static str,
    initials: &'static str,
    is_organization: bool,
    member_since: &'static str,
    rating: f64,
    total_hours: f64,
    tasks_completed: i64,
    skills: &'static [&'static str],
}

struct SampleTask {
    title: &'static str,
    description: &'static str,
    poster: usize,
    assignee: Option<usize>,
    completed: bool,
    duration_minutes: i64,
    address: &'static str,
    city: &'static str,
    latitude: f64,
    longitude: f64,
    date: &'static str,
    time: &'static str,
    skills: &'static [&'static str],
}

const USERS: &[SampleUser] = &[
    SampleUser {
        name: "John Doe",
        email: "john@example.com",
        initials: "JD",
        is_organization: false,
        member_since: "January 2026",
        rating: 4.9,
        total_hours: 12.0,
        tasks_completed: 5,
        skills: &["Heavy Lifting", "Transportation"],
    },
    SampleUser {
        name: "Sarah Johnson",
        email: "sarah@example.com",
        initials: "SJ",
        is_organization: false,
        member_since: "December 2025",
        rating: 4.9,
        total_hours: 45.0,
        tasks_completed: 23,
        skills: &["Gardening", "Cleaning"],
    },
    SampleUser {
        name: "Mike Chen",
        email: "mike@example.com",
        initials: "MC",
        is_organization: false,
        member_since: "November 2025",
        rating: 4.7,
        total_hours: 30.0,
        tasks_completed: 15,
        skills: &["Tech Help", "Repairs"],
    },
    SampleUser {
        name: "Margaret Wilson",
        email: "margaret@example.com",
        initials: "MW",
        is_organization: false,
        member_since: "October 2025",
        rating: 4.8,
        total_hours: 8.0,
        tasks_completed: 3,
        skills: &["Transportation", "Cleaning"],
    },
    SampleUser {
        name: "Emily Davis",
        email: "emily@example.com",
        initials: "ED",
        is_organization: false,
        member_since: "January 2026",
        rating: 4.6,
        total_hours: 20.0,
        tasks_completed: 10,
        skills: &["Cooking", "Tutoring"],
    },
    SampleUser {
        name: "Community Garden Org",
        email: "garden@example.com",
        initials: "CG",
        is_organization: true,
        member_since: "September 2025",
        rating: 5.0,
        total_hours: 100.0,
        tasks_completed: 50,
        skills: &[],
    },
    SampleUser {
        name: "Local Library",
        email: "library@example.com",
        initials: "LL",
        is_organization: true,
        member_since: "August 2025",
        rating: 4.9,
        total_hours: 200.0,
        tasks_completed: 80,
        skills: &[],
    },
];

// Indexes into USERS
const JOHN: usize = 0;
const SARAH: usize = 1;
const MIKE: usize = 2;
const MARGARET: usize = 3;
const EMILY: usize = 4;
const GARDEN_ORG: usize = 5;
const LIBRARY: usize = 6;

const TASKS: &[SampleTask] = &[
    SampleTask {
        title: "Help elderly neighbor with grocery shopping",
        description: "Need someone to help carry groceries from the supermarket to my home. Heavy items involved.",
        poster: MARGARET,
        assignee: None,
        completed: false,
        duration_minutes: 60,
        address: "123 Oak Street",
        city: "Bath",
        latitude: 1.3521,
        longitude: 103.8198,
        date: "2026-02-14",
        time: "14:00",
        skills: &["Heavy Lifting", "Transportation"],
    },
    SampleTask {
        title: "Community garden weeding session",
        description: "Weekly weeding at the community garden. Tools provided.",
        poster: GARDEN_ORG,
        assignee: None,
        completed: false,
        duration_minutes: 120,
        address: "45 Garden Ave",
        city: "Birmingham",
        latitude: 1.3496,
        longitude: 103.9568,
        date: "2026-02-15",
        time: "09:00",
        skills: &["Gardening"],
    },
    SampleTask {
        title: "Teach basic computer skills to seniors",
        description: "Help seniors learn to use smartphones and email at the community center.",
        poster: LIBRARY,
        assignee: None,
        completed: false,
        duration_minutes: 90,
        address: "78 Library Road",
        city: "Bristol",
        latitude: 1.3329,
        longitude: 103.7436,
        date: "2026-02-16",
        time: "10:00",
        skills: &["Tech Help", "Tutoring"],
    },
    SampleTask {
        title: "Dog walking for recovering patient",
        description: "I recently had surgery and need help walking my golden retriever for 2 weeks.",
        poster: EMILY,
        assignee: None,
        completed: false,
        duration_minutes: 30,
        address: "56 Maple Drive",
        city: "Cardiff",
        latitude: 1.4382,
        longitude: 103.7890,
        date: "2026-02-17",
        time: "08:00",
        skills: &["Pet Care"],
    },
    SampleTask {
        title: "Sort donations at food bank",
        description: "Help organize and sort incoming food donations.",
        poster: GARDEN_ORG,
        assignee: Some(SARAH),
        completed: true,
        duration_minutes: 120,
        address: "200 Charity Lane",
        city: "Edinburgh",
        latitude: 1.3236,
        longitude: 103.9273,
        date: "2026-02-10",
        time: "09:00",
        skills: &["Heavy Lifting", "Cleaning"],
    },
    SampleTask {
        title: "Paint community mural",
        description: "Help paint a neighborhood mural on the community center wall.",
        poster: GARDEN_ORG,
        assignee: None,
        completed: false,
        duration_minutes: 180,
        address: "15 Art Street",
        city: "Exeter",
        latitude: 1.3691,
        longitude: 103.8454,
        date: "2026-02-20",
        time: "10:00",
        skills: &["Arts & Crafts"],
    },
    SampleTask {
        title: "Litter picking at East Coast Park",
        description: "Monthly cleanup drive at the beach. Bags and gloves provided.",
        poster: GARDEN_ORG,
        assignee: None,
        completed: false,
        duration_minutes: 90,
        address: "East Coast Park",
        city: "Bath",
        latitude: 1.3008,
        longitude: 103.9122,
        date: "2026-02-22",
        time: "07:00",
        skills: &["Cleaning"],
    },
    SampleTask {
        title: "Help with house moving",
        description: "Moving to a new apartment. Need help carrying boxes.",
        poster: MARGARET,
        assignee: None,
        completed: false,
        duration_minutes: 180,
        address: "88 Block Street",
        city: "Birmingham",
        latitude: 1.3530,
        longitude: 103.9440,
        date: "2026-02-25",
        time: "09:00",
        skills: &["Heavy Lifting"],
    },
    SampleTask {
        title: "Cooking meals for shelter",
        description: "Prepare meals for 20 people at the homeless shelter.",
        poster: LIBRARY,
        assignee: None,
        completed: false,
        duration_minutes: 120,
        address: "30 Shelter Road",
        city: "Bristol",
        latitude: 1.3350,
        longitude: 103.7500,
        date: "2026-02-28",
        time: "11:00",
        skills: &["Cooking"],
    },
    SampleTask {
        title: "Fix leaky faucet for elderly resident",
        description: "Simple plumbing repair needed at elderly resident home.",
        poster: MARGARET,
        assignee: None,
        completed: false,
        duration_minutes: 60,
        address: "12 Resident Lane",
        city: "Cardiff",
        latitude: 1.4400,
        longitude: 103.7850,
        date: "2026-03-01",
        time: "14:00",
        skills: &["Repairs"],
    },
];

// Indexes into TASKS
const GROCERY_TASK: usize = 0;
const COMPUTER_TASK: usize = 2;
const DONATIONS_TASK: usize = 4;

/// (author, linked task, content, likes)
const POSTS: &[(usize, Option<usize>, &str, i64)] = &[
    (
        SARAH,
        Some(DONATIONS_TASK),
        "It was wonderful helping Margaret today! She had so many stories to share while we sorted groceries together. Small acts of kindness really do make a difference.",
        12,
    ),
    (
        MIKE,
        None,
        "Just finished a great tutoring session at the library. The seniors are getting so good with their phones!",
        8,
    ),
    (
        JOHN,
        None,
        "Looking forward to the community garden session this weekend. Who else is joining?",
        5,
    ),
];

const ACHIEVEMENTS: &[(usize, &str, &str)] = &[
    (JOHN, "First Step", "⭐"),
    (JOHN, "Helping Hand", "🏆"),
    (JOHN, "Community Hero", "❤️"),
    (JOHN, "Bullseye", "🎯"),
    (SARAH, "First Step", "⭐"),
    (SARAH, "Helping Hand", "🏆"),
    (SARAH, "Community Hero", "❤️"),
    (SARAH, "Bullseye", "🎯"),
    (SARAH, "Super Volunteer", "🌟"),
];

/// (volunteer, task, hours, items fixed, bags, people helped, carbon kg, notes)
const IMPACT_REPORTS: &[(usize, usize, f64, i64, i64, i64, f64, &str)] = &[
    (SARAH, DONATIONS_TASK, 2.0, 0, 5, 3, 1.2, "Sorted 5 bags of donations"),
    (JOHN, GROCERY_TASK, 1.0, 0, 0, 1, 0.5, "Helped Margaret with groceries"),
    (MIKE, COMPUTER_TASK, 1.5, 2, 0, 5, 0.0, "Taught 5 seniors email basics"),
];

const AVAILABILITY: &[(usize, &str, &str, &str)] = &[
    (SARAH, "2026-02-18", "14:00", "16:00"),
    (SARAH, "2026-02-20", "09:00", "12:00"),
    (MIKE, "2026-02-19", "10:00", "14:00"),
    (EMILY, "2026-02-18", "13:00", "17:00"),
];

/// What a seed run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub tasks: usize,
}

impl SeedSummary {
    pub fn is_empty(&self) -> bool {
        self.users == 0 && self.tasks == 0
    }
}

/// Ensures the skill vocabulary and, on an empty database, the sample data
///
/// With `sample_data` false only the vocabulary is written.
///
/// # Errors
///
/// Returns error if any insert fails; nothing is committed in that case.
pub async fn seed_if_empty(pool: &SqlitePool, sample_data: bool) -> Result<SeedSummary, sqlx::Error> {
    let mut tx = pool.begin().await?;

    Skill::ensure_vocabulary(&mut tx).await?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;

    let summary = if sample_data && users == 0 {
        insert_sample_data(&mut tx).await?
    } else {
        SeedSummary::default()
    };

    tx.commit().await?;

    if summary.is_empty() {
        tracing::debug!(existing_users = users, "Sample data not inserted");
    } else {
        tracing::info!(users = summary.users, tasks = summary.tasks, "Sample data inserted");
    }

    Ok(summary)
}

async fn insert_sample_data(conn: &mut SqliteConnection) -> Result<SeedSummary, sqlx::Error> {
    let mut user_ids = Vec::with_capacity(USERS.len());
    for user in USERS {
        let id = sqlx::query(
            r#"
            INSERT INTO users (name, email, avatar_initials, is_verified, is_organization,
                               member_since, rating, total_hours, tasks_completed)
            VALUES (?, ?, ?, 1, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.initials)
        .bind(user.is_organization)
        .bind(user.member_since)
        .bind(user.rating)
        .bind(user.total_hours)
        .bind(user.tasks_completed)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        let skills: Vec<String> = user.skills.iter().map(|s| s.to_string()).collect();
        Skill::replace_for_user(&mut *conn, id, &skills).await?;
        user_ids.push(id);
    }

    let mut task_ids = Vec::with_capacity(TASKS.len());
    for task in TASKS {
        let (status, completed_at) = if task.completed {
            let at = NaiveDate::parse_from_str(task.date, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .map(sql_timestamp);
            ("completed", at)
        } else if task.assignee.is_some() {
            ("accepted", None)
        } else {
            ("open", None)
        };

        let id = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, posted_by, assigned_to, status, duration_minutes,
                               location_address, city, latitude, longitude, is_verified,
                               scheduled_date, scheduled_time, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(task.title)
        .bind(task.description)
        .bind(user_ids[task.poster])
        .bind(task.assignee.map(|i| user_ids[i]))
        .bind(status)
        .bind(task.duration_minutes)
        .bind(task.address)
        .bind(task.city)
        .bind(task.latitude)
        .bind(task.longitude)
        .bind(task.date)
        .bind(task.time)
        .bind(completed_at)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        let skills: Vec<String> = task.skills.iter().map(|s| s.to_string()).collect();
        Skill::link_task(&mut *conn, id, &skills).await?;
        task_ids.push(id);
    }

    for (author, task, content, likes) in POSTS {
        sqlx::query(
            "INSERT INTO community_posts (user_id, task_id, content, image_url, likes) VALUES (?, ?, ?, '', ?)",
        )
        .bind(user_ids[*author])
        .bind(task.map(|i| task_ids[i]))
        .bind(*content)
        .bind(*likes)
        .execute(&mut *conn)
        .await?;
    }

    for (user, badge, icon) in ACHIEVEMENTS {
        crate::models::achievement::Achievement::award(&mut *conn, user_ids[*user], badge, icon)
            .await?;
    }

    for (user, task, hours, items, bags, people, carbon, notes) in IMPACT_REPORTS {
        sqlx::query(
            r#"
            INSERT INTO impact_reports (user_id, task_id, hours_logged, items_fixed, bags_collected,
                                        people_helped, carbon_saved_kg, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_ids[*user])
        .bind(task_ids[*task])
        .bind(*hours)
        .bind(*items)
        .bind(*bags)
        .bind(*people)
        .bind(*carbon)
        .bind(*notes)
        .execute(&mut *conn)
        .await?;
    }

    for (user, date, start, end) in AVAILABILITY {
        sqlx::query("INSERT INTO availability (user_id, date, start_time, end_time) VALUES (?, ?, ?, ?)")
            .bind(user_ids[*user])
            .bind(*date)
            .bind(*start)
            .bind(*end)
            .execute(&mut *conn)
            .await?;
    }

    Ok(SeedSummary {
        users: user_ids.len(),
        tasks: task_ids.len(),
    })
}
