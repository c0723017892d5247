use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        display_name TEXT NOT NULL,
        faculty TEXT NOT NULL,
        year_of_study INTEGER NOT NULL,
        role TEXT NOT NULL DEFAULT 'student',
        diamonds INTEGER NOT NULL DEFAULT 0,
        points INTEGER NOT NULL DEFAULT 0,
        push_token TEXT,
        profile_image TEXT,
        email_verified BOOLEAN NOT NULL DEFAULT 0,
        verification_token TEXT,
        reset_token TEXT,
        reset_token_expires_at TEXT,
        onboarding_completed BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        organiser TEXT NOT NULL,
        category TEXT NOT NULL,
        location_name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        start_at TEXT NOT NULL,
        end_at TEXT NOT NULL,
        registration_deadline TEXT NOT NULL,
        capacity INTEGER NOT NULL,
        participant_count INTEGER NOT NULL DEFAULT 0,
        requires_payment BOOLEAN NOT NULL DEFAULT 0,
        fee REAL,
        restricted_faculties TEXT NOT NULL DEFAULT '[]',
        restricted_years TEXT NOT NULL DEFAULT '[]',
        created_by INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (created_by) REFERENCES users(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS registrations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        event_id INTEGER NOT NULL,
        is_verified BOOLEAN NOT NULL DEFAULT 0,
        attended BOOLEAN NOT NULL DEFAULT 0,
        attendance_scanned_at TEXT,
        payment_proof TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, event_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id INTEGER NOT NULL,
        quest_type TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        question TEXT,
        correct_answer TEXT,
        target_count INTEGER NOT NULL DEFAULT 1,
        diamond_reward INTEGER NOT NULL DEFAULT 0,
        points_reward INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quest_progress (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        event_id INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (user_id, event_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quest_progress_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        quest_progress_id INTEGER NOT NULL,
        quest_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        progress INTEGER NOT NULL DEFAULT 0,
        threshold INTEGER NOT NULL,
        is_completed BOOLEAN NOT NULL DEFAULT 0,
        is_failed BOOLEAN NOT NULL DEFAULT 0,
        claimed BOOLEAN NOT NULL DEFAULT 0,
        completed_at TEXT,
        claimed_at TEXT,
        updated_at TEXT NOT NULL,
        UNIQUE (quest_progress_id, quest_id),
        CHECK (progress >= 0 AND progress <= threshold),
        FOREIGN KEY (quest_progress_id) REFERENCES quest_progress(id) ON DELETE CASCADE,
        FOREIGN KEY (quest_id) REFERENCES quests(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS badges (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        badge_type TEXT NOT NULL,
        threshold INTEGER NOT NULL,
        image_url TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS badge_progress (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS badge_progress_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        badge_progress_id INTEGER NOT NULL,
        badge_id INTEGER NOT NULL,
        progress INTEGER NOT NULL DEFAULT 0,
        is_unlocked BOOLEAN NOT NULL DEFAULT 0,
        unlocked_at TEXT,
        updated_at TEXT NOT NULL,
        UNIQUE (badge_progress_id, badge_id),
        FOREIGN KEY (badge_progress_id) REFERENCES badge_progress(id) ON DELETE CASCADE,
        FOREIGN KEY (badge_id) REFERENCES badges(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leaderboard_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        faculty TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        points INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        UNIQUE (faculty, user_id),
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS network_connections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id INTEGER NOT NULL,
        scanner_id INTEGER NOT NULL,
        scanned_id INTEGER NOT NULL,
        scanned_at TEXT NOT NULL,
        UNIQUE (event_id, scanner_id, scanned_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        event_id INTEGER NOT NULL,
        rating INTEGER NOT NULL,
        liked TEXT NOT NULL,
        improvement TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (user_id, event_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scheduled_notifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        event_id INTEGER NOT NULL,
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        send_at TEXT NOT NULL,
        sent BOOLEAN NOT NULL DEFAULT 0,
        sent_at TEXT,
        created_at TEXT NOT NULL,
        UNIQUE (user_id, event_id, kind)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS applied_completions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_registrations_event_scan ON registrations (event_id, attendance_scanned_at)",
    "CREATE INDEX IF NOT EXISTS idx_notifications_due ON scheduled_notifications (sent, send_at)",
    "CREATE INDEX IF NOT EXISTS idx_chat_event ON chat_messages (event_id, created_at)",
];

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    for sql in SCHEMA {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    // Default badge templates, one per quest type
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        INSERT OR IGNORE INTO badges (id, name, description, badge_type, threshold, image_url, created_at)
        VALUES
            (1, 'Regular', 'Attend 3 events', 'attendance', 3, 'assets/badges/regular.png', strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            (2, 'Early Riser', 'Be among the first attendees at 2 events', 'early_bird', 2, 'assets/badges/early_riser.png', strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            (3, 'Connector', 'Complete 3 networking quests', 'networking', 3, 'assets/badges/connector.png', strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            (4, 'Quiz Whiz', 'Answer 3 event questions correctly', 'qna', 3, 'assets/badges/quiz_whiz.png', strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            (5, 'Campus Voice', 'Give feedback on 3 events', 'feedback', 3, 'assets/badges/campus_voice.png', strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}
