use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        // Таблица наставников
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mentors (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                title TEXT NOT NULL,
                hourly_rate DOUBLE PRECISION NOT NULL DEFAULT 0,
                availability JSONB NOT NULL DEFAULT '{}',
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Таблица бронирований. UNIQUE (mentor_id, starts_at) отдает гонки
        // за один слот на сторону БД.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                mentor_id TEXT NOT NULL,
                requester_id TEXT,
                starts_at TIMESTAMP WITH TIME ZONE NOT NULL,
                duration_minutes INTEGER NOT NULL,
                topic TEXT NOT NULL,
                notes TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                payment_status TEXT NOT NULL DEFAULT 'pending',
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                expires_at TIMESTAMP WITH TIME ZONE,
                UNIQUE (mentor_id, starts_at)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Наставники по умолчанию
        sqlx::query(
            r#"
            INSERT INTO mentors (id, name, title, hourly_rate, availability)
            VALUES
                ('near-peer', 'Анна', 'Студентка-наставник', 0,
                 '{"Monday": ["10:00:00", "11:00:00"], "Wednesday": ["16:00:00", "17:00:00"]}'),

                ('career-coach', 'Максим', 'Карьерный консультант', 40,
                 '{"Tuesday": ["09:00:00", "10:00:00", "11:00:00"], "Thursday": ["14:00:00", "15:00:00"], "Saturday": ["10:00:00"]}'),

                ('industry-expert', 'София', 'Senior-инженер, ментор', 60,
                 '{"Friday": ["18:00:00", "19:00:00"], "Sunday": ["12:00:00"]}')
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                title = EXCLUDED.title,
                hourly_rate = EXCLUDED.hourly_rate,
                availability = EXCLUDED.availability,
                updated_at = NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Индексы
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_bookings_requester_id ON bookings (requester_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_bookings_payment_status ON bookings (payment_status)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_bookings_expires_at ON bookings (expires_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_mentors_active ON mentors (is_active)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
