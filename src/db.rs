use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::config::{self, Setting};
use crate::models::{LocationDirectory, RawPegEvent};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let people = vec![
        ("U01ANN", "Ann Rivera", Some("Sydney")),
        ("U02BOB", "Bob Tran", Some("Melbourne")),
        ("U03CAT", "Cat Osei", Some("Sydney")),
        ("U04DEE", "Dee Walsh", None),
    ];

    for (id, name, location) in people {
        upsert_person(pool, id, name, location).await?;
    }

    let settings = vec![
        (config::REQUIRE_KEYWORDS, "true"),
        (config::KEYWORDS, "brave,awesome,helpful"),
        (config::PENALTY_KEYWORDS, "shame"),
        (config::MINIMUM_VALID_GIVEN, "1"),
        (config::WINNER_COUNT, "3"),
        (config::REMOTE_LOCATION_WEIGHTING_DEFAULT, "2"),
        ("locationWeightSydneytoMelbourne", "3"),
    ];

    for (name, value) in settings {
        upsert_setting(pool, name, value).await?;
    }

    let pegs = vec![
        ("seed-001", "U02BOB", "U01ANN", "Brave call on the release rollback", 30),
        ("seed-002", "U01ANN", "U03CAT", "Awesome pairing session", 26),
        ("seed-003", "U03CAT", "U02BOB", "Helpful review, thanks", 20),
        ("seed-004", "U04DEE", "U01ANN", "helpful and brave", 12),
        ("seed-005", "U03CAT", "U04DEE", "shame about the broken build", 6),
    ];

    for (source_key, sender_id, receiver_id, comment, hours_ago) in pegs {
        sqlx::query(
            r#"
            INSERT INTO peg_cycle.pegs
            (id, sender_id, receiver_id, comment, given_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(comment)
        .bind(Utc::now() - Duration::hours(hours_ago))
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn upsert_person(
    pool: &PgPool,
    id: &str,
    name: &str,
    location: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO peg_cycle.people (id, name, location)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            location = COALESCE(EXCLUDED.location, peg_cycle.people.location)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(location)
    .execute(pool)
    .await
    .with_context(|| format!("failed to upsert person {id}"))?;
    Ok(())
}

pub async fn upsert_setting(pool: &PgPool, name: &str, value: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO peg_cycle.settings (name, value)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(name)
    .bind(value)
    .execute(pool)
    .await
    .with_context(|| format!("failed to store setting {name}"))?;
    Ok(())
}

pub async fn fetch_settings(pool: &PgPool) -> anyhow::Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT name, value FROM peg_cycle.settings ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| Setting {
            name: row.get("name"),
            value: row.get("value"),
        })
        .collect())
}

pub async fn fetch_locations(pool: &PgPool) -> anyhow::Result<LocationDirectory> {
    let rows = sqlx::query("SELECT id, location FROM peg_cycle.people")
        .fetch_all(pool)
        .await?;

    let mut by_person = HashMap::new();
    let mut names: Vec<String> = Vec::new();

    for row in rows {
        let id: String = row.get("id");
        let location: Option<String> = row.get("location");
        if let Some(location) = &location {
            if !names.iter().any(|name| name.eq_ignore_ascii_case(location)) {
                names.push(location.clone());
            }
        }
        by_person.insert(id, location);
    }

    names.sort();
    Ok(LocationDirectory { by_person, names })
}

/// All pegs given since the start of the cycle, oldest first.
pub async fn fetch_cycle_pegs(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<RawPegEvent>> {
    let rows = sqlx::query(
        "SELECT p.receiver_id, r.name AS receiver_name, \
         p.sender_id, s.name AS sender_name, p.comment \
         FROM peg_cycle.pegs p \
         JOIN peg_cycle.people r ON r.id = p.receiver_id \
         JOIN peg_cycle.people s ON s.id = p.sender_id \
         WHERE p.given_at >= $1 \
         ORDER BY p.given_at, p.id",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in rows {
        events.push(RawPegEvent {
            receiver_id: row.get("receiver_id"),
            receiver_name: row.get("receiver_name"),
            sender_id: row.get("sender_id"),
            sender_name: row.get("sender_name"),
            comment: row.get("comment"),
        });
    }

    Ok(events)
}

/// Transaction-scoped lock that serialises allowance checks per sender.
const SENDER_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

/// Holds until the surrounding transaction ends, so a count taken after it
/// cannot be raced by another `give` from the same sender.
pub async fn lock_sender(conn: &mut PgConnection, sender_id: &str) -> anyhow::Result<()> {
    sqlx::query(SENDER_LOCK_SQL)
        .bind(sender_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("failed to lock allowance for {sender_id}"))?;
    Ok(())
}

pub async fn count_pegs_given(
    conn: &mut PgConnection,
    sender_id: &str,
    since: DateTime<Utc>,
) -> anyhow::Result<usize> {
    let given: i64 = sqlx::query(
        "SELECT COUNT(*) AS given FROM peg_cycle.pegs WHERE sender_id = $1 AND given_at >= $2",
    )
    .bind(sender_id)
    .bind(since)
    .fetch_one(&mut *conn)
    .await?
    .get("given");

    usize::try_from(given).context("peg count out of range")
}

pub async fn insert_peg(
    conn: &mut PgConnection,
    sender_id: &str,
    receiver_id: &str,
    comment: &str,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO peg_cycle.pegs
        (id, sender_id, receiver_id, comment, given_at, source_key)
        VALUES ($1, $2, $3, $4, now(), $5)
        "#,
    )
    .bind(id)
    .bind(sender_id)
    .bind(receiver_id)
    .bind(comment)
    .bind(format!("cli-{id}"))
    .execute(&mut *conn)
    .await
    .with_context(|| format!("failed to record peg from {sender_id} to {receiver_id}"))?;
    Ok(id)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        sender_id: String,
        sender_name: String,
        sender_location: Option<String>,
        receiver_id: String,
        receiver_name: String,
        receiver_location: Option<String>,
        comment: String,
        given_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        upsert_person(
            pool,
            &row.sender_id,
            &row.sender_name,
            row.sender_location.as_deref(),
        )
        .await?;
        upsert_person(
            pool,
            &row.receiver_id,
            &row.receiver_name,
            row.receiver_location.as_deref(),
        )
        .await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO peg_cycle.pegs
            (id, sender_id, receiver_id, comment, given_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.sender_id)
        .bind(&row.receiver_id)
        .bind(&row.comment)
        .bind(row.given_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
