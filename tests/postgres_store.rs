//! PostgreSQL store tests.
//!
//! These need a live database at `TEST_DATABASE_URL`. They skip with a
//! message when it is unset or unreachable. Each test uses its own user id
//! range and cleans it up first, so reruns are safe.

use chrono::{Duration, SubsecRound, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use ogenki_api::models::check_in::{CheckInKind, NewCheckIn};
use ogenki_api::store::{CheckInStore, PgCheckInStore, StoreError};

async fn make_store(user_id: i64) -> Option<PgCheckInStore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    // Pin "today" to the UTC day so midday timestamps below are unambiguous.
    let options = url
        .parse::<PgConnectOptions>()
        .ok()?
        .options([("TimeZone", "UTC")]);
    let pool = PgPoolOptions::new().connect_with(options).await.ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;

    sqlx::query("DELETE FROM check_ins WHERE user_id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .ok()?;

    Some(PgCheckInStore::new(pool))
}

fn new_check_in(user_id: i64, kind: CheckInKind) -> NewCheckIn {
    NewCheckIn {
        user_id,
        check_in_type: kind,
        step_count: None,
        battery_level: None,
        checked_at: Utc::now().trunc_subsecs(6),
    }
}

#[tokio::test]
async fn test_insert_and_fetch_round_trip() {
    let user_id = 900_001;
    let Some(store) = make_store(user_id).await else {
        eprintln!("Skipping test_insert_and_fetch_round_trip: TEST_DATABASE_URL unavailable");
        return;
    };

    let mut new = new_check_in(user_id, CheckInKind::Passive);
    new.step_count = Some(5000);
    new.battery_level = Some(80);
    let inserted = store.insert(&new).await.unwrap();

    let history = store.history(user_id, 30).await.unwrap();
    assert_eq!(history, vec![new.into_check_in(inserted)]);
}

#[tokio::test]
async fn test_latest_today_prefers_newest() {
    let user_id = 900_002;
    let Some(store) = make_store(user_id).await else {
        eprintln!("Skipping test_latest_today_prefers_newest: TEST_DATABASE_URL unavailable");
        return;
    };

    assert_eq!(store.latest_today(user_id).await.unwrap(), None);

    let midday = Utc::now()
        .date_naive()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc();
    let mut earlier = new_check_in(user_id, CheckInKind::Passive);
    earlier.checked_at = midday - Duration::hours(2);
    store.insert(&earlier).await.unwrap();
    let mut newest = new_check_in(user_id, CheckInKind::Manual);
    newest.checked_at = midday;
    let later = store.insert(&newest).await.unwrap();

    let today = store.latest_today(user_id).await.unwrap().unwrap();
    assert_eq!(today.id, later.id);
    assert_eq!(today.check_in_type, CheckInKind::Manual);
}

#[tokio::test]
async fn test_history_skips_undecodable_rows() {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("Skipping test_history_skips_undecodable_rows: TEST_DATABASE_URL unavailable");
        return;
    };
    let Ok(admin) = PgPool::connect(&url).await else {
        eprintln!("Skipping test_history_skips_undecodable_rows: database unreachable");
        return;
    };

    // A copy of the table without its check constraint, in a scratch schema.
    for statement in [
        "DROP SCHEMA IF EXISTS decode_skip CASCADE",
        "CREATE SCHEMA decode_skip",
        "CREATE TABLE decode_skip.check_ins (id BIGSERIAL PRIMARY KEY, user_id BIGINT NOT NULL, \
         check_in_type VARCHAR(16) NOT NULL, step_count INTEGER, battery_level INTEGER, \
         checked_at TIMESTAMPTZ NOT NULL, created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())",
    ] {
        sqlx::query(statement).execute(&admin).await.unwrap();
    }

    let options = url
        .parse::<PgConnectOptions>()
        .unwrap()
        .options([("search_path", "decode_skip")]);
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    let store = PgCheckInStore::new(pool);

    let user_id = 900_003;
    store
        .insert(&new_check_in(user_id, CheckInKind::Manual))
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO decode_skip.check_ins (user_id, check_in_type, checked_at) VALUES ($1, 'walking', NOW())",
    )
    .bind(user_id)
    .execute(&admin)
    .await
    .unwrap();

    let history = store.history(user_id, 30).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].check_in_type, CheckInKind::Manual);

    let today = store.latest_today(user_id).await.unwrap();
    assert_eq!(today.map(|c| c.check_in_type), Some(CheckInKind::Manual));

    sqlx::query("DROP SCHEMA decode_skip CASCADE")
        .execute(&admin)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_history_limit_and_order() {
    let user_id = 900_004;
    let Some(store) = make_store(user_id).await else {
        eprintln!("Skipping test_history_limit_and_order: TEST_DATABASE_URL unavailable");
        return;
    };

    let base = Utc::now().trunc_subsecs(6);
    for minutes in 0..5 {
        let mut new = new_check_in(user_id, CheckInKind::Passive);
        new.checked_at = base - Duration::minutes(minutes);
        store.insert(&new).await.unwrap();
    }

    let history = store.history(user_id, 3).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].checked_at > w[1].checked_at));
    assert!(store.history(user_id, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_pool_is_unavailable() {
    let user_id = 900_005;
    let Some(store) = make_store(user_id).await else {
        eprintln!("Skipping test_closed_pool_is_unavailable: TEST_DATABASE_URL unavailable");
        return;
    };

    store.pool().close().await;
    let result = store.insert(&new_check_in(user_id, CheckInKind::Manual)).await;
    assert!(matches!(result, Err(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_check_constraint_is_constraint_violation() {
    let user_id = 900_006;
    let Some(store) = make_store(user_id).await else {
        eprintln!("Skipping test_check_constraint_is_constraint_violation: TEST_DATABASE_URL unavailable");
        return;
    };

    let err = sqlx::query(
        "INSERT INTO check_ins (user_id, check_in_type, checked_at) VALUES ($1, 'walking', NOW())",
    )
    .bind(user_id)
    .execute(store.pool())
    .await
    .unwrap_err();

    assert!(matches!(
        StoreError::from(err),
        StoreError::ConstraintViolation(_)
    ));
    assert!(store.history(user_id, 30).await.unwrap().is_empty());
}
