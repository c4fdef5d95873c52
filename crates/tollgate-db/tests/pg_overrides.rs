//! Override upserts against a live PostgreSQL
//!
//! Needs `DATABASE_URL`. Run with `cargo test -p tollgate-db -- --ignored`.

use tollgate_db::{
    create_pool, run_migrations, CreateSubscription, DbError, OverrideRepository, Repositories,
    SubscriptionRepository, UpsertOverride,
};
use uuid::Uuid;

async fn repositories() -> Repositories {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Repositories::new(pool)
}

async fn subscribed_tenant(repos: &Repositories) -> Uuid {
    let tenant_id = Uuid::new_v4();
    repos
        .subscriptions
        .create(CreateSubscription {
            id: Uuid::new_v4(),
            tenant_id,
            tier: "core".to_string(),
            status: "active".to_string(),
            trial_expires_at: None,
        })
        .await
        .unwrap();
    tenant_id
}

fn upsert(tenant_id: Uuid, name: &str, value: &str) -> UpsertOverride {
    UpsertOverride {
        id: Uuid::new_v4(),
        tenant_id,
        name: name.to_string(),
        value: value.to_string(),
        created_by: Uuid::new_v4(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // needs a PostgreSQL at DATABASE_URL
async fn test_concurrent_first_upserts_report_one_creation() {
    let repos = repositories().await;

    for _ in 0..20 {
        let tenant_id = subscribed_tenant(&repos).await;
        let (a, b) = (repos.overrides.clone(), repos.overrides.clone());

        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.upsert(upsert(tenant_id, "payroll", "true")).await }),
            tokio::spawn(async move { b.upsert(upsert(tenant_id, "payroll", "false")).await }),
        );
        let first = first.unwrap().unwrap();
        let second = second.unwrap().unwrap();

        let created = [&first, &second]
            .iter()
            .filter(|upserted| upserted.before.is_none())
            .count();
        assert_eq!(created, 1, "exactly one upsert creates the row");

        // The later write saw the row the earlier one committed
        let (creation, update) = if first.before.is_none() {
            (first, second)
        } else {
            (second, first)
        };
        assert_eq!(update.before.as_ref(), Some(&creation.after));
    }
}

#[tokio::test]
#[ignore] // needs a PostgreSQL at DATABASE_URL
async fn test_upsert_without_subscription_is_not_found() {
    let repos = repositories().await;

    let err = repos
        .overrides
        .upsert(upsert(Uuid::new_v4(), "payroll", "true"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[tokio::test]
#[ignore] // needs a PostgreSQL at DATABASE_URL
async fn test_delete_by_stored_name() {
    let repos = repositories().await;
    let tenant_id = subscribed_tenant(&repos).await;
    repos
        .overrides
        .upsert(upsert(tenant_id, "legacy_flag", "true"))
        .await
        .unwrap();

    let removed = repos.overrides.delete(tenant_id, "legacy_flag").await.unwrap();
    assert_eq!(removed.map(|row| row.name).as_deref(), Some("legacy_flag"));
    assert!(repos.overrides.delete(tenant_id, "legacy_flag").await.unwrap().is_none());
}
