//! Integration tests for SqliteStore.
//!
//! Uses tempfile::TempDir for isolated SQLite databases.

use chrono::{Duration, TimeZone, Utc};
use prosper_core::{
    EngagementTracker, Entities, EntityKind, EntityStore, ProactiveSuggestion, Query, StoreError,
    SuggestionType, WorkoutSession,
};
use prosper_store::{MemoryStore, SqliteStore};
use serde_json::json;

async fn setup_store(dir: &tempfile::TempDir) -> SqliteStore {
    let db_path = dir.path().join("test.db");
    SqliteStore::new(db_path).await.unwrap()
}

fn suggestion(email: &str, read: bool) -> ProactiveSuggestion {
    ProactiveSuggestion {
        user_email: email.into(),
        suggestion_type: SuggestionType::WeeklyIntention,
        title: "t".into(),
        message: "m".into(),
        suggested_prompt: "p".into(),
        priority: 5,
        read,
        expires_at: Utc::now() + Duration::days(5),
        reasoning: "r".into(),
    }
}

#[tokio::test]
async fn test_bool_and_string_equality_filters() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    let entities = Entities::new(&store);

    entities.create(&suggestion("ruth@example.com", true)).await.unwrap();
    entities.create(&suggestion("ruth@example.com", false)).await.unwrap();
    entities.create(&suggestion("boaz@example.com", false)).await.unwrap();

    let unread = entities
        .filter::<ProactiveSuggestion>(
            &Query::new().eq("user_email", "ruth@example.com").eq("read", false),
        )
        .await
        .unwrap();
    assert_eq!(unread.len(), 1);
    assert!(!unread[0].read);
}

#[tokio::test]
async fn test_since_window_and_newest_first() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    let entities = Entities::new(&store);
    let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

    for days_ago in [45, 29, 10, 1] {
        let w = WorkoutSession {
            created_by: "ruth@example.com".into(),
            workout_type: "walk".into(),
            duration_minutes: days_ago,
        };
        entities
            .import(&w, now - Duration::days(days_ago as i64))
            .await
            .unwrap();
    }

    let recent = entities
        .filter::<WorkoutSession>(
            &Query::new()
                .owned_by("ruth@example.com")
                .since("created_date", now - Duration::days(30))
                .newest_first()
                .limit(10),
        )
        .await
        .unwrap();
    let minutes: Vec<_> = recent.iter().map(|w| w.duration_minutes).collect();
    assert_eq!(minutes, vec![1, 10, 29]);
}

#[tokio::test]
async fn test_update_persists_guard_stamp() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    let entities = Entities::new(&store);

    let tracker = entities
        .create(&EngagementTracker {
            user_email: "ruth@example.com".into(),
            current_streak: 9,
            ..Default::default()
        })
        .await
        .unwrap();

    entities
        .update::<EngagementTracker>(&tracker.id, json!({"last_streak_notification": "2026-10-16"}))
        .await
        .unwrap();

    let reloaded = entities
        .first::<EngagementTracker>(Query::new().eq("user_email", "ruth@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        reloaded.last_streak_notification.map(|d| d.to_string()),
        Some("2026-10-16".to_string())
    );
    assert_eq!(reloaded.current_streak, 9);
}

#[tokio::test]
async fn test_missing_records_and_bad_fields() {
    let store = SqliteStore::in_memory().await.unwrap();
    let err = store
        .update(EntityKind::Notification, "missing", json!({"read": true}))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = store
        .filter(EntityKind::Notification, &Query::new().eq("a.b", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidField(_)));
}

#[tokio::test]
async fn test_reopen_keeps_records() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let store = setup_store(&dir).await;
        store
            .create(EntityKind::User, json!({"email": "ruth@example.com"}))
            .await
            .unwrap();
    }
    let store = setup_store(&dir).await;
    let users = store.list(EntityKind::User).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "ruth@example.com");
}

/// Both backends must agree on query semantics.
#[tokio::test]
async fn test_backends_agree_on_filter_results() {
    let sqlite = SqliteStore::in_memory().await.unwrap();
    let memory = MemoryStore::new();
    let base = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();

    for store in [&sqlite as &dyn EntityStore, &memory as &dyn EntityStore] {
        let entities = Entities::new(store);
        for i in 0..12i64 {
            let s = suggestion(
                if i % 3 == 0 { "boaz@example.com" } else { "ruth@example.com" },
                i % 2 == 0,
            );
            entities.import(&s, base + Duration::hours(i * 5)).await.unwrap();
        }
    }

    let query = Query::new()
        .eq("user_email", "ruth@example.com")
        .eq("read", false)
        .newest_first()
        .limit(3);
    let a = sqlite.filter(EntityKind::ProactiveSuggestion, &query).await.unwrap();
    let b = memory.filter(EntityKind::ProactiveSuggestion, &query).await.unwrap();
    let dates = |v: &[serde_json::Value]| -> Vec<String> {
        v.iter()
            .map(|r| r["created_date"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(dates(&a), dates(&b));
    assert_eq!(a.len(), 3);
}
