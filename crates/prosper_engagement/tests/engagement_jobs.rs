//! End-to-end runs of the classifier and the suggestion generator against
//! an in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use prosper_core::config::EngagementConfig;
use prosper_core::store::Query;
use prosper_core::{
    EngagementLevel, EngagementTracker, Entities, EntityKind, EntityStore, JournalEntry,
    Notification, PrayerJournal, ProactiveSuggestion, StoreError, SuggestionType, User,
};
use prosper_engagement::{EngagementClassifier, SuggestionGenerator};
use prosper_store::MemoryStore;
use serde_json::Value;
use std::sync::Arc;

// 2026-10-14 is a Wednesday.
fn wednesday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap()
}

fn user(email: &str) -> User {
    User {
        email: email.into(),
        full_name: "Test User".into(),
        personalized_notifications: true,
        api_token: None,
    }
}

fn classifier(store: Arc<MemoryStore>) -> EngagementClassifier {
    EngagementClassifier::with_config(
        store,
        EngagementConfig {
            seed: Some(7),
            ..Default::default()
        },
    )
}

async fn notifications_for(store: &MemoryStore, email: &str) -> Vec<Notification> {
    Entities::new(store)
        .filter::<Notification>(&Query::new().eq("user_email", email))
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.data)
        .collect()
}

async fn tracker_for(store: &MemoryStore, email: &str) -> EngagementTracker {
    Entities::new(store)
        .first::<EngagementTracker>(Query::new().eq("user_email", email))
        .await
        .unwrap()
        .unwrap()
        .data
}

#[tokio::test]
async fn test_48h_lapse_with_yesterdays_guard() {
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    let now = wednesday();
    let yesterday = now.date_naive().pred_opt().unwrap();

    entities.create(&user("ruth@example.com")).await.unwrap();
    entities
        .create(&EngagementTracker {
            user_email: "ruth@example.com".into(),
            last_active_date: Some(now - Duration::hours(50)),
            last_low_engagement_notification: Some(yesterday),
            ..Default::default()
        })
        .await
        .unwrap();

    let run = classifier(store.clone()).run_at(now).await.unwrap();
    assert_eq!(run.notifications_sent, 1);
    assert!(run.failures.is_empty());

    let sent = notifications_for(&store, "ruth@example.com").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Gideon is thinking of you 💭");
    assert!(!sent[0].read);

    let tracker = tracker_for(&store, "ruth@example.com").await;
    assert_eq!(tracker.last_low_engagement_notification, Some(now.date_naive()));
}

#[tokio::test]
async fn test_second_run_same_day_only_repeats_unguarded_groups() {
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    let now = wednesday();

    entities.create(&user("boaz@example.com")).await.unwrap();
    entities
        .create(&EngagementTracker {
            user_email: "boaz@example.com".into(),
            last_active_date: Some(now - Duration::hours(30)),
            engagement_level: EngagementLevel::High,
            current_streak: 10,
            emotional_tone_history: vec!["hopeful".into(), "anxious".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    let job = classifier(store.clone());
    // lapse + high engagement + tone + streak
    let first = job.run_at(now).await.unwrap();
    assert_eq!(first.notifications_sent, 4);

    // Only the tone message is unguarded.
    let second = job.run_at(now + Duration::hours(2)).await.unwrap();
    assert_eq!(second.notifications_sent, 1);
    assert_eq!(notifications_for(&store, "boaz@example.com").await.len(), 5);

    let tracker = tracker_for(&store, "boaz@example.com").await;
    let today = Some(now.date_naive());
    assert_eq!(tracker.last_low_engagement_notification, today);
    assert_eq!(tracker.last_high_engagement_notification, today);
    assert_eq!(tracker.last_streak_notification, today);
}

#[tokio::test]
async fn test_theme_and_broken_streak_repeat_on_same_day() {
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    let now = wednesday();

    entities.create(&user("jesse@example.com")).await.unwrap();
    entities
        .create(&EngagementTracker {
            user_email: "jesse@example.com".into(),
            last_active_date: Some(now - Duration::hours(30)),
            engagement_level: EngagementLevel::High,
            current_streak: 2,
            streak_broken_date: Some(now.date_naive()),
            emotional_tone_history: vec!["anxious".into()],
            spiritual_theme_history: vec!["trust".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    let job = classifier(store.clone());
    // lapse + high engagement + tone + theme + streak broken
    assert_eq!(job.run_at(now).await.unwrap().notifications_sent, 5);
    // tone + theme + streak broken
    assert_eq!(
        job.run_at(now + Duration::hours(3)).await.unwrap().notifications_sent,
        3
    );

    let sent = notifications_for(&store, "jesse@example.com").await;
    let count = |title: &str| sent.iter().filter(|n| n.title == title).count();
    assert_eq!(count("Learning to trust"), 2);
    assert_eq!(count("Grace for a fresh start"), 2);
    assert_eq!(count("We saved your seat 🙏"), 1);

    let tracker = tracker_for(&store, "jesse@example.com").await;
    assert_eq!(tracker.last_streak_notification, None);
}

#[tokio::test]
async fn test_opted_out_and_trackerless_users_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    let now = wednesday();

    let mut quiet = user("naomi@example.com");
    quiet.personalized_notifications = false;
    entities.create(&quiet).await.unwrap();
    entities.create(&user("orpah@example.com")).await.unwrap();
    entities
        .create(&EngagementTracker {
            user_email: "naomi@example.com".into(),
            last_active_date: Some(now - Duration::hours(80)),
            ..Default::default()
        })
        .await
        .unwrap();

    let run = classifier(store.clone()).run_at(now).await.unwrap();
    assert_eq!(run.users_evaluated, 0);
    assert_eq!(run.notifications_sent, 0);
    assert_eq!(store.count(EntityKind::Notification).await, 0);
}

/// Fails every notification write addressed to one email.
struct FailingFor {
    inner: MemoryStore,
    email: &'static str,
}

#[async_trait]
impl EntityStore for FailingFor {
    async fn list(&self, kind: EntityKind) -> Result<Vec<Value>, StoreError> {
        self.inner.list(kind).await
    }

    async fn filter(&self, kind: EntityKind, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.inner.filter(kind, query).await
    }

    async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, StoreError> {
        if kind == EntityKind::Notification && data["user_email"] == self.email {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.create(kind, data).await
    }

    async fn update(&self, kind: EntityKind, id: &str, patch: Value) -> Result<Value, StoreError> {
        self.inner.update(kind, id, patch).await
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), StoreError> {
        self.inner.delete(kind, id).await
    }
}

#[tokio::test]
async fn test_one_failing_user_does_not_stop_the_batch() {
    let store = Arc::new(FailingFor {
        inner: MemoryStore::new(),
        email: "bad@example.com",
    });
    let entities = Entities::new(store.as_ref());
    let now = wednesday();

    for email in ["bad@example.com", "good@example.com"] {
        entities.create(&user(email)).await.unwrap();
        entities
            .create(&EngagementTracker {
                user_email: email.into(),
                last_active_date: Some(now - Duration::hours(26)),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let run = EngagementClassifier::new(store.clone()).run_at(now).await.unwrap();
    assert_eq!(run.notifications_sent, 1);
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].user, "bad@example.com");
    assert!(run.failures[0].error.contains("disk full"));

    let generator = SuggestionGenerator::new(store.clone());
    let run = generator.run_at(now).await.unwrap();
    // Wednesday with no history: nothing fires, nothing fails.
    assert_eq!(run.suggestions_created, 0);
    assert!(run.failures.is_empty());
}

async fn seed_journal(entities: &Entities<'_>, email: &str, content: &str) {
    entities
        .create(&JournalEntry {
            created_by: email.into(),
            title: "Today".into(),
            content: content.into(),
            mood: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_journal_theme_beats_answered_prayer() {
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    let email = "hannah@example.com";

    entities.create(&user(email)).await.unwrap();
    seed_journal(&entities, email, "I keep worrying about work").await;
    seed_journal(&entities, email, "Long day").await;
    entities
        .create(&PrayerJournal {
            created_by: email.into(),
            title: "A child".into(),
            content: "Lord, hear me".into(),
            answered: true,
        })
        .await
        .unwrap();

    let run = SuggestionGenerator::new(store.clone())
        .run_at(wednesday())
        .await
        .unwrap();
    assert_eq!(run.suggestions_created, 1);
    assert_eq!(run.details[0].suggestion_type, SuggestionType::VerseRecommendation);

    let saved = entities.list::<ProactiveSuggestion>().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].priority, 9);
    assert!(saved[0].message.contains("Philippians 4:6-7"));
}

#[tokio::test]
async fn test_unread_suggestion_blocks_new_one() {
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    let email = "eli@example.com";
    entities.create(&user(email)).await.unwrap();
    seed_journal(&entities, email, "so tired").await;
    seed_journal(&entities, email, "weak").await;

    let generator = SuggestionGenerator::new(store.clone());
    assert_eq!(generator.run_at(wednesday()).await.unwrap().suggestions_created, 1);
    assert_eq!(generator.run_at(wednesday()).await.unwrap().suggestions_created, 0);
    assert_eq!(store.count(EntityKind::ProactiveSuggestion).await, 1);

    // Reading it reopens the gate.
    let pending = entities.list::<ProactiveSuggestion>().await.unwrap();
    entities
        .update::<ProactiveSuggestion>(&pending[0].id, serde_json::json!({"read": true}))
        .await
        .unwrap();
    assert_eq!(generator.run_at(wednesday()).await.unwrap().suggestions_created, 1);
}

#[tokio::test]
async fn test_sunday_fallback_for_new_user() {
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    entities.create(&user("new@example.com")).await.unwrap();
    let sunday = Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap();

    let run = SuggestionGenerator::new(store.clone())
        .run_at(sunday)
        .await
        .unwrap();
    assert_eq!(run.suggestions_created, 1);

    let saved = entities.list::<ProactiveSuggestion>().await.unwrap();
    assert_eq!(saved[0].suggestion_type, SuggestionType::SabbathReflection);
    assert_eq!(saved[0].priority, 6);
    assert!(!saved[0].read);
    assert_eq!(saved[0].expires_at, sunday + Duration::days(5));
    assert_eq!(
        saved[0].expires_at.date_naive(),
        NaiveDate::from_ymd_opt(2026, 10, 23).unwrap()
    );
}
