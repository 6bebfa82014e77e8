//! Holistic report end to end: in-memory store, scripted LLM.

use chrono::{DateTime, Duration, TimeZone, Utc};
use prosper_core::{
    CorrelationType, Entities, Entity, JobError, JournalEntry, MealLog, PrayerJournal,
    UserProgress, WorkoutSession,
};
use prosper_reasoning::providers::MockProvider;
use prosper_reasoning::report::build_presence_map;
use prosper_reasoning::HolisticReporter;
use prosper_store::MemoryStore;
use std::sync::Arc;

const RUTH: &str = "ruth@example.com";

const REPLY: &str = r#"```json
{
  "overall_summary": "A faithful month.",
  "interconnected_insights": ["Movement and joy walk together."],
  "areas_of_strength": ["Morning workouts"],
  "growth_opportunities": ["Sabbath rest"],
  "personalized_recommendation": "Walk, then pray."
}
```"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 20, 0, 0).unwrap()
}

async fn add<T: Entity>(store: &MemoryStore, data: T, days_ago: i64) {
    Entities::new(store)
        .import(&data, now() - Duration::days(days_ago))
        .await
        .unwrap();
}

fn workout(owner: &str, minutes: u32) -> WorkoutSession {
    WorkoutSession {
        created_by: owner.into(),
        workout_type: "run".into(),
        duration_minutes: minutes,
    }
}

fn journal(owner: &str, mood: &str) -> JournalEntry {
    JournalEntry {
        created_by: owner.into(),
        title: "Evening".into(),
        content: "...".into(),
        mood: Some(mood.into()),
    }
}

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for days_ago in [1, 2, 3] {
        add(&store, workout(RUTH, 30), days_ago).await;
        add(&store, journal(RUTH, "Grateful"), days_ago).await;
    }
    add(
        &store,
        MealLog {
            created_by: RUTH.into(),
            meal_type: "breakfast".into(),
            calories: 450,
        },
        1,
    )
    .await;
    add(
        &store,
        PrayerJournal {
            created_by: RUTH.into(),
            title: "Healing".into(),
            content: "".into(),
            answered: true,
        },
        4,
    )
    .await;
    add(
        &store,
        UserProgress {
            created_by: RUTH.into(),
            current_streak: 12,
            total_points: 300,
            level: 3,
        },
        0,
    )
    .await;
    // Outside the 30-day window.
    add(&store, workout(RUTH, 90), 45).await;
    // Someone else's data.
    for days_ago in [1, 2, 3, 4] {
        add(&store, workout("boaz@example.com", 60), days_ago).await;
    }
    store
}

#[tokio::test]
async fn test_report_combines_llm_sections_with_computed_data() {
    let store = seeded_store().await;
    let llm = Arc::new(MockProvider::with_reply(REPLY));
    let reporter = HolisticReporter::new(store.clone(), llm.clone());

    let report = reporter.generate(RUTH, now()).await.unwrap();

    assert_eq!(report.generated.overall_summary, "A faithful month.");
    assert_eq!(report.generated.areas_of_strength, vec!["Morning workouts"]);

    let summary = &report.data_summary;
    assert_eq!(summary.fitness.workouts, 3);
    assert_eq!(summary.fitness.total_minutes, 90);
    assert_eq!(summary.fitness.active_days, 3);
    assert_eq!(summary.nutrition.total_calories, 450);
    assert_eq!(summary.spiritual.answered_prayers, 1);
    assert_eq!(summary.consistency_days, 4);
    assert_eq!(summary.current_streak, 12);

    assert_eq!(report.correlations.len(), 1);
    assert_eq!(report.correlations[0].correlation_type, CorrelationType::WorkoutMood);
    assert_eq!(report.correlations[0].frequency, 3);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"current_streak\": 12"));
    assert!(prompts[0].contains("workout_mood"));
}

#[tokio::test]
async fn test_report_serializes_flat_sections() {
    let store = seeded_store().await;
    let reporter = HolisticReporter::new(store, Arc::new(MockProvider::with_reply(REPLY)));
    let report = reporter.generate(RUTH, now()).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["personalized_recommendation"], "Walk, then pray.");
    assert!(json["generated_date"].is_string());
    assert_eq!(json["correlations"][0]["type"], "workout_mood");
    assert_eq!(json["correlations"][0]["confidence"], "high");
    assert_eq!(json["data_summary"]["fitness"]["workouts"], 3);
}

#[tokio::test]
async fn test_unparseable_reply_fails_whole_report() {
    let store = seeded_store().await;
    let reporter = HolisticReporter::new(
        store,
        Arc::new(MockProvider::with_reply("I'd rather write a poem.")),
    );
    let err = reporter.generate(RUTH, now()).await.unwrap_err();
    assert!(matches!(err, JobError::Llm(_)));
}

#[tokio::test]
async fn test_reply_missing_sections_is_malformed() {
    let store = seeded_store().await;
    let reporter = HolisticReporter::new(
        store,
        Arc::new(MockProvider::with_reply(r#"{"overall_summary": "only this"}"#)),
    );
    let err = reporter.generate(RUTH, now()).await.unwrap_err();
    assert!(matches!(err, JobError::MalformedReply(_)));
}

#[tokio::test]
async fn test_empty_user_gets_zeroed_summary() {
    let store = Arc::new(MemoryStore::new());
    let reporter = HolisticReporter::new(store, Arc::new(MockProvider::new("mock")));
    let report = reporter.generate("new@example.com", now()).await.unwrap();
    assert_eq!(report.data_summary.consistency_days, 0);
    assert_eq!(report.data_summary.current_streak, 0);
    assert!(report.correlations.is_empty());
    assert!(!report.generated.overall_summary.is_empty());
}

#[tokio::test]
async fn test_large_totals_do_not_overflow() {
    let store = Arc::new(MemoryStore::new());
    for days_ago in [1, 2] {
        add(
            &store,
            MealLog {
                created_by: RUTH.into(),
                meal_type: "feast".into(),
                calories: 3_000_000_000,
            },
            days_ago,
        )
        .await;
        add(&store, workout(RUTH, u32::MAX), days_ago).await;
    }

    let reporter = HolisticReporter::new(store, Arc::new(MockProvider::new("mock")));
    let summary = reporter.generate(RUTH, now()).await.unwrap().data_summary;
    assert_eq!(summary.nutrition.total_calories, 6_000_000_000);
    assert_eq!(summary.fitness.total_minutes, 2 * u64::from(u32::MAX));
}

#[tokio::test]
async fn test_earliest_journal_of_the_day_sets_mood() {
    // Journals are fetched newest first, so the last one folded in is the
    // earliest of the day.
    let store = Arc::new(MemoryStore::new());
    let entities = Entities::new(store.as_ref());
    let day = now() - Duration::days(2);
    entities
        .import(&journal(RUTH, "Sad"), day - Duration::hours(12))
        .await
        .unwrap();
    entities.import(&journal(RUTH, "Good"), day).await.unwrap();

    let reporter = HolisticReporter::new(store.clone(), Arc::new(MockProvider::new("mock")));
    let inputs = reporter.fetch(RUTH, now()).await.unwrap();
    let map = build_presence_map(inputs.activities());
    assert_eq!(map.len(), 1);
    assert_eq!(
        map.values().next().unwrap().journal_mood.as_deref(),
        Some("Sad")
    );
}
