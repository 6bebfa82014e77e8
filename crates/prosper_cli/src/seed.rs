//! Demo records for local runs.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use prosper_core::prelude::*;
use prosper_core::{
    Bookmark, ChatbotMemory, EmotionalPattern, EngagementLevel, EngagementTracker, GoalStatus,
    JournalEntry, MealLog, MeditationSession, PrayerJournal, ReadingPlanProgress, SpiritualGoal,
    SpiritualThemeInsight, User, UserProgress, WorkoutSession,
};
use serde::Serialize;

pub const DEMO_USERS: [(&str, &str, &str); 2] = [
    ("ruth@example.com", "Ruth", "demo-ruth-token"),
    ("boaz@example.com", "Boaz", "demo-boaz-token"),
];

#[derive(Debug, Default, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub records: usize,
}

struct Seeder<'a> {
    entities: Entities<'a>,
    now: DateTime<Utc>,
    records: usize,
}

impl Seeder<'_> {
    async fn add<T: Entity>(&mut self, data: T, days_ago: i64) -> Result<()> {
        self.entities
            .import(&data, self.now - Duration::days(days_ago))
            .await?;
        self.records += 1;
        Ok(())
    }
}

/// Insert the demo data set unless it is already there.
pub async fn seed_demo(store: &dyn EntityStore, now: DateTime<Utc>) -> Result<SeedSummary> {
    let entities = Entities::new(store);
    let (ruth, _, _) = DEMO_USERS[0];
    if entities
        .first::<User>(Query::new().eq("email", ruth))
        .await?
        .is_some()
    {
        tracing::info!("Demo data already present, skipping seed");
        return Ok(SeedSummary::default());
    }

    let mut seeder = Seeder {
        entities,
        now,
        records: 0,
    };

    for (email, name, token) in DEMO_USERS {
        seeder
            .add(
                User {
                    email: email.into(),
                    full_name: name.into(),
                    personalized_notifications: true,
                    api_token: Some(token.into()),
                },
                90,
            )
            .await?;
    }

    // Ruth: active, high engagement, rich history.
    seeder
        .add(
            EngagementTracker {
                user_email: ruth.into(),
                last_active_date: Some(now - Duration::hours(50)),
                engagement_level: EngagementLevel::High,
                current_streak: 9,
                emotional_tone_history: vec!["anxious".into(), "hopeful".into()],
                spiritual_theme_history: vec!["purpose".into(), "trust".into()],
                deep_study_count: 6,
                ..Default::default()
            },
            60,
        )
        .await?;

    for (days_ago, mood) in [(1, "Grateful"), (2, "Good"), (4, "Great"), (6, "Tired")] {
        seeder
            .add(
                JournalEntry {
                    created_by: ruth.into(),
                    title: "Evening reflection".into(),
                    content: "Walked this morning and felt thankful for the quiet.".into(),
                    mood: Some(mood.into()),
                },
                days_ago,
            )
            .await?;
        seeder
            .add(
                WorkoutSession {
                    created_by: ruth.into(),
                    workout_type: "walk".into(),
                    duration_minutes: 35,
                },
                days_ago,
            )
            .await?;
        seeder
            .add(
                MealLog {
                    created_by: ruth.into(),
                    meal_type: "breakfast".into(),
                    calories: 420,
                },
                days_ago,
            )
            .await?;
    }

    for (days_ago, title, answered) in [(3, "Mum's recovery", true), (8, "New job", false)] {
        seeder
            .add(
                PrayerJournal {
                    created_by: ruth.into(),
                    title: title.into(),
                    content: "Lord, you know what I need.".into(),
                    answered,
                },
                days_ago,
            )
            .await?;
    }
    seeder
        .add(
            MeditationSession {
                created_by: ruth.into(),
                meditation_type: "breath prayer".into(),
                duration_minutes: 10,
            },
            2,
        )
        .await?;
    seeder
        .add(
            ReadingPlanProgress {
                created_by: ruth.into(),
                plan_name: "Gospel of John".into(),
                completed_days: 16,
                total_days: 21,
            },
            1,
        )
        .await?;
    seeder
        .add(
            Bookmark {
                created_by: ruth.into(),
                reference: "Psalm 23".into(),
                note: Some("Read at the hospital".into()),
            },
            20,
        )
        .await?;
    seeder
        .add(
            SpiritualGoal {
                created_by: ruth.into(),
                title: "Pray before breakfast".into(),
                status: GoalStatus::Active,
                target_date: None,
            },
            10,
        )
        .await?;
    for (theme, occurrences) in [("surrender", 5), ("gratitude", 3)] {
        seeder
            .add(
                SpiritualThemeInsight {
                    created_by: ruth.into(),
                    theme: theme.into(),
                    description: format!("{} keeps surfacing in your conversations.", theme),
                    occurrences,
                },
                5,
            )
            .await?;
    }
    seeder
        .add(
            EmotionalPattern {
                created_by: ruth.into(),
                emotion: "hopeful".into(),
                intensity: 0.7,
            },
            2,
        )
        .await?;
    seeder
        .add(
            ChatbotMemory {
                created_by: ruth.into(),
                summary: "Caring for her mother after surgery.".into(),
            },
            7,
        )
        .await?;
    seeder
        .add(
            UserProgress {
                created_by: ruth.into(),
                current_streak: 9,
                total_points: 640,
                level: 4,
            },
            0,
        )
        .await?;

    // Boaz: lapsed for three days, streak broken today.
    let (boaz, _, _) = DEMO_USERS[1];
    seeder
        .add(
            EngagementTracker {
                user_email: boaz.into(),
                last_active_date: Some(now - Duration::hours(80)),
                streak_broken_date: Some(now.date_naive()),
                emotional_tone_history: vec!["discouraged".into()],
                ..Default::default()
            },
            30,
        )
        .await?;

    let summary = SeedSummary {
        users: DEMO_USERS.len(),
        records: seeder.records,
    };
    tracing::info!("Seeded {} demo records", summary.records);
    Ok(summary)
}
