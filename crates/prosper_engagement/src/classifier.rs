//! Engagement classifier
//!
//! Reads each opted-in user's tracker and emits templated notifications.
//! The rule groups are independent: one pass may notify a user several times.
//! Lapse, high-engagement and streak-maintained are guarded by a per-day
//! stamp on the tracker; tone, theme, streak-broken and deep-study are not.

use chrono::{DateTime, NaiveDate, Utc};
use prosper_core::config::EngagementConfig;
use prosper_core::prelude::*;
use prosper_core::store::patch;
use prosper_core::{EngagementLevel, EngagementTracker, User};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::catalog::Bucket;

/// Hours-since-active tier. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapseTier {
    Day,
    TwoDays,
    ThreeDays,
}

impl LapseTier {
    pub fn from_hours(hours: f64) -> Option<Self> {
        if hours >= 72.0 {
            Some(LapseTier::ThreeDays)
        } else if hours >= 48.0 {
            Some(LapseTier::TwoDays)
        } else if hours >= 24.0 {
            Some(LapseTier::Day)
        } else {
            None
        }
    }

    pub fn bucket(&self) -> Bucket {
        match self {
            LapseTier::Day => Bucket::Lapse24h,
            LapseTier::TwoDays => Bucket::Lapse48h,
            LapseTier::ThreeDays => Bucket::Lapse72h,
        }
    }
}

pub fn hours_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / 3_600_000.0
}

/// Guard fields to stamp with today's date after notifying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardStamps {
    pub low_engagement: bool,
    pub high_engagement: bool,
    pub streak: bool,
}

impl GuardStamps {
    pub fn is_empty(&self) -> bool {
        !(self.low_engagement || self.high_engagement || self.streak)
    }

    pub fn to_patch(&self, today: NaiveDate) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        let stamp = Value::String(today.to_string());
        let fields = [
            (self.low_engagement, "last_low_engagement_notification"),
            (self.high_engagement, "last_high_engagement_notification"),
            (self.streak, "last_streak_notification"),
        ];
        Some(patch(
            fields
                .into_iter()
                .filter(|(set, _)| *set)
                .map(|(_, field)| (field, stamp.clone())),
        ))
    }
}

/// Buckets that fire for one tracker, plus the guard stamps they require.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub buckets: Vec<Bucket>,
    pub stamps: GuardStamps,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifierRun {
    pub users_evaluated: usize,
    pub notifications_sent: usize,
    pub failures: Vec<UserFailure>,
}

impl ClassifierRun {
    pub fn message(&self) -> String {
        format!(
            "Engagement analysis complete: {} users evaluated, {} notifications sent, {} failures",
            self.users_evaluated,
            self.notifications_sent,
            self.failures.len()
        )
    }
}

pub struct EngagementClassifier {
    store: Arc<dyn EntityStore>,
    config: EngagementConfig,
    rng: Mutex<StdRng>,
}

impl EngagementClassifier {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_config(store, EngagementConfig::default())
    }

    pub fn with_config(store: Arc<dyn EntityStore>, config: EngagementConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Decide which buckets fire for `tracker` at `now`. Pure.
    pub fn evaluate(&self, tracker: &EngagementTracker, now: DateTime<Utc>) -> Evaluation {
        let today = now.date_naive();
        let mut eval = Evaluation::default();

        // 1. Lapse tier
        if tracker.last_low_engagement_notification != Some(today) {
            if let Some(tier) = tracker
                .last_active_date
                .and_then(|last| LapseTier::from_hours(hours_since(last, now)))
            {
                eval.buckets.push(tier.bucket());
                eval.stamps.low_engagement = true;
            }
        }

        // 2. High engagement
        if tracker.engagement_level == EngagementLevel::High
            && tracker.last_high_engagement_notification != Some(today)
        {
            eval.buckets.push(Bucket::HighEngagement);
            eval.stamps.high_engagement = true;
        }

        // 3. Emotional tone (most recent only)
        if let Some(bucket) = tracker
            .emotional_tone_history
            .last()
            .and_then(|t| Bucket::for_tone(t))
        {
            eval.buckets.push(bucket);
        }

        // 4. Spiritual theme (most recent only)
        if let Some(bucket) = tracker
            .spiritual_theme_history
            .last()
            .and_then(|t| Bucket::for_theme(t))
        {
            eval.buckets.push(bucket);
        }

        // 5. Streak: maintained and broken are exclusive
        if tracker.current_streak >= self.config.streak_milestone
            && tracker.last_streak_notification != Some(today)
        {
            eval.buckets.push(Bucket::StreakMaintained);
            eval.stamps.streak = true;
        } else if tracker.streak_broken_date == Some(today) {
            eval.buckets.push(Bucket::StreakBroken);
        }

        // 6. Deep study
        if tracker.deep_study_count >= self.config.deep_study_threshold
            && tracker.engagement_level == EngagementLevel::High
        {
            eval.buckets.push(Bucket::DeepStudy);
        }

        eval
    }

    pub async fn run(&self) -> Result<ClassifierRun, JobError> {
        self.run_at(Utc::now()).await
    }

    /// Evaluate every opted-in user. A failing user is logged and skipped;
    /// only a failure to list users aborts the run.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ClassifierRun, JobError> {
        let entities = Entities::new(self.store.as_ref());
        let users = entities.list::<User>().await?;
        let mut run = ClassifierRun::default();

        for user in users.iter().filter(|u| u.personalized_notifications) {
            match self.process_user(&user.email, now).await {
                Ok(None) => {}
                Ok(Some(sent)) => {
                    run.users_evaluated += 1;
                    run.notifications_sent += sent;
                }
                Err(e) => {
                    tracing::warn!("Engagement analysis failed for {}: {}", user.email, e);
                    run.failures.push(UserFailure::new(&user.email, &e));
                }
            }
        }

        tracing::info!("{}", run.message());
        Ok(run)
    }

    /// Returns `None` when the user has no tracker yet.
    async fn process_user(&self, email: &str, now: DateTime<Utc>) -> Result<Option<usize>, JobError> {
        let entities = Entities::new(self.store.as_ref());
        let Some(tracker) = entities
            .first::<EngagementTracker>(Query::new().eq("user_email", email))
            .await?
        else {
            tracing::debug!("No engagement tracker for {}, skipping", email);
            return Ok(None);
        };

        let eval = self.evaluate(&tracker, now);
        for bucket in &eval.buckets {
            let notification = {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                bucket.compose(email, &mut *rng)
            };
            entities.create(&notification).await?;
            tracing::debug!("Notified {} ({})", email, bucket.name());
        }

        if let Some(stamps) = eval.stamps.to_patch(now.date_naive()) {
            entities
                .update::<EngagementTracker>(&tracker.id, stamps)
                .await?;
        }

        Ok(Some(eval.buckets.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn classifier() -> EngagementClassifier {
        EngagementClassifier::with_config(
            Arc::new(prosper_store::MemoryStore::new()),
            EngagementConfig {
                seed: Some(1),
                ..Default::default()
            },
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_lapse_partition_boundaries() {
        let cases = [
            (23.9, None),
            (24.0, Some(LapseTier::Day)),
            (47.9, Some(LapseTier::Day)),
            (48.0, Some(LapseTier::TwoDays)),
            (71.9, Some(LapseTier::TwoDays)),
            (72.0, Some(LapseTier::ThreeDays)),
            (100.0, Some(LapseTier::ThreeDays)),
        ];
        for (hours, expected) in cases {
            assert_eq!(LapseTier::from_hours(hours), expected, "hours = {}", hours);
        }
    }

    #[test]
    fn test_quiet_tracker_fires_nothing() {
        let tracker = EngagementTracker {
            user_email: "a@b.c".into(),
            last_active_date: Some(now() - Duration::hours(2)),
            ..Default::default()
        };
        let eval = classifier().evaluate(&tracker, now());
        assert!(eval.buckets.is_empty());
        assert!(eval.stamps.to_patch(now().date_naive()).is_none());
    }

    #[test]
    fn test_all_groups_can_fire_together() {
        let tracker = EngagementTracker {
            user_email: "a@b.c".into(),
            last_active_date: Some(now() - Duration::hours(80)),
            engagement_level: EngagementLevel::High,
            current_streak: 12,
            emotional_tone_history: vec!["hopeful".into(), "anxious".into()],
            spiritual_theme_history: vec!["trust".into()],
            deep_study_count: 6,
            ..Default::default()
        };
        let eval = classifier().evaluate(&tracker, now());
        assert_eq!(
            eval.buckets,
            vec![
                Bucket::Lapse72h,
                Bucket::HighEngagement,
                Bucket::ToneAnxious,
                Bucket::ThemeTrust,
                Bucket::StreakMaintained,
                Bucket::DeepStudy,
            ]
        );
        assert_eq!(
            eval.stamps,
            GuardStamps {
                low_engagement: true,
                high_engagement: true,
                streak: true
            }
        );
    }

    #[test]
    fn test_only_last_tone_counts() {
        let tracker = EngagementTracker {
            emotional_tone_history: vec!["anxious".into(), "content".into()],
            ..Default::default()
        };
        let eval = classifier().evaluate(&tracker, now());
        assert!(eval.buckets.is_empty());
    }

    #[test]
    fn test_streak_broken_only_when_maintained_does_not_fire() {
        let today = now().date_naive();
        let broken_today = EngagementTracker {
            current_streak: 0,
            streak_broken_date: Some(today),
            ..Default::default()
        };
        assert_eq!(
            classifier().evaluate(&broken_today, now()).buckets,
            vec![Bucket::StreakBroken]
        );

        // Already notified about the streak today: falls through to the else branch.
        let guarded = EngagementTracker {
            current_streak: 9,
            last_streak_notification: Some(today),
            streak_broken_date: Some(today),
            ..Default::default()
        };
        assert_eq!(
            classifier().evaluate(&guarded, now()).buckets,
            vec![Bucket::StreakBroken]
        );

        let maintained = EngagementTracker {
            current_streak: 9,
            streak_broken_date: Some(today),
            ..Default::default()
        };
        assert_eq!(
            classifier().evaluate(&maintained, now()).buckets,
            vec![Bucket::StreakMaintained]
        );
    }

    #[test]
    fn test_deep_study_requires_high_engagement() {
        let tracker = EngagementTracker {
            deep_study_count: 8,
            engagement_level: EngagementLevel::Normal,
            ..Default::default()
        };
        assert!(classifier().evaluate(&tracker, now()).buckets.is_empty());
    }

    #[test]
    fn test_guard_patch_only_sets_stamped_fields() {
        let stamps = GuardStamps {
            low_engagement: true,
            high_engagement: false,
            streak: true,
        };
        let p = stamps.to_patch(now().date_naive()).unwrap();
        assert_eq!(p["last_low_engagement_notification"], "2026-10-14");
        assert_eq!(p["last_streak_notification"], "2026-10-14");
        assert!(p.get("last_high_engagement_notification").is_none());
    }
}
