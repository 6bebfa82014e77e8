//! Proactive suggestion generator
//!
//! At most one suggestion per user per run, and none while an unread one is
//! still waiting.

use chrono::{DateTime, Utc};
use prosper_core::config::SuggestionConfig;
use prosper_core::prelude::*;
use prosper_core::{
    Bookmark, GoalStatus, JournalEntry, PrayerJournal, ProactiveSuggestion, ReadingPlanProgress,
    SpiritualGoal, SpiritualThemeInsight, SuggestionType, User,
};
use serde::Serialize;
use std::sync::Arc;

use crate::scenarios::{default_cascade, expiry_from, first_match, Scenario, UserSnapshot};

const JOURNAL_LIMIT: usize = 5;
const PRAYER_LIMIT: usize = 10;
const BOOKMARK_LIMIT: usize = 10;
const THEME_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionDetail {
    pub user: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratorRun {
    pub suggestions_created: usize,
    pub details: Vec<SuggestionDetail>,
    pub failures: Vec<UserFailure>,
}

pub struct SuggestionGenerator {
    store: Arc<dyn EntityStore>,
    scenarios: Vec<Box<dyn Scenario>>,
    config: SuggestionConfig,
}

impl SuggestionGenerator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self::with_config(store, SuggestionConfig::default())
    }

    pub fn with_config(store: Arc<dyn EntityStore>, config: SuggestionConfig) -> Self {
        Self {
            store,
            scenarios: default_cascade(),
            config,
        }
    }

    pub async fn run(&self) -> Result<GeneratorRun, JobError> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<GeneratorRun, JobError> {
        let entities = Entities::new(self.store.as_ref());
        let users = entities.list::<User>().await?;
        let mut run = GeneratorRun::default();

        for user in &users {
            match self.process_user(&user.email, now).await {
                Ok(Some(suggestion_type)) => {
                    run.suggestions_created += 1;
                    run.details.push(SuggestionDetail {
                        user: user.email.clone(),
                        suggestion_type,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Suggestion generation failed for {}: {}", user.email, e);
                    run.failures.push(UserFailure::new(&user.email, &e));
                }
            }
        }

        tracing::info!(
            "Suggestion generation complete: {} created, {} failures",
            run.suggestions_created,
            run.failures.len()
        );
        Ok(run)
    }

    async fn process_user(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SuggestionType>, JobError> {
        let entities = Entities::new(self.store.as_ref());

        let pending = entities
            .filter::<ProactiveSuggestion>(
                &Query::new().eq("user_email", email).eq("read", false).limit(1),
            )
            .await?;
        if !pending.is_empty() {
            tracing::debug!("{} already has an unread suggestion", email);
            return Ok(None);
        }

        let snapshot = self.snapshot(email).await?;
        let Some((scenario, draft)) = first_match(&self.scenarios, &snapshot, now) else {
            return Ok(None);
        };

        let suggestion_type = draft.suggestion_type;
        let suggestion =
            draft.into_suggestion(email, expiry_from(now, self.config.expiry_days));
        entities.create(&suggestion).await?;
        tracing::debug!("Suggested {} to {} via {}", suggestion_type, email, scenario);
        Ok(Some(suggestion_type))
    }

    async fn snapshot(&self, email: &str) -> Result<UserSnapshot, JobError> {
        let entities = Entities::new(self.store.as_ref());
        let recent = |limit| Query::new().owned_by(email).newest_first().limit(limit);

        Ok(UserSnapshot {
            journals: entities.filter::<JournalEntry>(&recent(JOURNAL_LIMIT)).await?,
            prayers: entities.filter::<PrayerJournal>(&recent(PRAYER_LIMIT)).await?,
            reading: entities.first::<ReadingPlanProgress>(recent(1)).await?,
            bookmarks: entities.filter::<Bookmark>(&recent(BOOKMARK_LIMIT)).await?,
            active_goal: entities
                .first::<SpiritualGoal>(recent(1).eq("status", GoalStatus::Active.as_str()))
                .await?,
            themes: entities
                .filter::<SpiritualThemeInsight>(
                    &Query::new()
                        .owned_by(email)
                        .sort_by("-occurrences")
                        .limit(THEME_LIMIT),
                )
                .await?,
        })
    }
}
