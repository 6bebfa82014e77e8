//! Holistic correlation report
//!
//! Reads a window of the caller's records across fitness, nutrition,
//! spiritual and emotional guides, marks which activities happened on each
//! calendar day (UTC), counts co-occurring activity pairs, and asks the LLM to
//! write the prose around those numbers.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use prosper_core::config::{CorrelationConfig, ReportConfig};
use prosper_core::prelude::*;
use prosper_core::{
    ChatbotMemory, Correlation, CorrelationType, EmotionalPattern, GoalStatus, JournalEntry,
    MealLog, MeditationSession, PrayerJournal, ReadingPlanProgress, SpiritualGoal, UserProgress,
    WorkoutSession,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::invoke::{invoke_llm, LlmOutput};
use crate::llm::{CompletionParams, LlmClient};

// ============================================================================
// Fetch limits
// ============================================================================

const MEMORY_LIMIT: usize = 20;
const JOURNAL_LIMIT: usize = 30;
const WORKOUT_LIMIT: usize = 30;
const MEAL_LIMIT: usize = 50;
const PRAYER_LIMIT: usize = 30;
const READING_LIMIT: usize = 10;
const GOAL_LIMIT: usize = 20;
const EMOTION_LIMIT: usize = 20;
const MEDITATION_LIMIT: usize = 30;

/// Moods that count as "good" for the workout/mood correlation.
const GOOD_MOODS: &[&str] = &["good", "great", "joyful", "grateful"];

// ============================================================================
// Presence map
// ============================================================================

/// One dated record, tagged with the collection it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    Journal { day: NaiveDate, mood: Option<String> },
    Workout { day: NaiveDate },
    Prayer { day: NaiveDate },
    Meditation { day: NaiveDate },
    Meal { day: NaiveDate },
}

impl Activity {
    pub fn day(&self) -> NaiveDate {
        match self {
            Activity::Journal { day, .. }
            | Activity::Workout { day }
            | Activity::Prayer { day }
            | Activity::Meditation { day }
            | Activity::Meal { day } => *day,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayPresence {
    pub has_journal: bool,
    pub journal_mood: Option<String>,
    pub has_workout: bool,
    pub has_prayer: bool,
    pub has_meditation: bool,
    pub has_meal: bool,
}

impl DayPresence {
    fn has_good_mood(&self) -> bool {
        self.journal_mood
            .as_deref()
            .map(|m| GOOD_MOODS.contains(&m.trim().to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// Fold activities into per-day flags. Flags are OR-ed; the journal mood of a
/// day is whichever journal came last.
pub fn build_presence_map<I>(activities: I) -> BTreeMap<NaiveDate, DayPresence>
where
    I: IntoIterator<Item = Activity>,
{
    let mut map: BTreeMap<NaiveDate, DayPresence> = BTreeMap::new();
    for activity in activities {
        let day = map.entry(activity.day()).or_default();
        match activity {
            Activity::Journal { mood, .. } => {
                day.has_journal = true;
                day.journal_mood = mood;
            }
            Activity::Workout { .. } => day.has_workout = true,
            Activity::Prayer { .. } => day.has_prayer = true,
            Activity::Meditation { .. } => day.has_meditation = true,
            Activity::Meal { .. } => day.has_meal = true,
        }
    }
    map
}

// ============================================================================
// Correlations
// ============================================================================

pub fn compute_correlations(
    map: &BTreeMap<NaiveDate, DayPresence>,
    config: &CorrelationConfig,
) -> Vec<Correlation> {
    let count = |pred: fn(&DayPresence) -> bool| map.values().filter(|d| pred(d)).count() as u32;

    let candidates = [
        (
            CorrelationType::WorkoutMood,
            count(|d| d.has_workout && d.has_good_mood()),
            config.workout_mood_confidence,
            "workouts coincided with a positive journal mood",
        ),
        (
            CorrelationType::SpiritualJournaling,
            count(|d| (d.has_prayer || d.has_meditation) && d.has_journal),
            config.spiritual_journaling_confidence,
            "prayer or meditation went together with journaling",
        ),
        (
            CorrelationType::NutritionFitness,
            count(|d| d.has_meal && d.has_workout),
            config.nutrition_fitness_confidence,
            "logged meals and workouts happened on the same day",
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, frequency, _, _)| *frequency >= config.min_occurrences)
        .map(|(correlation_type, frequency, confidence, what)| Correlation {
            correlation_type,
            description: format!("On {} days, {}", frequency, what),
            frequency,
            confidence,
        })
        .collect()
}

// ============================================================================
// Data summary
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub workouts: usize,
    pub total_minutes: u64,
    pub active_days: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionSummary {
    pub meals: usize,
    pub total_calories: u64,
    pub logged_days: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpiritualSummary {
    pub prayers: usize,
    pub answered_prayers: usize,
    pub journal_entries: usize,
    pub journal_days: usize,
    pub meditations: usize,
    pub meditation_minutes: u64,
    pub reading_days_completed: u64,
    pub active_goals: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionalSummary {
    pub patterns: usize,
    pub top_emotions: Vec<String>,
    pub memories: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub window_days: i64,
    pub fitness: FitnessSummary,
    pub nutrition: NutritionSummary,
    pub spiritual: SpiritualSummary,
    pub emotional: EmotionalSummary,
    /// Distinct days with any tracked activity.
    pub consistency_days: usize,
    pub current_streak: u32,
}

/// Everything fetched for one report.
#[derive(Debug, Clone, Default)]
pub struct ReportInputs {
    pub memories: Vec<Stored<ChatbotMemory>>,
    pub journals: Vec<Stored<JournalEntry>>,
    pub workouts: Vec<Stored<WorkoutSession>>,
    pub meals: Vec<Stored<MealLog>>,
    pub prayers: Vec<Stored<PrayerJournal>>,
    pub reading: Vec<Stored<ReadingPlanProgress>>,
    pub goals: Vec<Stored<SpiritualGoal>>,
    pub emotions: Vec<Stored<EmotionalPattern>>,
    pub meditations: Vec<Stored<MeditationSession>>,
    pub progress: Option<Stored<UserProgress>>,
}

impl ReportInputs {
    /// Tagged activities, journals first, then workouts, prayers,
    /// meditations and meals.
    pub fn activities(&self) -> Vec<Activity> {
        let day = |ts: DateTime<Utc>| ts.date_naive();
        self.journals
            .iter()
            .map(|j| Activity::Journal {
                day: day(j.created_date),
                mood: j.mood.clone(),
            })
            .chain(self.workouts.iter().map(|w| Activity::Workout { day: day(w.created_date) }))
            .chain(self.prayers.iter().map(|p| Activity::Prayer { day: day(p.created_date) }))
            .chain(
                self.meditations
                    .iter()
                    .map(|m| Activity::Meditation { day: day(m.created_date) }),
            )
            .chain(self.meals.iter().map(|m| Activity::Meal { day: day(m.created_date) }))
            .collect()
    }

    pub fn summarize(
        &self,
        map: &BTreeMap<NaiveDate, DayPresence>,
        window_days: i64,
    ) -> DataSummary {
        let days_where = |pred: fn(&DayPresence) -> bool| map.values().filter(|d| pred(d)).count();

        let mut emotion_counts: BTreeMap<String, usize> = BTreeMap::new();
        for pattern in &self.emotions {
            let emotion = pattern.emotion.trim().to_lowercase();
            if !emotion.is_empty() {
                *emotion_counts.entry(emotion).or_default() += 1;
            }
        }
        let mut ranked: Vec<_> = emotion_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        DataSummary {
            window_days,
            fitness: FitnessSummary {
                workouts: self.workouts.len(),
                total_minutes: self.workouts.iter().map(|w| u64::from(w.duration_minutes)).sum(),
                active_days: days_where(|d| d.has_workout),
            },
            nutrition: NutritionSummary {
                meals: self.meals.len(),
                total_calories: self.meals.iter().map(|m| u64::from(m.calories)).sum(),
                logged_days: days_where(|d| d.has_meal),
            },
            spiritual: SpiritualSummary {
                prayers: self.prayers.len(),
                answered_prayers: self.prayers.iter().filter(|p| p.answered).count(),
                journal_entries: self.journals.len(),
                journal_days: days_where(|d| d.has_journal),
                meditations: self.meditations.len(),
                meditation_minutes: self.meditations.iter().map(|m| u64::from(m.duration_minutes)).sum(),
                reading_days_completed: self.reading.iter().map(|r| u64::from(r.completed_days)).sum(),
                active_goals: self
                    .goals
                    .iter()
                    .filter(|g| g.status == GoalStatus::Active)
                    .count(),
            },
            emotional: EmotionalSummary {
                patterns: self.emotions.len(),
                top_emotions: ranked.into_iter().take(3).map(|(e, _)| e).collect(),
                memories: self.memories.len(),
            },
            consistency_days: map.len(),
            current_streak: self.progress.as_ref().map(|p| p.current_streak).unwrap_or(0),
        }
    }
}

// ============================================================================
// LLM prompt and output
// ============================================================================

/// The five prose sections written by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub overall_summary: String,
    #[serde(default)]
    pub interconnected_insights: Vec<String>,
    #[serde(default)]
    pub areas_of_strength: Vec<String>,
    #[serde(default)]
    pub growth_opportunities: Vec<String>,
    pub personalized_recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolisticReport {
    #[serde(flatten)]
    pub generated: GeneratedReport,
    pub generated_date: DateTime<Utc>,
    pub data_summary: DataSummary,
    pub correlations: Vec<Correlation>,
}

pub fn report_schema() -> Value {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    json!({
        "type": "object",
        "properties": {
            "overall_summary": {"type": "string"},
            "interconnected_insights": string_list,
            "areas_of_strength": string_list,
            "growth_opportunities": string_list,
            "personalized_recommendation": {"type": "string"}
        },
        "required": [
            "overall_summary",
            "interconnected_insights",
            "areas_of_strength",
            "growth_opportunities",
            "personalized_recommendation"
        ]
    })
}

const PROMPT_TEMPLATE: &str = "You are Gideon, a warm faith-based wellness companion. \
Review the last {window} days of this person's activity across their fitness, nutrition, \
spiritual and emotional journey, and write a holistic progress report.

Focus on how the areas connect: where movement lifts mood, where prayer and reflection \
travel together, where nourishment supports strength. Celebrate real strengths, name \
growth opportunities gently, and close with one concrete, encouraging recommendation.

DATA:
{context}

Return overall_summary (2-3 sentences), interconnected_insights, areas_of_strength, \
growth_opportunities and personalized_recommendation.";

pub fn build_prompt(
    inputs: &ReportInputs,
    summary: &DataSummary,
    correlations: &[Correlation],
) -> String {
    let context = json!({
        "data_summary": summary,
        "correlations": correlations,
        "recent_memories": inputs
            .memories
            .iter()
            .take(5)
            .map(|m| m.summary.as_str())
            .collect::<Vec<_>>(),
        "goals": inputs
            .goals
            .iter()
            .map(|g| json!({"title": g.title, "status": g.status}))
            .collect::<Vec<_>>(),
        "reading_plans": inputs
            .reading
            .iter()
            .map(|r| json!({
                "plan": r.plan_name,
                "completed_days": r.completed_days,
                "total_days": r.total_days
            }))
            .collect::<Vec<_>>(),
    });
    let context = serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string());
    PROMPT_TEMPLATE
        .replace("{window}", &summary.window_days.to_string())
        .replace("{context}", &context)
}

// ============================================================================
// Reporter
// ============================================================================

pub struct HolisticReporter {
    store: Arc<dyn EntityStore>,
    llm: Arc<dyn LlmClient>,
    config: ReportConfig,
    params: CompletionParams,
}

impl HolisticReporter {
    pub fn new(store: Arc<dyn EntityStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self::with_config(store, llm, ReportConfig::default(), CompletionParams::default())
    }

    pub fn with_config(
        store: Arc<dyn EntityStore>,
        llm: Arc<dyn LlmClient>,
        config: ReportConfig,
        params: CompletionParams,
    ) -> Self {
        Self {
            store,
            llm,
            config,
            params,
        }
    }

    /// Fetch the window for `user_email`, all reads in parallel.
    pub async fn fetch(&self, user_email: &str, now: DateTime<Utc>) -> Result<ReportInputs, JobError> {
        let entities = Entities::new(self.store.as_ref());
        let since = now - Duration::days(self.config.window_days);
        let window = |limit: usize| {
            Query::new()
                .owned_by(user_email)
                .since("created_date", since)
                .newest_first()
                .limit(limit)
        };
        let (memory_q, journal_q, workout_q, meal_q, prayer_q) = (
            window(MEMORY_LIMIT),
            window(JOURNAL_LIMIT),
            window(WORKOUT_LIMIT),
            window(MEAL_LIMIT),
            window(PRAYER_LIMIT),
        );
        let (reading_q, goal_q, emotion_q, meditation_q) = (
            window(READING_LIMIT),
            window(GOAL_LIMIT),
            window(EMOTION_LIMIT),
            window(MEDITATION_LIMIT),
        );

        let (memories, journals, workouts, meals, prayers, reading, goals, emotions, meditations, progress) =
            tokio::try_join!(
                entities.filter::<ChatbotMemory>(&memory_q),
                entities.filter::<JournalEntry>(&journal_q),
                entities.filter::<WorkoutSession>(&workout_q),
                entities.filter::<MealLog>(&meal_q),
                entities.filter::<PrayerJournal>(&prayer_q),
                entities.filter::<ReadingPlanProgress>(&reading_q),
                entities.filter::<SpiritualGoal>(&goal_q),
                entities.filter::<EmotionalPattern>(&emotion_q),
                entities.filter::<MeditationSession>(&meditation_q),
                entities.first::<UserProgress>(Query::new().owned_by(user_email).newest_first()),
            )?;

        Ok(ReportInputs {
            memories,
            journals,
            workouts,
            meals,
            prayers,
            reading,
            goals,
            emotions,
            meditations,
            progress,
        })
    }

    pub async fn generate(&self, user_email: &str, now: DateTime<Utc>) -> Result<HolisticReport, JobError> {
        let inputs = self.fetch(user_email, now).await?;
        let map = build_presence_map(inputs.activities());
        let correlations = compute_correlations(&map, &self.config.correlation);
        let data_summary = inputs.summarize(&map, self.config.window_days);
        tracing::debug!(
            "Report for {}: {} active days, {} correlations",
            user_email,
            map.len(),
            correlations.len()
        );

        let prompt = build_prompt(&inputs, &data_summary, &correlations);
        let schema = report_schema();
        let output = invoke_llm(self.llm.as_ref(), &prompt, Some(&schema), self.params.clone())
            .await
            .map_err(JobError::Llm)?;
        let LlmOutput::Json(value) = output else {
            return Err(JobError::MalformedReply("expected a JSON reply".into()));
        };
        let generated: GeneratedReport = serde_json::from_value(value)
            .map_err(|e| JobError::MalformedReply(e.to_string()))?;

        tracing::info!("Generated holistic report for {}", user_email);
        Ok(HolisticReport {
            generated,
            generated_date: Utc::now(),
            data_summary,
            correlations,
        })
    }
}
