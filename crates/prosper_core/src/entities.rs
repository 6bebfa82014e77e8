//! Domain records shared by the engagement, suggestion and report jobs.
//!
//! Every record lives in the external entity store. The jobs only read the
//! upstream records (journals, prayers, workouts, ...) and only ever write
//! notifications, suggestions and guard-date stamps on trackers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

// ============================================================================
// Entity kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    EngagementTracker,
    Notification,
    ProactiveSuggestion,
    PrayerJournal,
    JournalEntry,
    ReadingPlanProgress,
    Bookmark,
    SpiritualGoal,
    MealLog,
    WorkoutSession,
    MeditationSession,
    ChatbotMemory,
    SpiritualThemeInsight,
    EmotionalPattern,
    UserProgress,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::EngagementTracker => "EngagementTracker",
            EntityKind::Notification => "Notification",
            EntityKind::ProactiveSuggestion => "ProactiveSuggestion",
            EntityKind::PrayerJournal => "PrayerJournal",
            EntityKind::JournalEntry => "JournalEntry",
            EntityKind::ReadingPlanProgress => "ReadingPlanProgress",
            EntityKind::Bookmark => "Bookmark",
            EntityKind::SpiritualGoal => "SpiritualGoal",
            EntityKind::MealLog => "MealLog",
            EntityKind::WorkoutSession => "WorkoutSession",
            EntityKind::MeditationSession => "MeditationSession",
            EntityKind::ChatbotMemory => "ChatbotMemory",
            EntityKind::SpiritualThemeInsight => "SpiritualThemeInsight",
            EntityKind::EmotionalPattern => "EmotionalPattern",
            EntityKind::UserProgress => "UserProgress",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record type that can be read from and written to the entity store.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;
}

/// A record as returned by the store: metadata plus the entity fields,
/// flattened into one JSON object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub id: String,
    pub created_date: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Deref for Stored<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

macro_rules! entity {
    ($ty:ty => $kind:ident) => {
        impl Entity for $ty {
            const KIND: EntityKind = EntityKind::$kind;
        }
    };
}

// ============================================================================
// Users and engagement state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default = "default_true")]
    pub personalized_notifications: bool,
    /// Bearer token the gateway resolves to this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Low,
    #[default]
    Normal,
    High,
}

/// Per-user engagement state. The three `last_*_notification` dates are
/// guard stamps: at most one notification of that kind per calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementTracker {
    pub user_email: String,
    pub last_active_date: Option<DateTime<Utc>>,
    pub engagement_level: EngagementLevel,
    pub current_streak: u32,
    pub streak_broken_date: Option<NaiveDate>,
    pub emotional_tone_history: Vec<String>,
    pub spiritual_theme_history: Vec<String>,
    pub deep_study_count: u32,
    pub last_low_engagement_notification: Option<NaiveDate>,
    pub last_high_engagement_notification: Option<NaiveDate>,
    pub last_streak_notification: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub user_email: String,
    pub title: String,
    pub message: String,
    pub reflection_question: String,
    pub category: String,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    VerseRecommendation,
    ReadingEncouragement,
    BookmarkRevisit,
    GoalCheckin,
    AnsweredPrayer,
    RecurringTheme,
    SabbathReflection,
    WeeklyIntention,
}

impl SuggestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::VerseRecommendation => "verse_recommendation",
            SuggestionType::ReadingEncouragement => "reading_encouragement",
            SuggestionType::BookmarkRevisit => "bookmark_revisit",
            SuggestionType::GoalCheckin => "goal_checkin",
            SuggestionType::AnsweredPrayer => "answered_prayer",
            SuggestionType::RecurringTheme => "recurring_theme",
            SuggestionType::SabbathReflection => "sabbath_reflection",
            SuggestionType::WeeklyIntention => "weekly_intention",
        }
    }
}

impl fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveSuggestion {
    pub user_email: String,
    pub suggestion_type: SuggestionType,
    pub title: String,
    pub message: String,
    pub suggested_prompt: String,
    /// 1-10, higher is more salient.
    pub priority: u8,
    #[serde(default)]
    pub read: bool,
    pub expires_at: DateTime<Utc>,
    /// Which heuristic fired.
    pub reasoning: String,
}

// ============================================================================
// Correlations (embedded in reports, never stored on their own)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationType {
    WorkoutMood,
    SpiritualJournaling,
    NutritionFitness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    #[serde(rename = "type")]
    pub correlation_type: CorrelationType,
    pub description: String,
    pub frequency: u32,
    pub confidence: Confidence,
}

// ============================================================================
// Upstream records (read-only for these jobs)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerJournal {
    pub created_by: String,
    pub title: String,
    pub content: String,
    pub answered: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalEntry {
    pub created_by: String,
    pub title: String,
    pub content: String,
    pub mood: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingPlanProgress {
    pub created_by: String,
    pub plan_name: String,
    pub completed_days: u32,
    pub total_days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bookmark {
    pub created_by: String,
    pub reference: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiritualGoal {
    pub created_by: String,
    pub title: String,
    pub status: GoalStatus,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealLog {
    pub created_by: String,
    pub meal_type: String,
    pub calories: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutSession {
    pub created_by: String,
    pub workout_type: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeditationSession {
    pub created_by: String,
    pub meditation_type: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatbotMemory {
    pub created_by: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiritualThemeInsight {
    pub created_by: String,
    pub theme: String,
    pub description: String,
    pub occurrences: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalPattern {
    pub created_by: String,
    pub emotion: String,
    pub intensity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub created_by: String,
    pub current_streak: u32,
    pub total_points: u32,
    pub level: u32,
}

entity!(User => User);
entity!(EngagementTracker => EngagementTracker);
entity!(Notification => Notification);
entity!(ProactiveSuggestion => ProactiveSuggestion);
entity!(PrayerJournal => PrayerJournal);
entity!(JournalEntry => JournalEntry);
entity!(ReadingPlanProgress => ReadingPlanProgress);
entity!(Bookmark => Bookmark);
entity!(SpiritualGoal => SpiritualGoal);
entity!(MealLog => MealLog);
entity!(WorkoutSession => WorkoutSession);
entity!(MeditationSession => MeditationSession);
entity!(ChatbotMemory => ChatbotMemory);
entity!(SpiritualThemeInsight => SpiritualThemeInsight);
entity!(EmotionalPattern => EmotionalPattern);
entity!(UserProgress => UserProgress);
