//! Suggestion scenarios, evaluated in a fixed order. The first scenario that
//! produces a draft wins; later scenarios are never consulted.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use prosper_core::{
    Bookmark, JournalEntry, PrayerJournal, ProactiveSuggestion, ReadingPlanProgress,
    SpiritualGoal, SpiritualThemeInsight, Stored, SuggestionType,
};

/// Recent records for one user, most recent first.
#[derive(Debug, Clone, Default)]
pub struct UserSnapshot {
    /// Up to 5 journal entries.
    pub journals: Vec<Stored<JournalEntry>>,
    /// Up to 10 prayers.
    pub prayers: Vec<Stored<PrayerJournal>>,
    pub reading: Option<Stored<ReadingPlanProgress>>,
    /// Up to 10 bookmarks.
    pub bookmarks: Vec<Stored<Bookmark>>,
    pub active_goal: Option<Stored<SpiritualGoal>>,
    pub themes: Vec<Stored<SpiritualThemeInsight>>,
}

/// Number of recent prayers whose text feeds the keyword scan.
pub const PRAYER_TEXT_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionDraft {
    pub suggestion_type: SuggestionType,
    pub title: String,
    pub message: String,
    pub suggested_prompt: String,
    pub priority: u8,
    pub reasoning: String,
}

impl SuggestionDraft {
    pub fn into_suggestion(self, user_email: &str, expires_at: DateTime<Utc>) -> ProactiveSuggestion {
        ProactiveSuggestion {
            user_email: user_email.to_string(),
            suggestion_type: self.suggestion_type,
            title: self.title,
            message: self.message,
            suggested_prompt: self.suggested_prompt,
            priority: self.priority.clamp(1, 10),
            read: false,
            expires_at,
            reasoning: self.reasoning,
        }
    }
}

pub trait Scenario: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, snapshot: &UserSnapshot, now: DateTime<Utc>) -> Option<SuggestionDraft>;
}

/// The production cascade, in priority order.
pub fn default_cascade() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(JournalThemeScenario),
        Box::new(ReadingProgressScenario),
        Box::new(StaleBookmarkScenario),
        Box::new(GoalCheckinScenario),
        Box::new(AnsweredPrayerScenario),
        Box::new(RecurringThemeScenario),
        Box::new(WeekdayFallbackScenario),
    ]
}

/// Run `cascade` in order and return the first draft with its scenario name.
pub fn first_match(
    cascade: &[Box<dyn Scenario>],
    snapshot: &UserSnapshot,
    now: DateTime<Utc>,
) -> Option<(&'static str, SuggestionDraft)> {
    cascade
        .iter()
        .find_map(|s| s.evaluate(snapshot, now).map(|d| (s.name(), d)))
}

fn age_in_days(created: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created).num_days()
}

// ============================================================================
// 1. Journal / prayer keyword themes
// ============================================================================

struct VerseGroup {
    keywords: &'static [&'static str],
    theme: &'static str,
    reference: &'static str,
    verse: &'static str,
}

const VERSE_GROUPS: &[VerseGroup] = &[
    VerseGroup {
        keywords: &["anxious", "worry", "fear"],
        theme: "anxiety",
        reference: "Philippians 4:6-7",
        verse: "Do not be anxious about anything, but in every situation, by prayer and petition, with thanksgiving, present your requests to God. And the peace of God, which transcends all understanding, will guard your hearts and your minds in Christ Jesus.",
    },
    VerseGroup {
        keywords: &["strength", "weak", "tired"],
        theme: "weariness",
        reference: "Isaiah 40:31",
        verse: "But those who hope in the Lord will renew their strength. They will soar on wings like eagles; they will run and not grow weary, they will walk and not be faint.",
    },
    VerseGroup {
        keywords: &["lonely", "alone", "isolated"],
        theme: "loneliness",
        reference: "Deuteronomy 31:8",
        verse: "The Lord himself goes before you and will be with you; he will never leave you nor forsake you. Do not be afraid; do not be discouraged.",
    },
    VerseGroup {
        keywords: &["joy", "grateful", "thankful"],
        theme: "gratitude",
        reference: "Psalm 118:24",
        verse: "The Lord has done it this very day; let us rejoice today and be glad.",
    },
    VerseGroup {
        keywords: &["guidance", "decision", "wisdom"],
        theme: "guidance",
        reference: "Proverbs 3:5-6",
        verse: "Trust in the Lord with all your heart and lean not on your own understanding; in all your ways submit to him, and he will make your paths straight.",
    },
    VerseGroup {
        keywords: &["forgive", "guilt", "shame"],
        theme: "forgiveness",
        reference: "1 John 1:9",
        verse: "If we confess our sins, he is faithful and just and will forgive us our sins and purify us from all unrighteousness.",
    },
];

pub struct JournalThemeScenario;

impl Scenario for JournalThemeScenario {
    fn name(&self) -> &'static str {
        "journal_theme"
    }

    fn evaluate(&self, snapshot: &UserSnapshot, _now: DateTime<Utc>) -> Option<SuggestionDraft> {
        let prayers = &snapshot.prayers[..snapshot.prayers.len().min(PRAYER_TEXT_WINDOW)];
        if snapshot.journals.len() < 2 && prayers.len() < 2 {
            return None;
        }

        let text = snapshot
            .journals
            .iter()
            .map(|j| format!("{} {}", j.title, j.content))
            .chain(prayers.iter().map(|p| format!("{} {}", p.title, p.content)))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let group = VERSE_GROUPS
            .iter()
            .find(|g| g.keywords.iter().any(|k| text.contains(k)))?;

        Some(SuggestionDraft {
            suggestion_type: SuggestionType::VerseRecommendation,
            title: format!("A verse for what you're carrying: {}", group.reference),
            message: format!("\"{}\" ({})", group.verse, group.reference),
            suggested_prompt: format!(
                "Help me reflect on {} and what it means for the {} I've been writing about.",
                group.reference, group.theme
            ),
            priority: 9,
            reasoning: format!(
                "Recent journal and prayer entries mention {} (keywords: {})",
                group.theme,
                group.keywords.join(", ")
            ),
        })
    }
}

// ============================================================================
// 2. Reading-plan progress
// ============================================================================

pub struct ReadingProgressScenario;

impl Scenario for ReadingProgressScenario {
    fn name(&self) -> &'static str {
        "reading_progress"
    }

    fn evaluate(&self, snapshot: &UserSnapshot, _now: DateTime<Utc>) -> Option<SuggestionDraft> {
        let progress = snapshot.reading.as_ref()?;
        if progress.total_days == 0 {
            return None;
        }
        let pct = f64::from(progress.completed_days) / f64::from(progress.total_days) * 100.0;

        if (75.0..100.0).contains(&pct) {
            Some(SuggestionDraft {
                suggestion_type: SuggestionType::ReadingEncouragement,
                title: "You're almost there!".to_string(),
                message: format!(
                    "You've finished {:.0}% of {}. Just {} days to go.",
                    pct,
                    progress.plan_name,
                    progress.total_days - progress.completed_days
                ),
                suggested_prompt: format!(
                    "What have been the biggest takeaways from {} so far?",
                    progress.plan_name
                ),
                priority: 8,
                reasoning: format!("Reading plan at {:.0}% complete", pct),
            })
        } else if pct < 30.0 && progress.completed_days >= 3 {
            Some(SuggestionDraft {
                suggestion_type: SuggestionType::ReadingEncouragement,
                title: "Keep the momentum going".to_string(),
                message: format!(
                    "{} days into {}. A steady pace builds a lasting habit.",
                    progress.completed_days, progress.plan_name
                ),
                suggested_prompt: format!(
                    "Give me a short reflection to carry into today's reading in {}.",
                    progress.plan_name
                ),
                priority: 7,
                reasoning: format!(
                    "Early in reading plan ({} of {} days)",
                    progress.completed_days, progress.total_days
                ),
            })
        } else {
            None
        }
    }
}

// ============================================================================
// 3. Stale bookmark
// ============================================================================

/// Uses the oldest bookmark within the sampled window, not the user's oldest
/// bookmark overall.
pub struct StaleBookmarkScenario;

impl Scenario for StaleBookmarkScenario {
    fn name(&self) -> &'static str {
        "stale_bookmark"
    }

    fn evaluate(&self, snapshot: &UserSnapshot, now: DateTime<Utc>) -> Option<SuggestionDraft> {
        let bookmark = snapshot.bookmarks.last()?;
        let age = age_in_days(bookmark.created_date, now);
        if !(14..=60).contains(&age) {
            return None;
        }
        Some(SuggestionDraft {
            suggestion_type: SuggestionType::BookmarkRevisit,
            title: format!("Revisit {}", bookmark.reference),
            message: format!(
                "You saved {} {} days ago. It might speak differently today.",
                bookmark.reference, age
            ),
            suggested_prompt: format!(
                "Why might {} have stood out to me, and how does it apply now?",
                bookmark.reference
            ),
            priority: 7,
            reasoning: format!("Bookmark saved {} days ago", age),
        })
    }
}

// ============================================================================
// 4. Goal check-in
// ============================================================================

pub struct GoalCheckinScenario;

impl Scenario for GoalCheckinScenario {
    fn name(&self) -> &'static str {
        "goal_checkin"
    }

    fn evaluate(&self, snapshot: &UserSnapshot, now: DateTime<Utc>) -> Option<SuggestionDraft> {
        let goal = snapshot.active_goal.as_ref()?;
        let age = age_in_days(goal.created_date, now);
        if !(7..=30).contains(&age) {
            return None;
        }
        Some(SuggestionDraft {
            suggestion_type: SuggestionType::GoalCheckin,
            title: "How's your goal going?".to_string(),
            message: format!(
                "You set \"{}\" {} days ago. Let's check in on your progress.",
                goal.title, age
            ),
            suggested_prompt: format!(
                "Help me think through my progress on \"{}\" and a next step.",
                goal.title
            ),
            priority: 7,
            reasoning: format!("Active goal created {} days ago", age),
        })
    }
}

// ============================================================================
// 5. Answered prayer
// ============================================================================

pub struct AnsweredPrayerScenario;

impl Scenario for AnsweredPrayerScenario {
    fn name(&self) -> &'static str {
        "answered_prayer"
    }

    fn evaluate(&self, snapshot: &UserSnapshot, _now: DateTime<Utc>) -> Option<SuggestionDraft> {
        let prayer = snapshot.prayers.iter().find(|p| p.answered)?;
        Some(SuggestionDraft {
            suggestion_type: SuggestionType::AnsweredPrayer,
            title: "Celebrate an answered prayer 🙌".to_string(),
            message: format!(
                "You marked \"{}\" as answered. Take a moment to give thanks.",
                prayer.title
            ),
            suggested_prompt: format!(
                "Help me write a prayer of thanksgiving for how God answered \"{}\".",
                prayer.title
            ),
            priority: 9,
            reasoning: "A recent prayer was marked answered".to_string(),
        })
    }
}

// ============================================================================
// 6. Recurring theme
// ============================================================================

pub struct RecurringThemeScenario;

impl Scenario for RecurringThemeScenario {
    fn name(&self) -> &'static str {
        "recurring_theme"
    }

    fn evaluate(&self, snapshot: &UserSnapshot, _now: DateTime<Utc>) -> Option<SuggestionDraft> {
        if snapshot.themes.len() < 2 {
            return None;
        }
        // Insights arrive ranked; the first is the most prominent.
        let top = snapshot.themes.first()?;
        Some(SuggestionDraft {
            suggestion_type: SuggestionType::RecurringTheme,
            title: format!("A theme in your journey: {}", top.theme),
            message: if top.description.is_empty() {
                format!("\"{}\" keeps coming up in your reflections.", top.theme)
            } else {
                top.description.clone()
            },
            suggested_prompt: format!(
                "What might God be saying to me through the theme of {}?",
                top.theme
            ),
            priority: 8,
            reasoning: format!(
                "Theme \"{}\" is the most prominent of {} recurring insights",
                top.theme,
                snapshot.themes.len()
            ),
        })
    }
}

// ============================================================================
// Fallback: day of week
// ============================================================================

pub struct WeekdayFallbackScenario;

impl Scenario for WeekdayFallbackScenario {
    fn name(&self) -> &'static str {
        "weekday_fallback"
    }

    fn evaluate(&self, _snapshot: &UserSnapshot, now: DateTime<Utc>) -> Option<SuggestionDraft> {
        match now.weekday() {
            Weekday::Sun => Some(SuggestionDraft {
                suggestion_type: SuggestionType::SabbathReflection,
                title: "A Sabbath pause".to_string(),
                message: "Today is a day to rest and remember. Take a few quiet minutes with God."
                    .to_string(),
                suggested_prompt: "Guide me through a short Sabbath reflection on this past week."
                    .to_string(),
                priority: 6,
                reasoning: "Sunday Sabbath reflection".to_string(),
            }),
            Weekday::Mon => Some(SuggestionDraft {
                suggestion_type: SuggestionType::WeeklyIntention,
                title: "Start your week with intention".to_string(),
                message: "A new week is a fresh page. What do you want to invite God into?"
                    .to_string(),
                suggested_prompt: "Help me set one spiritual intention for this week.".to_string(),
                priority: 5,
                reasoning: "Monday week starter".to_string(),
            }),
            _ => None,
        }
    }
}

/// Expiry for a suggestion created at `now`.
pub fn expiry_from(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now + Duration::days(days)
}
