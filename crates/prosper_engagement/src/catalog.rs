//! Fixed notification catalog, keyed by bucket.
//!
//! Each bucket has one title, one category tag and a small pool of
//! message/question pairs. Selection within a pool is uniform.

use prosper_core::Notification;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTemplate {
    pub message: &'static str,
    pub question: &'static str,
}

const fn tpl(message: &'static str, question: &'static str) -> MessageTemplate {
    MessageTemplate { message, question }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Lapse24h,
    Lapse48h,
    Lapse72h,
    HighEngagement,
    ToneDiscouraged,
    ToneAnxious,
    ToneHopeful,
    ThemePurpose,
    ThemeIdentity,
    ThemeTrust,
    StreakMaintained,
    StreakBroken,
    DeepStudy,
}

impl Bucket {
    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Lapse24h => "lapse_24h",
            Bucket::Lapse48h => "lapse_48h",
            Bucket::Lapse72h => "lapse_72h",
            Bucket::HighEngagement => "high_engagement",
            Bucket::ToneDiscouraged => "tone_discouraged",
            Bucket::ToneAnxious => "tone_anxious",
            Bucket::ToneHopeful => "tone_hopeful",
            Bucket::ThemePurpose => "theme_purpose",
            Bucket::ThemeIdentity => "theme_identity",
            Bucket::ThemeTrust => "theme_trust",
            Bucket::StreakMaintained => "streak_maintained",
            Bucket::StreakBroken => "streak_broken",
            Bucket::DeepStudy => "deep_study",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Bucket::Lapse24h => "We saved your seat 🙏",
            Bucket::Lapse48h => "Gideon is thinking of you 💭",
            Bucket::Lapse72h => "Come home, friend ❤️",
            Bucket::HighEngagement => "Your faithfulness is showing 🌱",
            Bucket::ToneDiscouraged => "A word for the weary",
            Bucket::ToneAnxious => "Peace for today",
            Bucket::ToneHopeful => "Hold on to that hope ✨",
            Bucket::ThemePurpose => "Made on purpose",
            Bucket::ThemeIdentity => "Who you really are",
            Bucket::ThemeTrust => "Learning to trust",
            Bucket::StreakMaintained => "Streak on fire 🔥",
            Bucket::StreakBroken => "Grace for a fresh start",
            Bucket::DeepStudy => "Digging deep 📖",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Bucket::Lapse24h | Bucket::Lapse48h | Bucket::Lapse72h => "re_engagement",
            Bucket::HighEngagement => "high_engagement",
            Bucket::ToneDiscouraged | Bucket::ToneAnxious | Bucket::ToneHopeful => {
                "emotional_support"
            }
            Bucket::ThemePurpose | Bucket::ThemeIdentity | Bucket::ThemeTrust => "spiritual_theme",
            Bucket::StreakMaintained | Bucket::StreakBroken => "streak",
            Bucket::DeepStudy => "deep_study",
        }
    }

    pub fn templates(&self) -> &'static [MessageTemplate] {
        match self {
            Bucket::Lapse24h => LAPSE_24H,
            Bucket::Lapse48h => LAPSE_48H,
            Bucket::Lapse72h => LAPSE_72H,
            Bucket::HighEngagement => HIGH_ENGAGEMENT,
            Bucket::ToneDiscouraged => TONE_DISCOURAGED,
            Bucket::ToneAnxious => TONE_ANXIOUS,
            Bucket::ToneHopeful => TONE_HOPEFUL,
            Bucket::ThemePurpose => THEME_PURPOSE,
            Bucket::ThemeIdentity => THEME_IDENTITY,
            Bucket::ThemeTrust => THEME_TRUST,
            Bucket::StreakMaintained => STREAK_MAINTAINED,
            Bucket::StreakBroken => STREAK_BROKEN,
            Bucket::DeepStudy => DEEP_STUDY,
        }
    }

    /// Tone bucket for the most recent emotional tone label.
    pub fn for_tone(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "discouraged" => Some(Bucket::ToneDiscouraged),
            "anxious" => Some(Bucket::ToneAnxious),
            "hopeful" => Some(Bucket::ToneHopeful),
            _ => None,
        }
    }

    /// Theme bucket for the most recent spiritual theme label.
    pub fn for_theme(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "purpose" => Some(Bucket::ThemePurpose),
            "identity" => Some(Bucket::ThemeIdentity),
            "trust" => Some(Bucket::ThemeTrust),
            _ => None,
        }
    }

    /// Draw one template uniformly at random and address it to `user_email`.
    pub fn compose<R: Rng + ?Sized>(&self, user_email: &str, rng: &mut R) -> Notification {
        let pool = self.templates();
        // Pools are never empty.
        let picked = pool.choose(rng).copied().unwrap_or(pool[0]);
        Notification {
            user_email: user_email.to_string(),
            title: self.title().to_string(),
            message: picked.message.to_string(),
            reflection_question: picked.question.to_string(),
            category: self.category().to_string(),
            read: false,
        }
    }
}

const LAPSE_24H: &[MessageTemplate] = &[
    tpl(
        "A day away is nothing to worry about. Your reading plan is right where you left it.",
        "What is one thing you want to bring before God today?",
    ),
    tpl(
        "Even five quiet minutes can reset a whole day. Come sit for a moment.",
        "Where did you notice God's kindness yesterday?",
    ),
    tpl(
        "Your journal misses your voice. Jot down one line about today.",
        "What is weighing on your heart right now?",
    ),
];

const LAPSE_48H: &[MessageTemplate] = &[
    tpl(
        "It's been a couple of days. No guilt here, just an open door whenever you're ready.",
        "What has been filling your days lately?",
    ),
    tpl(
        "I've been holding onto a verse for you. Stop by when you have a minute.",
        "Is there a prayer you'd like to pick back up?",
    ),
];

const LAPSE_72H: &[MessageTemplate] = &[
    tpl(
        "Seasons get busy. His mercies are new every morning, and so is your next step.",
        "What would help you find a rhythm again this week?",
    ),
    tpl(
        "Three days can feel long. Come back to a short reading and a quiet moment.",
        "What do you need most from God right now?",
    ),
    tpl(
        "Your community and your prayers are still here. Let's start small together.",
        "Who could you pray for today?",
    ),
];

const HIGH_ENGAGEMENT: &[MessageTemplate] = &[
    tpl(
        "You've shown up again and again this week. That consistency is bearing fruit.",
        "What has God been teaching you through this season?",
    ),
    tpl(
        "Your devotion is inspiring. Consider sharing a reflection with the community.",
        "Who might be encouraged by what you've learned?",
    ),
];

const TONE_DISCOURAGED: &[MessageTemplate] = &[
    tpl(
        "\"He gives strength to the weary and increases the power of the weak.\" Isaiah 40:29",
        "What is one small thing that still brings you hope?",
    ),
    tpl(
        "Discouragement is not the end of the story. You are not walking this alone.",
        "What would you say to a friend who felt the way you do?",
    ),
];

const TONE_ANXIOUS: &[MessageTemplate] = &[
    tpl(
        "\"Cast all your anxiety on Him because He cares for you.\" 1 Peter 5:7",
        "Which worry could you hand over in prayer right now?",
    ),
    tpl(
        "Breathe in slowly. The God who holds tomorrow is with you today.",
        "What is within your control today, and what isn't?",
    ),
];

const TONE_HOPEFUL: &[MessageTemplate] = &[
    tpl(
        "That hope you're feeling is worth writing down. Let it anchor you.",
        "What are you hoping God will do next?",
    ),
    tpl(
        "\"May the God of hope fill you with all joy and peace.\" Romans 15:13",
        "How can you carry this hope into someone else's day?",
    ),
];

const THEME_PURPOSE: &[MessageTemplate] = &[
    tpl(
        "\"For we are God's handiwork, created to do good works.\" Ephesians 2:10",
        "Where do your gifts and the world's needs meet?",
    ),
    tpl(
        "Purpose often shows up in ordinary faithfulness. Look at today's small tasks again.",
        "What ordinary work could you offer to God today?",
    ),
];

const THEME_IDENTITY: &[MessageTemplate] = &[
    tpl(
        "You are chosen, loved and known. That doesn't change with a bad day.",
        "Which label do you need to lay down?",
    ),
    tpl(
        "\"See what great love the Father has lavished on us, that we should be called children of God.\" 1 John 3:1",
        "What does being called His child change for you today?",
    ),
];

const THEME_TRUST: &[MessageTemplate] = &[
    tpl(
        "\"Trust in the Lord with all your heart.\" Proverbs 3:5",
        "Where is it hardest for you to trust right now?",
    ),
    tpl(
        "Trust grows one surrender at a time. Start with one.",
        "What is one thing you can release today?",
    ),
];

const STREAK_MAINTAINED: &[MessageTemplate] = &[
    tpl(
        "Seven days and counting! Your daily rhythm is becoming a habit of the heart.",
        "What has this streak taught you about showing up?",
    ),
    tpl(
        "Another day on your streak. Small steps, faithfully taken, go a long way.",
        "How has this daily time changed your week?",
    ),
];

const STREAK_BROKEN: &[MessageTemplate] = &[
    tpl(
        "Your streak reset, but grace didn't. Today is a good day to begin again.",
        "What got in the way, and how can we plan around it?",
    ),
    tpl(
        "Missing a day doesn't erase the growth. Pick up right where you are.",
        "What would make tomorrow's time with God easier?",
    ),
];

const DEEP_STUDY: &[MessageTemplate] = &[
    tpl(
        "You've been studying deeply lately. Consider a cross-reference or word study next.",
        "Which passage has stayed with you the longest this week?",
    ),
    tpl(
        "Your hunger for the Word is beautiful. Try writing a short summary of what you've learned.",
        "What question would you love to explore further?",
    ),
];
