//! Keyword classifiers
//!
//! Every function here is total and side-effect free: any string (including
//! an empty one) maps to a label, falling back to neutral/default categories.
//! The tables are ordered slices and the order is precedence: the first label
//! with a matching keyword wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::memory::MemoryEntry;

// ============ Emotion ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Confused,
    Excited,
    Tired,
    Worried,
    Abusive,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Confused => "confused",
            Emotion::Excited => "excited",
            Emotion::Tired => "tired",
            Emotion::Worried => "worried",
            Emotion::Abusive => "abusive",
            Emotion::Neutral => "neutral",
        }
    }
}

/// "excited" also appears under happy, so happy wins for it.
const EMOTION_KEYWORDS: &[(Emotion, &[&str])] = &[
    (
        Emotion::Happy,
        &["happy", "excited", "great", "awesome", "amazing", "wonderful", "fantastic", "love", "😊", "😄", "😍", "🥰"],
    ),
    (
        Emotion::Sad,
        &["sad", "depressed", "upset", "crying", "hurt", "broken", "lonely", "😢", "😭", "😔"],
    ),
    (
        Emotion::Angry,
        &["angry", "mad", "furious", "annoyed", "frustrated", "😠", "😡", "🤬"],
    ),
    (
        Emotion::Confused,
        &["confused", "lost", "don't understand", "unclear", "🤔", "😕"],
    ),
    (
        Emotion::Excited,
        &["excited", "pumped", "thrilled", "hyped", "can't wait", "🎉", "🔥"],
    ),
    (
        Emotion::Tired,
        &["tired", "exhausted", "sleepy", "drained", "😴", "🥱"],
    ),
    (
        Emotion::Worried,
        &["worried", "anxious", "nervous", "scared", "afraid", "😰", "😟"],
    ),
    (
        Emotion::Abusive,
        &[
            "chutiya", "madarchod", "bhenchod", "gaandu", "fuck", "shit", "bitch", "asshole", "dick",
            "pussy", "cunt", "retard", "idiot", "stupid", "dumb", "moron",
        ],
    ),
];

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

pub fn detect_emotional_context(text: &str) -> Emotion {
    let lower = text.to_lowercase();
    EMOTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(emotion, _)| *emotion)
        .unwrap_or(Emotion::Neutral)
}

// ============ Abuse ============

pub const ABUSIVE_WORDS: &[&str] = &[
    "chutiya", "madarchod", "bhenchod", "gaandu", "fuck you", "fucking", "shit", "bitch", "asshole",
    "dickhead", "pussy", "cunt", "retard", "idiot", "stupid", "dumb", "moron", "cuck",
    "simp", "virgin", "loser", "pathetic", "whore", "slut", "hoe", "thot", "incel",
    "neckbeard", "beta", "soyboy", "cuckold",
];

pub const INAPPROPRIATE_TOPICS: &[&str] = &[
    "rape", "molest", "pedo", "child", "underage", "kill yourself", "kys", "suicide",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbuseReport {
    pub is_abusive: bool,
    pub matched_words: BTreeSet<&'static str>,
    pub matched_topics: BTreeSet<&'static str>,
}

pub fn detect_abusive_language(text: &str) -> AbuseReport {
    let lower = text.to_lowercase();
    let matched_words: BTreeSet<&'static str> = ABUSIVE_WORDS
        .iter()
        .copied()
        .filter(|w| lower.contains(w))
        .collect();
    let matched_topics: BTreeSet<&'static str> = INAPPROPRIATE_TOPICS
        .iter()
        .copied()
        .filter(|t| lower.contains(t))
        .collect();

    AbuseReport {
        is_abusive: !matched_words.is_empty() || !matched_topics.is_empty(),
        matched_words,
        matched_topics,
    }
}

// ============ Topics ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Crush,
    HotWheels,
    Anime,
    FamilyGuy,
    Food,
    Games,
    School,
    Weather,
    Music,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Crush => "crush",
            Topic::HotWheels => "hotwheels",
            Topic::Anime => "anime",
            Topic::FamilyGuy => "familyguy",
            Topic::Food => "food",
            Topic::Games => "games",
            Topic::School => "school",
            Topic::Weather => "weather",
            Topic::Music => "music",
        }
    }
}

pub type TopicSet = BTreeSet<Topic>;

const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::Crush, &["crush", "love", "girlfriend", "boyfriend", "girl"]),
    (Topic::HotWheels, &["hot wheels", "hotwheels", "cars", "toy car", "collection"]),
    (Topic::Anime, &["anime", "manga", "otaku", "naruto", "dragon ball", "one piece"]),
    (Topic::FamilyGuy, &["family guy", "peter griffin", "chris griffin", "stewie", "lois"]),
    (Topic::Food, &["food", "pizza", "burger", "eat", "hungry", "cooking"]),
    (Topic::Games, &["game", "gaming", "play", "video game", "console"]),
    (Topic::School, &["school", "college", "study", "exam", "homework", "class"]),
    (Topic::Weather, &["weather", "rain", "sunny", "cold", "hot", "temperature"]),
    (Topic::Music, &["music", "song", "sing", "concert", "band", "artist"]),
];

/// Topics the persona treats as shared interests
const SHARED_INTEREST_TOPICS: &[Topic] = &[Topic::Crush, Topic::HotWheels, Topic::Anime, Topic::FamilyGuy];

pub fn detect_conversation_topics(context: &[MemoryEntry]) -> TopicSet {
    let all_text = context
        .iter()
        .map(|e| format!("{} {}", e.message, e.response))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| contains_any(&all_text, keywords))
        .map(|(topic, _)| *topic)
        .collect()
}

// ============ Conversation State ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Greeting,
    CasualChat,
    DeepDiscussion,
    EmotionalSupport,
    SharingInterests,
    QuestionAnswer,
    RandomTalk,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Greeting => "greeting",
            ConversationState::CasualChat => "casual_chat",
            ConversationState::DeepDiscussion => "deep_discussion",
            ConversationState::EmotionalSupport => "emotional_support",
            ConversationState::SharingInterests => "sharing_interests",
            ConversationState::QuestionAnswer => "question_answer",
            ConversationState::RandomTalk => "random_talk",
        }
    }
}

pub const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "namaste", "hey"];
const QUESTION_MARKERS: &[&str] = &["?", "what", "how", "why", "when", "where"];
const DEEP_MARKERS: &[&str] = &["think", "believe", "opinion", "feel"];

/// Ordered decision chain; earlier rules preempt later ones.
pub fn determine_conversation_state(
    text: &str,
    context: &[MemoryEntry],
    emotion: Emotion,
) -> ConversationState {
    let lower = text.to_lowercase();

    if contains_any(&lower, GREETING_KEYWORDS) {
        return ConversationState::Greeting;
    }

    if matches!(
        emotion,
        Emotion::Sad | Emotion::Angry | Emotion::Worried | Emotion::Confused
    ) {
        return ConversationState::EmotionalSupport;
    }

    if contains_any(&lower, QUESTION_MARKERS) {
        return ConversationState::QuestionAnswer;
    }

    let topics = detect_conversation_topics(context);
    if SHARED_INTEREST_TOPICS.iter().any(|t| topics.contains(t)) {
        return ConversationState::SharingInterests;
    }

    if contains_any(&lower, DEEP_MARKERS) || context.len() > 3 {
        return ConversationState::DeepDiscussion;
    }

    ConversationState::CasualChat
}

// ============ Personality Trait ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalityTrait {
    Confusion,
    Support,
    Enthusiasm,
    Empathy,
    Curiosity,
}

impl PersonalityTrait {
    /// Key into the persona's `personalityTraits` map
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityTrait::Confusion => "confusion",
            PersonalityTrait::Support => "support",
            PersonalityTrait::Enthusiasm => "enthusiasm",
            PersonalityTrait::Empathy => "empathy",
            PersonalityTrait::Curiosity => "curiosity",
        }
    }
}

pub fn detect_personality_trait(
    text: &str,
    emotion: Emotion,
    _context: &[MemoryEntry],
) -> Option<PersonalityTrait> {
    let lower = text.to_lowercase();

    if contains_any(&lower, &["confused", "don't understand", "unclear", "lost"]) {
        return Some(PersonalityTrait::Confusion);
    }
    if contains_any(&lower, &["help", "struggling", "difficult", "hard"]) {
        return Some(PersonalityTrait::Support);
    }
    if contains_any(&lower, &["excited", "amazing", "awesome", "great"]) {
        return Some(PersonalityTrait::Enthusiasm);
    }
    if matches!(emotion, Emotion::Sad | Emotion::Worried)
        || contains_any(&lower, &["feel", "emotion", "upset"])
    {
        return Some(PersonalityTrait::Empathy);
    }
    if contains_any(&lower, &["tell me", "explain", "more", "interesting"]) {
        return Some(PersonalityTrait::Curiosity);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(message: &str, response: &str) -> MemoryEntry {
        MemoryEntry {
            message: message.to_string(),
            response: response.to_string(),
            is_bot: true,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_emotion_first_table_entry_wins() {
        assert_eq!(detect_emotional_context("I'm so HAPPY today"), Emotion::Happy);
        // "excited" is listed under happy before excited
        assert_eq!(detect_emotional_context("so excited"), Emotion::Happy);
        assert_eq!(detect_emotional_context("feeling hyped"), Emotion::Excited);
        assert_eq!(detect_emotional_context("I feel lonely 😢"), Emotion::Sad);
        assert_eq!(detect_emotional_context("🤔"), Emotion::Confused);
        assert_eq!(detect_emotional_context("so sleepy"), Emotion::Tired);
        assert_eq!(detect_emotional_context("I'm nervous"), Emotion::Worried);
        assert_eq!(detect_emotional_context("you moron"), Emotion::Abusive);
    }

    #[test]
    fn test_emotion_defaults_to_neutral() {
        assert_eq!(detect_emotional_context(""), Emotion::Neutral);
        assert_eq!(detect_emotional_context("the bus is late"), Emotion::Neutral);
    }

    #[test]
    fn test_abuse_detects_configured_word() {
        let report = detect_abusive_language("tu chutiya hai");
        assert!(report.is_abusive);
        assert!(report.matched_words.contains("chutiya"));
        assert!(report.matched_topics.is_empty());
    }

    #[test]
    fn test_abuse_detects_topics_case_insensitively() {
        let report = detect_abusive_language("just KYS already");
        assert!(report.is_abusive);
        assert!(report.matched_topics.contains("kys"));
    }

    #[test]
    fn test_abuse_is_monotonic_over_every_configured_entry() {
        for word in ABUSIVE_WORDS.iter().chain(INAPPROPRIATE_TOPICS) {
            let text = format!("well {} then", word);
            assert!(detect_abusive_language(&text).is_abusive, "missed {}", word);
        }
    }

    #[test]
    fn test_clean_text_is_not_abusive() {
        let report = detect_abusive_language("want to watch anime tonight?");
        assert_eq!(report, AbuseReport::default());
        assert!(!detect_abusive_language("").is_abusive);
    }

    #[test]
    fn test_identity_words_are_not_abuse() {
        assert!(!detect_abusive_language("homophobia is never okay").is_abusive);
        assert!(!detect_abusive_language("my cousin is trans and gay").is_abusive);
        assert!(!ABUSIVE_WORDS.contains(&"homo"));
        assert_eq!(detect_emotional_context("he's gay and proud"), Emotion::Neutral);
    }

    #[test]
    fn test_topics_from_messages_and_responses() {
        let context = vec![
            entry("watched naruto yesterday", "nice"),
            entry("ok", "I'm so hungry for pizza"),
        ];
        let topics = detect_conversation_topics(&context);
        assert!(topics.contains(&Topic::Anime));
        assert!(topics.contains(&Topic::Food));
        assert!(!topics.contains(&Topic::Music));
        assert!(detect_conversation_topics(&[]).is_empty());
    }

    #[test]
    fn test_hello_without_context_is_greeting() {
        let emotion = detect_emotional_context("hello");
        assert_eq!(emotion, Emotion::Neutral);
        assert_eq!(
            determine_conversation_state("hello", &[], emotion),
            ConversationState::Greeting
        );
    }

    #[test]
    fn test_state_precedence() {
        // Greeting beats emotion
        assert_eq!(
            determine_conversation_state("hey I'm sad", &[], Emotion::Sad),
            ConversationState::Greeting
        );
        // Emotion beats question
        assert_eq!(
            determine_conversation_state("why am I so upset", &[], Emotion::Sad),
            ConversationState::EmotionalSupport
        );
        assert_eq!(
            determine_conversation_state("what's for dinner", &[], Emotion::Neutral),
            ConversationState::QuestionAnswer
        );
        assert_eq!(
            determine_conversation_state("ok", &[entry("love anime", "same")], Emotion::Neutral),
            ConversationState::SharingInterests
        );
        assert_eq!(
            determine_conversation_state("I believe so", &[], Emotion::Neutral),
            ConversationState::DeepDiscussion
        );
        assert_eq!(
            determine_conversation_state("ok", &[], Emotion::Neutral),
            ConversationState::CasualChat
        );
    }

    #[test]
    fn test_long_context_is_deep_discussion() {
        let context: Vec<MemoryEntry> = (0..4).map(|_| entry("ok", "sure")).collect();
        assert_eq!(
            determine_conversation_state("ok", &context, Emotion::Neutral),
            ConversationState::DeepDiscussion
        );
    }

    #[test]
    fn test_personality_trait_order() {
        assert_eq!(
            detect_personality_trait("I'm lost, help", Emotion::Neutral, &[]),
            Some(PersonalityTrait::Confusion)
        );
        assert_eq!(
            detect_personality_trait("this is hard", Emotion::Neutral, &[]),
            Some(PersonalityTrait::Support)
        );
        assert_eq!(
            detect_personality_trait("awesome news", Emotion::Happy, &[]),
            Some(PersonalityTrait::Enthusiasm)
        );
        assert_eq!(
            detect_personality_trait("meh", Emotion::Worried, &[]),
            Some(PersonalityTrait::Empathy)
        );
        assert_eq!(
            detect_personality_trait("tell me a story", Emotion::Neutral, &[]),
            Some(PersonalityTrait::Curiosity)
        );
        assert_eq!(detect_personality_trait("ok", Emotion::Neutral, &[]), None);
    }
}
