//! Template response engine
//!
//! Uniform random draws from persona-supplied and built-in banks. Every tier
//! degrades to the next when its bank is empty; the last tier is a built-in,
//! non-empty bank, so the engine always produces a reply.

use crate::classifier::{
    detect_abusive_language, detect_conversation_topics, detect_emotional_context,
    detect_personality_trait, AbuseReport, ConversationState, Emotion, Topic, TopicSet,
};
use crate::dice::{pick, RandomSource};
use crate::memory::MemoryEntry;
use crate::orchestrator::GateOdds;
use crate::persona::{
    PersonalityProfile, AGGRESSIVE_BANK, HOW_ARE_YOU_BANK, WHAT_ARE_YOU_DOING_BANK,
};

/// Uniform draw over the non-blank entries of a bank; `None` when none are left
pub fn draw_line<S: AsRef<str>>(dice: &mut dyn RandomSource, bank: &[S]) -> Option<String> {
    let usable: Vec<&str> = bank
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect();
    pick(dice, &usable).map(|s| s.to_string())
}

fn contains_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

// ============ Built-in banks ============

const GREETING_TEMPLATES: &[&str] = &[
    "{catchphrase} What's up?",
    "Arey yaar {catchphrase} Kaise ho?",
    "Bhai {catchphrase} Kya haal hai?",
    "Hey! {catchphrase} How's it going?",
    "Namaste! {catchphrase} Sab theek?",
];

const HOW_ARE_YOU_TEMPLATES: &[&str] = &[
    "I'm good bro! Just thinking about {interest}",
    "Yaar main toh bilkul theek hu! Bas {interest} ke baare mein sochta rehta hu",
    "I'm doing great! Spent the whole day on {interest}",
    "Arey yaar main toh mast hu! {interest} is keeping me busy",
];

const WHAT_ARE_YOU_DOING_TEMPLATES: &[&str] = &[
    "Just vibing and thinking about {interest}",
    "Bhai main toh bas {interest} ke saath time pass kar raha hu",
    "I'm just chilling bro! Reading up on {interest}",
    "Arey yaar kuch nahi, bas {interest}",
];

const POSITIVE_BANK: &[&str] = &[
    "Thanks bro! That's a big dawg mate!",
    "Arey yaar thanks! Kya baat hai",
    "Bhai thanks! I try my best",
    "Yaar thanks! You're pretty cool too",
    "Thanks! You're awesome!",
];

const NEGATIVE_BANK: &[&str] = &[
    "Arey yaar don't be sad! Everything will be okay bro",
    "Bhai don't worry! I'm here for you",
    "Yaar cheer up! Want to talk about something fun?",
    "Don't be sad bro! You got this!",
    "Arey yaar everything will be fine!",
];

const AGGRESSIVE_BANK_DEFAULT: &[&str] = &[
    "Arey bhai, tameez se baat kar!",
    "Whoa, talk to me like that again and see what happens.",
    "Bro, who hurt you? Take that attitude somewhere else.",
    "Wow, real mature. Try again when you've grown up.",
    "Bhai apna mooh sambhal ke! Not cool.",
    "Is that the best you've got? Pathetic comeback, yaar.",
    "Keep talking like that and I'm muting you, bro.",
    "Arey yaar, go touch some grass and come back with manners.",
];

/// Insults worth throwing back at the sender
const THROWBACK_WORDS: &[&str] = &["idiot", "stupid", "dumb", "moron", "loser", "pathetic"];

fn builtin_empathy(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Happy => &[
            "That's awesome bro! I'm so happy for you! 😄",
            "Yaar that's amazing! You deserve to be happy! 🎉",
            "Bhai that's fantastic! That's a big dawg mate! 🔥",
            "Arey yaar that's wonderful! I'm excited for you! 😍",
        ],
        Emotion::Sad => &[
            "Arey yaar don't be sad! Everything will be okay bro 😊",
            "Bhai I'm here for you! Want to talk about it? 🤗",
            "Yaar cheer up! Maybe we can watch something funny together? 😅",
            "Don't worry bro! I care about you! 💙",
        ],
        Emotion::Angry => &[
            "Arey yaar calm down bro! Take a deep breath 😌",
            "Bhai don't let it get to you! Want to talk about it? 🤔",
            "Yaar that's frustrating! Maybe we can figure this out together? 💭",
            "Bro I understand you're upset! Want to vent about it? 😤",
        ],
        Emotion::Confused => &[
            "Arey yaar don't worry! I get confused too sometimes 😅",
            "Bhai it's okay to be confused! Want me to help explain? 🤔",
            "Yaar confusion is normal! Maybe we can figure it out together? 💭",
            "Bro I'm confused about a lot of things too! 😄",
        ],
        Emotion::Excited => &[
            "Yaar I'm excited too! That's awesome! 🔥",
            "Bhai that's so cool! I can feel your excitement! 🎉",
            "Arey yaar that's amazing! I'm hyped for you! 😍",
            "Bro that's fantastic! That's a big dawg mate! 🚀",
        ],
        Emotion::Tired => &[
            "Arey yaar you should rest! Take care of yourself bro 😴",
            "Bhai get some sleep! You deserve it! 💤",
            "Yaar rest well! Maybe watch some anime to relax? 😌",
            "Bro take it easy! Don't overwork yourself! 🤗",
        ],
        Emotion::Worried => &[
            "Arey yaar don't worry! Everything will be fine bro 😊",
            "Bhai I'm here for you! Want to talk about what's bothering you? 🤗",
            "Yaar it's okay to be worried! Maybe we can figure it out together? 💭",
            "Bro don't stress! I believe in you! 💙",
        ],
        Emotion::Abusive | Emotion::Neutral => &[],
    }
}

fn builtin_state_bank(state: ConversationState) -> &'static [&'static str] {
    match state {
        ConversationState::Greeting => &[
            "Hey bro! That's a big dawg mate! How's it going?",
            "Arey yaar namaste! Kaise ho?",
            "Bhai hello! What's up?",
            "Namaste! Kya haal hai?",
        ],
        ConversationState::EmotionalSupport => &[
            "Arey yaar I'm here for you bro! Want to talk about it?",
            "Bhai don't worry! Everything will be okay!",
            "Yaar cheer up! Maybe we can watch some anime together?",
        ],
        ConversationState::QuestionAnswer => &[
            "That's a good question bro! Let me think...",
            "Arey yaar good question! That's a big dawg mate!",
            "Yaar that's something to think about! What do you think?",
        ],
        ConversationState::SharingInterests => &[
            "Yaar that's awesome! I love talking about this stuff!",
            "Arey yaar that's amazing! That's a big dawg mate!",
            "Yaar that's crazy! I'm so excited to talk about this!",
        ],
        ConversationState::DeepDiscussion => &[
            "Arey yaar that's deep bro! I never thought about it that way!",
            "Bro that's profound! Maybe we should discuss this more?",
            "Arey yaar that's deep! I'm learning so much from you!",
        ],
        ConversationState::CasualChat => &[
            "That's cool bro! Tell me more!",
            "Arey yaar that's interesting! What else?",
            "Bhai that's awesome! I want to know more!",
            "Bro that's fantastic! Keep going!",
        ],
        ConversationState::RandomTalk => &[
            "Arey yaar that's random! I love it!",
            "Yaar that's crazy random! I'm here for it!",
            "Bro that's wild! Tell me more random stuff!",
        ],
    }
}

fn topic_questions(topic: Topic) -> &'static [&'static str] {
    match topic {
        Topic::Crush => &[
            "Do you think your crush would like this?",
            "Should I tell my crush about this?",
            "What do you think they're doing right now?",
            "Should I buy them something nice?",
        ],
        Topic::HotWheels => &[
            "Do you collect Hot Wheels too?",
            "What's your favorite Hot Wheels car?",
            "Do you think Hot Wheels are the best toys ever?",
            "Want to see my newest Hot Wheels car?",
        ],
        Topic::Anime => &[
            "What's your favorite anime?",
            "Have you seen the latest episodes?",
            "Which anime character is your favorite?",
            "Any anime you'd recommend?",
        ],
        Topic::Food => &[
            "Are you hungry too?",
            "What's your favorite food?",
            "Do you like pizza?",
            "Want to grab some food together?",
        ],
        Topic::School => &[
            "How's school going for you?",
            "Do you have any exams coming up?",
            "What's your favorite subject?",
            "Are you stressed about school?",
        ],
        _ => &[],
    }
}

const GENERIC_QUESTIONS: &[&str] = &[
    "What do you think about that?",
    "Have you experienced something similar?",
    "What would you do in that situation?",
    "Do you have any advice?",
    "What's your opinion on this?",
    "Have you ever thought about this?",
];

fn topic_transitions(topic: Topic) -> &'static [&'static str] {
    match topic {
        Topic::Crush => &[
            "Speaking of which, do you think your crush would like this?",
            "Yaar this makes me think of love stuff!",
        ],
        Topic::HotWheels => &[
            "That reminds me of my Hot Wheels collection!",
            "Speaking of cool stuff, have you seen my Hot Wheels cars?",
            "Bhai that's as cool as my Hot Wheels collection!",
        ],
        Topic::Anime => &[
            "That's like something from anime!",
            "Speaking of awesome stuff, have you watched any anime lately?",
            "Bhai that's anime-level awesome!",
        ],
        Topic::FamilyGuy => &[
            "That's like something Peter Griffin would say!",
            "Speaking of funny stuff, have you watched Family Guy?",
            "Yaar that's Family Guy level funny!",
        ],
        _ => &[],
    }
}

// ============ Bank selection ============

/// Empathetic lines for an emotion; persona lines replace the built-in ones.
/// Empty for neutral and abusive.
pub fn empathetic_bank(profile: &PersonalityProfile, emotion: Emotion) -> Vec<String> {
    let custom = profile.empathy_override(emotion);
    if !custom.is_empty() && !matches!(emotion, Emotion::Neutral | Emotion::Abusive) {
        return custom.to_vec();
    }
    builtin_empathy(emotion).iter().map(|s| s.to_string()).collect()
}

/// Follow-up questions for the detected topics; generic ones only when no
/// topic has its own questions.
pub fn question_bank(topics: &TopicSet) -> Vec<&'static str> {
    let questions: Vec<&'static str> = topics
        .iter()
        .flat_map(|t| topic_questions(*t).iter().copied())
        .collect();

    if questions.is_empty() {
        GENERIC_QUESTIONS.to_vec()
    } else {
        questions
    }
}

/// A transition phrase for the first topic present in `current` but not in
/// `previous`, if that topic has phrases.
pub fn topic_transition(
    previous: &TopicSet,
    current: &TopicSet,
    dice: &mut dyn RandomSource,
) -> Option<String> {
    let new_topic = current.iter().find(|t| !previous.contains(*t))?;
    draw_line(dice, topic_transitions(*new_topic))
}

/// The confrontational reply used in aggressive mode
pub fn aggressive_response(
    profile: &PersonalityProfile,
    abuse: &AbuseReport,
    dice: &mut dyn RandomSource,
) -> String {
    let custom = profile.bank(AGGRESSIVE_BANK);
    let mut bank: Vec<String> = if custom.is_empty() {
        AGGRESSIVE_BANK_DEFAULT.iter().map(|s| s.to_string()).collect()
    } else {
        custom.to_vec()
    };

    for word in abuse
        .matched_words
        .iter()
        .filter(|w| THROWBACK_WORDS.contains(*w))
    {
        bank.push(format!("\"{}\"? Bhai, look in the mirror first!", word));
    }

    draw_line(dice, &bank).unwrap_or_else(|| AGGRESSIVE_BANK_DEFAULT[0].to_string())
}

/// A line from the persona's bank for a personality trait
pub fn personality_response(
    profile: &PersonalityProfile,
    personality_trait: &str,
    dice: &mut dyn RandomSource,
) -> Option<String> {
    draw_line(dice, profile.trait_bank(personality_trait))
}

pub fn state_response(state: ConversationState, dice: &mut dyn RandomSource) -> String {
    draw_line(dice, builtin_state_bank(state)).unwrap_or_else(|| "That's cool bro! Tell me more!".to_string())
}

fn fill_interest(
    template_bank: &[&str],
    profile: &PersonalityProfile,
    dice: &mut dyn RandomSource,
) -> Option<String> {
    let template = draw_line(dice, template_bank)?;
    let interest = draw_line(dice, &profile.interests).unwrap_or_else(|| "life".to_string());
    Some(template.replace("{interest}", &interest))
}

/// Keyword-driven template reply
pub fn fallback_response(
    profile: &PersonalityProfile,
    text: &str,
    dice: &mut dyn RandomSource,
) -> String {
    let lower = text.to_lowercase();

    for group in &profile.keyword_groups {
        let matched = group
            .keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()));
        if matched {
            if let Some(line) = draw_line(dice, profile.bank(&group.bank)) {
                return line;
            }
        }
    }

    if contains_any(&lower, &["hello", "hi", "namaste", "kaise ho"]) {
        let catchphrase = draw_line(dice, &profile.catchphrases)
            .unwrap_or_else(|| "That's a big dawg mate!".to_string());
        if let Some(template) = draw_line(dice, GREETING_TEMPLATES) {
            return template.replace("{catchphrase}", &catchphrase);
        }
    }

    if contains_any(&lower, &["how are you", "kaise ho", "kya haal"]) {
        if let Some(line) = draw_line(dice, profile.bank(HOW_ARE_YOU_BANK))
            .or_else(|| fill_interest(HOW_ARE_YOU_TEMPLATES, profile, dice))
        {
            return line;
        }
    }

    if contains_any(&lower, &["what are you doing", "kya kar raha", "kya ho raha"]) {
        if let Some(line) = draw_line(dice, profile.bank(WHAT_ARE_YOU_DOING_BANK))
            .or_else(|| fill_interest(WHAT_ARE_YOU_DOING_TEMPLATES, profile, dice))
        {
            return line;
        }
    }

    if contains_any(&lower, &["good", "nice", "cool"]) {
        if let Some(line) = draw_line(dice, POSITIVE_BANK) {
            return line;
        }
    }

    if contains_any(&lower, &["bad", "sad", "upset"]) {
        if let Some(line) = draw_line(dice, NEGATIVE_BANK) {
            return line;
        }
    }

    if !profile.random_thoughts.is_empty() && dice.chance(0.3) {
        if let Some(thought) = draw_line(dice, &profile.random_thoughts) {
            return thought;
        }
    }

    draw_line(dice, &profile.catchphrases)
        .unwrap_or_else(|| state_response(ConversationState::CasualChat, dice))
}

/// The full deterministic path used when no generative backend answers
pub fn intelligent_fallback(
    profile: &PersonalityProfile,
    text: &str,
    context: &[MemoryEntry],
    odds: &GateOdds,
    dice: &mut dyn RandomSource,
) -> String {
    let topics = detect_conversation_topics(context);
    let emotion = detect_emotional_context(text);

    let abuse = detect_abusive_language(text);
    if abuse.is_abusive && dice.chance(odds.aggression) {
        return aggressive_response(profile, &abuse, dice);
    }

    let empathy = empathetic_bank(profile, emotion);
    if !empathy.is_empty() && dice.chance(odds.empathy) {
        if let Some(line) = draw_line(dice, &empathy) {
            return line;
        }
    }

    if let Some(personality_trait) = detect_personality_trait(text, emotion, context) {
        if dice.chance(odds.personality_trait) {
            if let Some(line) = personality_response(profile, personality_trait.as_str(), dice) {
                return line;
            }
        }
    }

    let questions = question_bank(&topics);
    if !questions.is_empty() && dice.chance(odds.question) {
        let base = fallback_response(profile, text, dice);
        if let Some(question) = draw_line(dice, &questions) {
            return format!("{} {}", base, question);
        }
        return base;
    }

    fallback_response(profile, text, dice)
}
