use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::classifier::Emotion;

/// Response bank keys with special meaning inside `responses`
pub const AGGRESSIVE_BANK: &str = "aggressive";
pub const HOW_ARE_YOU_BANK: &str = "howAreYou";
pub const WHAT_ARE_YOU_DOING_BANK: &str = "whatAreYouDoing";
pub const PHOTO_BANK: &str = "photo";
const PHOTO_BANK_ALIAS: &str = "pugPhoto";

/// An ordered interest group: when any keyword matches, the template engine
/// draws from `responses[bank]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub bank: String,
    pub keywords: Vec<String>,
}

impl KeywordGroup {
    fn new(bank: &str, keywords: &[&str]) -> Self {
        Self {
            bank: bank.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Priority order matters: the first matching group wins.
pub fn default_keyword_groups() -> Vec<KeywordGroup> {
    vec![
        KeywordGroup::new("crush", &["crush", "girl", "love"]),
        KeywordGroup::new("hotWheels", &["hot wheels", "hotwheels", "cars", "toy car"]),
        KeywordGroup::new("anime", &["anime", "manga", "otaku"]),
        KeywordGroup::new(
            "familyGuy",
            &["family guy", "peter griffin", "chris griffin", "stewie", "lois"],
        ),
    ]
}

/// The persona document. Loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub catchphrases: Vec<String>,
    #[serde(default)]
    pub personality_traits: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub responses: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub random_thoughts: Vec<String>,
    #[serde(default = "default_keyword_groups")]
    pub keyword_groups: Vec<KeywordGroup>,
    #[serde(default)]
    pub empathetic_responses: HashMap<String, Vec<String>>,
}

impl PersonalityProfile {
    /// A minimal profile with only a name
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            system_prompt: String::new(),
            interests: Vec::new(),
            catchphrases: Vec::new(),
            personality_traits: HashMap::new(),
            responses: HashMap::new(),
            random_thoughts: Vec::new(),
            keyword_groups: default_keyword_groups(),
            empathetic_responses: HashMap::new(),
        }
    }

    /// A response bank by key, empty when missing
    pub fn bank(&self, key: &str) -> &[String] {
        self.responses.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn photo_bank(&self) -> &[String] {
        let bank = self.bank(PHOTO_BANK);
        if bank.is_empty() {
            self.bank(PHOTO_BANK_ALIAS)
        } else {
            bank
        }
    }

    pub fn trait_bank(&self, personality_trait: &str) -> &[String] {
        self.personality_traits
            .get(personality_trait)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Persona-supplied empathetic lines for an emotion, if any
    pub fn empathy_override(&self, emotion: Emotion) -> &[String] {
        self.empathetic_responses
            .get(emotion.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Text card describing the persona (the `/personality` command).
    /// `bot_description` is shown when the persona has no description of its own.
    pub fn summary_card(&self, bot_name: &str, bot_description: Option<&str>) -> String {
        let mut lines = vec![
            format!("{}'s Personality", self.name),
            format!("Here's what makes {}... {}!", self.name, self.name),
            String::new(),
            "Interests:".to_string(),
        ];
        lines.extend(self.interests.iter().map(|i| format!("  - {}", i)));
        lines.push("Catchphrases:".to_string());
        lines.extend(self.catchphrases.iter().take(3).map(|c| format!("  - {}", c)));
        lines.push(format!(
            "Description: {}",
            self.description
                .as_deref()
                .or(bot_description)
                .unwrap_or("A friendly chat bot")
        ));
        lines.push("How to Chat: Just mention me or reply to my messages!".to_string());
        lines.push(format!("-- {}", bot_name));
        lines.join("\n")
    }
}
