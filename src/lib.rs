pub mod anthropic;
pub mod backend;
pub mod classifier;
pub mod config;
pub mod dice;
pub mod error;
pub mod logging;
pub mod memory;
pub mod ollama;
pub mod openai;
pub mod orchestrator;
pub mod persona;
pub mod templates;

use anthropic::AnthropicClient;
use backend::{CleanBackend, RudeBackend};
use chrono::Utc;
use config::{BotConfig, BotIdentity, CleanProvider};
use dice::{pick, RandomSource, SeededDice};
use templates::draw_line;
use error::BackendError;
use ollama::OllamaClient;
use openai::OpenAIClient;
use orchestrator::Orchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use orchestrator::{GateOdds, Reply, ResponseSource};

// ============ Inbound Messages ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachment {
    pub content_type: Option<String>,
    pub url: String,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|t| t.starts_with("image/"))
            .unwrap_or(false)
    }
}

/// A message as delivered by the chat transport
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub author_is_bot: bool,
    pub is_reply_to_bot: bool,
    pub mentions_bot: bool,
    pub attachments: Vec<Attachment>,
}

// ============ Engagement ============

const RANDOM_ENGAGE_ODDS: f64 = 0.05;
const PHOTO_REACTION_ODDS: f64 = 0.3;
const PHOTO_KEYWORDS: &[&str] = &["pug", "dog", "puppy", "cute", "animal"];

const REPLY_EMOJIS: &[&str] = &["😅", "🤔", "😏", "🚗", "💭", "🔥", "💙", "🎉", "😊", "🤗"];
const PHOTO_EMOJIS: &[&str] = &["😍", "💕", "✨", "👑", "💖", "🥰", "😘", "💋"];

/// Why the bot decided to answer a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Mentioned,
    NameInText,
    ReplyToBot,
    PhotoReaction,
    Random,
}

impl Engagement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engagement::Mentioned => "mentioned",
            Engagement::NameInText => "name_in_text",
            Engagement::ReplyToBot => "reply_to_bot",
            Engagement::PhotoReaction => "photo_reaction",
            Engagement::Random => "random",
        }
    }
}

// ============ Chat Bot ============

pub struct ChatBot {
    bot_name: String,
    bot_description: Option<String>,
    orchestrator: Orchestrator,
}

impl ChatBot {
    pub fn new(bot_name: &str, orchestrator: Orchestrator) -> Self {
        Self {
            bot_name: bot_name.to_string(),
            bot_description: None,
            orchestrator,
        }
    }

    /// Description shown on the card when the persona has none
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.bot_description = description;
        self
    }

    /// Wire up backends and randomness from the environment configuration
    pub fn from_config(identity: BotIdentity, config: &BotConfig) -> Result<Self, BackendError> {
        let dice: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededDice::seeded(seed)),
            None => Box::new(SeededDice::from_entropy()),
        };

        let mut orchestrator = Orchestrator::new(Arc::new(identity.personality), dice);

        if let Some(clean) = build_clean_backend(config)? {
            logging::log_conversation(None, &format!("Clean backend: {}", clean.name()));
            orchestrator = orchestrator.with_clean_backend(clean);
        }
        if let Some(rude) = build_rude_backend(config)? {
            logging::log_conversation(None, &format!("Rude backend: {}", rude.name()));
            orchestrator = orchestrator.with_rude_backend(rude);
        }
        if !orchestrator.has_generative_backend() {
            logging::log_conversation(None, "No generative backend configured - template replies only");
        }

        Ok(Self::new(&identity.bot_name, orchestrator)
            .with_description(identity.bot_description))
    }

    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// The `/personality` card
    pub fn personality_card(&self) -> String {
        self.orchestrator
            .persona()
            .summary_card(&self.bot_name, self.bot_description.as_deref())
    }

    /// Whether and why to answer; `None` means stay quiet
    pub fn engagement(&self, message: &InboundMessage) -> Option<Engagement> {
        if message.author_is_bot {
            return None;
        }

        let persona = self.orchestrator.persona();
        let lower = message.text.to_lowercase();
        let name = persona.name.to_lowercase();

        if self.is_photo_reaction(message, &lower, &name) {
            return Some(Engagement::PhotoReaction);
        }
        if message.mentions_bot {
            return Some(Engagement::Mentioned);
        }
        if !name.is_empty() && lower.contains(&name) {
            return Some(Engagement::NameInText);
        }
        if message.is_reply_to_bot {
            return Some(Engagement::ReplyToBot);
        }
        if self.orchestrator.with_dice(|dice| dice.chance(RANDOM_ENGAGE_ODDS)) {
            return Some(Engagement::Random);
        }
        None
    }

    fn is_photo_reaction(&self, message: &InboundMessage, lower: &str, name: &str) -> bool {
        let has_image = message.attachments.first().map(Attachment::is_image).unwrap_or(false);
        let has_lines = self
            .orchestrator
            .persona()
            .photo_bank()
            .iter()
            .any(|line| !line.trim().is_empty());
        if !has_image || !has_lines {
            return false;
        }

        PHOTO_KEYWORDS.iter().any(|k| lower.contains(k))
            || (!name.is_empty() && lower.contains(name))
            || self.orchestrator.with_dice(|dice| dice.chance(PHOTO_REACTION_ODDS))
    }

    /// Produce the outbound reply for a message, or `None` to stay quiet
    pub async fn handle_message(&self, message: &InboundMessage) -> Option<String> {
        let engagement = self.engagement(message)?;
        let user_id = message.author_id.as_str();

        logging::log_conversation(
            Some(user_id),
            &format!("Responding to {} ({})", message.author_name, engagement.as_str()),
        );

        if engagement == Engagement::PhotoReaction {
            let persona = self.orchestrator.persona();
            let (line, emoji) = self.orchestrator.with_dice(|dice| {
                let line = draw_line(dice, persona.photo_bank()).unwrap_or_default();
                let emoji = pick(dice, PHOTO_EMOJIS).copied().unwrap_or("✨");
                (line, emoji)
            });
            logging::log_routing(Some(user_id), "Photo reaction");
            return Some(format!("{} {}", line, emoji));
        }

        let reply = self
            .orchestrator
            .respond(user_id, &message.author_name, &message.text, message.is_reply_to_bot)
            .await;

        logging::log_routing(Some(user_id), &format!("Reply source: {}", reply.source.as_str()));

        self.orchestrator
            .sessions()
            .remember(user_id, &message.text, &reply.text, true, Utc::now());

        let emoji = self
            .orchestrator
            .with_dice(|dice| pick(dice, REPLY_EMOJIS).copied().unwrap_or("😊"));
        Some(format!("{} {}", reply.text, emoji))
    }
}

fn build_clean_backend(config: &BotConfig) -> Result<Option<Box<dyn CleanBackend>>, BackendError> {
    let backend: Option<Box<dyn CleanBackend>> = match config.clean_provider {
        CleanProvider::OpenAI => match config.openai_api_key.as_deref() {
            Some(key) => Some(Box::new(OpenAIClient::new(key, &config.openai_model)?)),
            None => None,
        },
        CleanProvider::Anthropic => match config.anthropic_api_key.as_deref() {
            Some(key) => Some(Box::new(AnthropicClient::new(key, &config.anthropic_model)?)),
            None => None,
        },
    };

    if backend.is_none() {
        logging::log_conversation(
            None,
            &format!("{} selected but no API key set", config.clean_provider.as_str()),
        );
    }
    Ok(backend)
}

fn build_rude_backend(config: &BotConfig) -> Result<Option<Box<dyn RudeBackend>>, BackendError> {
    if !config.ollama_enabled {
        return Ok(None);
    }
    Ok(Some(Box::new(OllamaClient::new(
        &config.ollama_host,
        &config.ollama_model,
    )?)))
}

// ============ Console Runner ============

const CONSOLE_USER_ID: &str = "console-user";

/// Load configuration and chat over stdin/stdout until EOF or `/quit`
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    logging::init_logging();

    let config = BotConfig::from_env()?;
    let identity = config::load_personality_profile(&config.data_dir)?;
    let bot = ChatBot::from_config(identity, &config)?;

    logging::log_conversation(None, &format!("{} is ready!", bot.bot_name()));
    println!("{} is ready! Type /personality for the card, /quit to leave.", bot.bot_name());

    let username = std::env::var("USER").unwrap_or_else(|_| "friend".to_string());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        match text {
            "" => continue,
            "/quit" => break,
            "/personality" => {
                println!("{}", bot.personality_card());
                continue;
            }
            _ => {}
        }

        let message = InboundMessage {
            text: text.to_string(),
            author_id: CONSOLE_USER_ID.to_string(),
            author_name: username.clone(),
            mentions_bot: true,
            ..Default::default()
        };

        if let Some(reply) = bot.handle_message(&message).await {
            println!("{}: {}", bot.bot_name(), reply);
        }
    }

    logging::log_conversation(None, "Console session ended");
    Ok(())
}
