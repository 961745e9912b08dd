use async_trait::async_trait;
use buddybot_lib::backend::CleanBackend;
use buddybot_lib::classifier::ConversationState;
use buddybot_lib::config::{load_personality_profile, BotIdentity};
use buddybot_lib::dice::ScriptedDice;
use buddybot_lib::error::BackendError;
use buddybot_lib::orchestrator::Orchestrator;
use buddybot_lib::{Attachment, ChatBot, InboundMessage};
use std::path::Path;
use std::sync::Arc;

struct CannedClean(&'static str);

#[async_trait]
impl CleanBackend for CannedClean {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn clean_complete(&self, _system: &str, user_message: &str) -> Result<String, BackendError> {
        assert!(user_message.starts_with("Ravi "));
        Ok(self.0.to_string())
    }
}

fn sample_identity() -> BotIdentity {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("friends_data");
    load_personality_profile(&dir).expect("sample persona loads")
}

fn bot(dice: ScriptedDice, clean: Option<CannedClean>) -> ChatBot {
    let identity = sample_identity();
    let mut orchestrator = Orchestrator::new(Arc::new(identity.personality), Box::new(dice));
    if let Some(clean) = clean {
        orchestrator = orchestrator.with_clean_backend(Box::new(clean));
    }
    ChatBot::new(&identity.bot_name, orchestrator)
}

fn from_ravi(text: &str) -> InboundMessage {
    InboundMessage {
        text: text.to_string(),
        author_id: "ravi-0001".to_string(),
        author_name: "Ravi".to_string(),
        ..Default::default()
    }
}

#[test]
fn sample_persona_loads() {
    let identity = sample_identity();
    assert_eq!(identity.bot_name, "Bunty");
    assert!(!identity.personality.catchphrases.is_empty());
    assert!(!identity.personality.photo_bank().is_empty());
}

#[tokio::test]
async fn greeting_without_backends_uses_catchphrase() {
    let bot = bot(ScriptedDice::new(), None);

    let reply = bot.handle_message(&from_ravi("hello bunty")).await.unwrap();

    assert!(reply.contains("That's a big dawg mate!"));
    assert_eq!(
        bot.orchestrator().sessions().state("ravi-0001"),
        Some(ConversationState::Greeting)
    );
}

#[tokio::test]
async fn conversation_with_clean_backend_then_insult() {
    // Roll 1: question gate on the first turn (misses). Roll 2: aggression gate (fires).
    let dice = ScriptedDice::new().with_rolls(&[0.999, 0.5]);
    let bot = bot(dice, Some(CannedClean("Hey Ravi, kya haal hai?")));

    let first = bot.handle_message(&from_ravi("yo Bunty")).await.unwrap();
    assert_eq!(first, "Hey Ravi, kya haal hai? 😅");

    let second = bot.handle_message(&from_ravi("Bunty you idiot")).await.unwrap();
    assert_eq!(second, "Arey bhai, talk properly or don't talk at all! 😅");

    let history = bot.orchestrator().sessions().history("ravi-0001");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].response, "Hey Ravi, kya haal hai?");
    assert_eq!(history[1].message, "Bunty you idiot");
}

#[tokio::test]
async fn photo_of_a_pug_gets_a_photo_reaction() {
    let bot = bot(ScriptedDice::new(), None);
    let message = InboundMessage {
        attachments: vec![Attachment {
            content_type: Some("image/jpeg".to_string()),
            url: "https://cdn.example.com/pug.jpg".to_string(),
        }],
        ..from_ravi("meet my pug")
    };

    let reply = bot.handle_message(&message).await.unwrap();

    assert_eq!(reply, "Awww what a cutie! My heart just melted yaar 😍");
    assert!(bot.orchestrator().sessions().history("ravi-0001").is_empty());
}

#[tokio::test]
async fn memory_stays_bounded_over_a_long_chat() {
    let bot = bot(ScriptedDice::new(), None);

    for i in 0..15 {
        let message = InboundMessage {
            mentions_bot: true,
            ..from_ravi(&format!("message number {}", i))
        };
        assert!(bot.handle_message(&message).await.is_some());
    }

    let sessions = bot.orchestrator().sessions();
    let history = sessions.history("ravi-0001");
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].message, "message number 5");
    assert_eq!(sessions.context("ravi-0001").len(), 5);
}

#[tokio::test]
async fn other_bots_are_ignored() {
    let bot = bot(ScriptedDice::new().with_rolls(&[0.0]), None);
    let message = InboundMessage {
        author_is_bot: true,
        mentions_bot: true,
        ..from_ravi("hey Bunty")
    };
    assert!(bot.handle_message(&message).await.is_none());
}
