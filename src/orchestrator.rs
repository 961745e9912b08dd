use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::{clean_rude_output, CleanBackend, RudeBackend, RudeOptions};
use crate::classifier::{
    detect_abusive_language, detect_conversation_topics, detect_emotional_context,
    determine_conversation_state, ConversationState, Emotion, TopicSet,
};
use crate::dice::{pick, RandomSource};
use crate::logging;
use crate::memory::{MemoryEntry, SessionManager};
use crate::persona::PersonalityProfile;
use crate::templates::{
    aggressive_response, draw_line, empathetic_bank, intelligent_fallback, question_bank,
    topic_transition,
};

// ============ Gate Odds ============

/// Probability of each randomized gate firing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateOdds {
    pub aggression: f64,
    pub empathy: f64,
    pub personality_trait: f64,
    pub question: f64,
    pub transition: f64,
}

impl Default for GateOdds {
    fn default() -> Self {
        Self {
            aggression: 0.8,
            empathy: 0.4,
            personality_trait: 0.3,
            question: 0.3,
            transition: 0.2,
        }
    }
}

// ============ Replies ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseSource {
    Aggressive,
    Rude,
    Clean,
    Fallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Aggressive => "aggressive",
            ResponseSource::Rude => "rude",
            ResponseSource::Clean => "clean",
            ResponseSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ResponseSource,
}

impl Reply {
    fn new(text: String, source: ResponseSource) -> Self {
        Self { text, source }
    }
}

/// Everything classified about one inbound message
struct TurnAnalysis {
    context: Vec<MemoryEntry>,
    topics: TopicSet,
    emotion: Emotion,
    state: ConversationState,
}

/// Gate outcomes for a generative turn. Banks are empty unless their gate fired.
struct TurnGates {
    empathy: Vec<String>,
    questions: Vec<&'static str>,
}

// ============ Orchestrator ============

pub struct Orchestrator {
    persona: Arc<PersonalityProfile>,
    sessions: Arc<SessionManager>,
    clean: Option<Box<dyn CleanBackend>>,
    rude: Option<Box<dyn RudeBackend>>,
    rude_options: RudeOptions,
    odds: GateOdds,
    dice: Mutex<Box<dyn RandomSource>>,
}

impl Orchestrator {
    pub fn new(persona: Arc<PersonalityProfile>, dice: Box<dyn RandomSource>) -> Self {
        Self {
            persona,
            sessions: Arc::new(SessionManager::new()),
            clean: None,
            rude: None,
            rude_options: RudeOptions::default(),
            odds: GateOdds::default(),
            dice: Mutex::new(dice),
        }
    }

    pub fn with_clean_backend(mut self, backend: Box<dyn CleanBackend>) -> Self {
        self.clean = Some(backend);
        self
    }

    pub fn with_rude_backend(mut self, backend: Box<dyn RudeBackend>) -> Self {
        self.rude = Some(backend);
        self
    }

    pub fn with_odds(mut self, odds: GateOdds) -> Self {
        self.odds = odds;
        self
    }

    pub fn persona(&self) -> &PersonalityProfile {
        &self.persona
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn has_generative_backend(&self) -> bool {
        self.clean.is_some() || self.rude.is_some()
    }

    /// Run `f` with the random source; the lock is released before returning
    pub fn with_dice<T>(&self, f: impl FnOnce(&mut dyn RandomSource) -> T) -> T {
        let mut dice = self.dice.lock();
        f(&mut **dice)
    }

    pub async fn respond(&self, user_id: &str, username: &str, text: &str, is_reply: bool) -> Reply {
        self.respond_at(user_id, username, text, is_reply, Utc::now()).await
    }

    /// Decide and produce the reply for one message, as of `now`.
    ///
    /// Never fails: backend errors fall through to the next attempt and the
    /// last attempt is the deterministic template engine.
    pub async fn respond_at(
        &self,
        user_id: &str,
        username: &str,
        text: &str,
        is_reply: bool,
        now: DateTime<Utc>,
    ) -> Reply {
        let turn = self.analyze(user_id, text);

        if !self.has_generative_backend() {
            logging::log_routing(Some(user_id), "No generative backend - template engine");
            return Reply::new(self.fallback_with_context(text, &turn.context), ResponseSource::Fallback);
        }

        let gates = match self.draw_gates(user_id, text, &turn, now) {
            Ok(gates) => gates,
            Err(aggressive) => return Reply::new(aggressive, ResponseSource::Aggressive),
        };

        let context_info = self.context_info(username, &turn);
        let user_message = if is_reply {
            format!("{} replied to you: \"{}\"", username, text)
        } else {
            format!("{} said: \"{}\"", username, text)
        };

        let abusive = detect_abusive_language(text).is_abusive;
        let cooling_down = self.sessions.in_rude_cooldown(user_id, now);

        // Attempt 1: rude backend
        if let Some(rude) = self.rude.as_ref().filter(|_| abusive && !cooling_down) {
            logging::log_routing(Some(user_id), "Rude message detected - using rude backend");
            let prompt = self.rude_prompt(&context_info, &user_message);

            match rude.rude_complete(&prompt, &self.rude_options).await {
                Ok(raw) => match clean_rude_output(&raw, &self.persona.name) {
                    Some(reply) => {
                        logging::log_agent(Some(user_id), &format!("{} replied", rude.name()));
                        self.sessions.record_rude_reply(user_id, now);
                        return Reply::new(reply, ResponseSource::Rude);
                    }
                    None => {
                        logging::log_routing(Some(user_id), "Rude output unusable - template engine");
                        return Reply::new(
                            self.fallback_with_context(text, &turn.context),
                            ResponseSource::Fallback,
                        );
                    }
                },
                Err(e) => {
                    logging::log_error(Some(user_id), &format!("{} failed: {}", rude.name(), e));
                }
            }
        } else if abusive && cooling_down {
            logging::log_routing(Some(user_id), "Recent rude response - using clean backend");
        }

        // Attempt 2: clean backend
        if let Some(clean) = self.clean.as_ref() {
            logging::log_routing(Some(user_id), &format!("Using {} for clean response", clean.name()));
            let system_prompt = format!("{}{}", self.persona.system_prompt, context_info);

            match clean.clean_complete(&system_prompt, &user_message).await {
                Ok(generated) => {
                    logging::log_agent(Some(user_id), &format!("{} replied", clean.name()));
                    return Reply::new(self.augment(generated, &gates), ResponseSource::Clean);
                }
                Err(e) => {
                    logging::log_error(Some(user_id), &format!("{} failed: {}", clean.name(), e));
                }
            }
        }

        // Attempt 3: template engine
        logging::log_routing(Some(user_id), "Backends exhausted - template engine");
        Reply::new(self.fallback_with_context(text, &turn.context), ResponseSource::Fallback)
    }

    fn fallback_with_context(&self, text: &str, context: &[MemoryEntry]) -> String {
        self.with_dice(|dice| intelligent_fallback(&self.persona, text, context, &self.odds, dice))
    }

    fn analyze(&self, user_id: &str, text: &str) -> TurnAnalysis {
        let context = self.sessions.context(user_id);
        let topics = detect_conversation_topics(&context);
        let emotion = detect_emotional_context(text);
        let state = determine_conversation_state(text, &context, emotion);
        self.sessions.set_state(user_id, state);

        logging::log_routing(
            Some(user_id),
            &format!(
                "emotion={} state={} topics={} context={}",
                emotion.as_str(),
                state.as_str(),
                topics.len(),
                context.len()
            ),
        );

        TurnAnalysis {
            context,
            topics,
            emotion,
            state,
        }
    }

    /// Draw every gate for a generative turn. `Err` carries the aggressive
    /// reply when that gate preempts the rest.
    fn draw_gates(
        &self,
        user_id: &str,
        text: &str,
        turn: &TurnAnalysis,
        now: DateTime<Utc>,
    ) -> Result<TurnGates, String> {
        let abuse = detect_abusive_language(text);

        self.with_dice(|dice| {
            if abuse.is_abusive && dice.chance(self.odds.aggression) {
                logging::log_routing(Some(user_id), "Aggression gate fired");
                return Err(aggressive_response(&self.persona, &abuse, dice));
            }

            let empathy = empathetic_bank(&self.persona, turn.emotion);
            let empathize = !empathy.is_empty() && dice.chance(self.odds.empathy);

            let questions = question_bank(&turn.topics);
            let ask = !questions.is_empty() && dice.chance(self.odds.question);

            let mut upcoming = turn.context.clone();
            upcoming.push(MemoryEntry {
                message: text.to_string(),
                response: String::new(),
                is_bot: false,
                timestamp: now,
            });
            let next_topics = detect_conversation_topics(&upcoming);
            if let Some(transition) = topic_transition(&turn.topics, &next_topics, dice) {
                if dice.chance(self.odds.transition) {
                    logging::log_routing(Some(user_id), &format!("Topic transition: {}", transition));
                }
            }

            Ok(TurnGates {
                empathy: if empathize { empathy } else { Vec::new() },
                questions: if ask { questions } else { Vec::new() },
            })
        })
    }

    /// Empathy line first when that gate fired, otherwise a trailing question
    fn augment(&self, generated: String, gates: &TurnGates) -> String {
        self.with_dice(|dice| {
            if let Some(line) = draw_line(dice, &gates.empathy) {
                return format!("{} {}", line, generated);
            }
            if let Some(question) = pick(dice, &gates.questions) {
                return format!("{} {}", generated, question);
            }
            generated
        })
    }

    fn context_info(&self, username: &str, turn: &TurnAnalysis) -> String {
        let mut info = String::new();

        if !turn.context.is_empty() {
            info.push_str("\n\nPrevious conversation context:");
            for entry in &turn.context {
                if !entry.message.is_empty() {
                    info.push_str(&format!("\n{}: {}", username, entry.message));
                }
                if entry.is_bot && !entry.response.is_empty() {
                    info.push_str(&format!("\n{}: {}", self.persona.name, entry.response));
                }
            }
        }

        if !turn.topics.is_empty() {
            let topics: Vec<&str> = turn.topics.iter().map(|t| t.as_str()).collect();
            info.push_str(&format!("\n\nCurrent topics being discussed: {}", topics.join(", ")));
        }

        if turn.emotion != Emotion::Neutral {
            info.push_str(&format!("\n\nUser seems to be feeling: {}", turn.emotion.as_str()));
        }

        info.push_str(&format!("\n\nCurrent conversation state: {}", turn.state.as_str()));
        info
    }

    fn rude_prompt(&self, context_info: &str, user_message: &str) -> String {
        let name = &self.persona.name;
        format!(
            "{name} is a chat bot. {system}\n\n\
             IMPORTANT: Respond ONLY as {name} would speak. Do NOT include tone descriptions like \
             \"(in a dismissive tone)\" or translations like \"(roughly translates to...)\". \
             Just respond naturally as {name} would.\n\
             CRITICAL: Keep responses SHORT and sharp when someone is being rude. Maximum 1-2 \
             sentences. Push back hard without slurs.{context_info}\n\n\
             User: {user_message}\n\
             {name}:",
            name = name,
            system = self.persona.system_prompt,
            context_info = context_info,
            user_message = user_message,
        )
    }
}
