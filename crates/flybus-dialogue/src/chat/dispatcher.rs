//! Response dispatcher: decides between a canned reply, an LLM prompt and the
//! fallback apology for one retrieval result.
//!
//! All randomness in the dialogue pipeline lives here; retrieval stays deterministic.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::prompt::{build_prompt, CompletionRequest};
use crate::dialogue::{FactEntry, RetrievalResult, SmallTalk};
use crate::types::Language;

/// Canned replies per language.
struct ReplyPool {
    english: &'static [&'static str],
    icelandic: &'static [&'static str],
}

impl ReplyPool {
    fn for_language(&self, language: Language) -> &'static [&'static str] {
        match language {
            Language::English => self.english,
            Language::Icelandic => self.icelandic,
        }
    }
}

static GREETING: ReplyPool = ReplyPool {
    english: &[
        "Hello! I'm the Flybus assistant at Reykjavík Excursions. I can help you with schedules, prices, pick-up locations and bookings. What would you like to know? 😊",
        "Hi there! Ask me anything about the Flybus airport transfer. 🚌",
    ],
    icelandic: &[
        "Hæ! Ég er spjallmenni Flybus hjá Reykjavík Excursions. Hvernig get ég hjálpað? 😊",
        "Halló! Spurðu mig um Flybus flugrútuna. 🚌",
    ],
};

static HOW_ARE_YOU: ReplyPool = ReplyPool {
    english: &["I'm doing great, thanks for asking! How can I help with your airport transfer?"],
    icelandic: &["Mér líður vel, takk fyrir að spyrja! Hvernig get ég aðstoðað þig með flugrútuna?"],
};

static THANKS: ReplyPool = ReplyPool {
    english: &[
        "You're welcome! What else would you like to know about the Flybus?",
        "Happy to help! Is there anything else about your airport transfer?",
    ],
    icelandic: &[
        "Verði þér að góðu! Hvað annað viltu vita um Flybus?",
        "Gott að geta hjálpað! Er eitthvað fleira varðandi flugrútuna?",
    ],
};

static FAREWELL: ReplyPool = ReplyPool {
    english: &["Have a great trip! Safe travels with Flybus. ✨"],
    icelandic: &["Góða ferð! Takk fyrir að ferðast með Flybus. ✨"],
};

static IDENTITY: ReplyPool = ReplyPool {
    english: &["I'm the Flybus virtual assistant for Reykjavík Excursions. I answer questions about schedules, fares, pick-up and drop-off."],
    icelandic: &["Ég er sýndaraðstoðarmaður Flybus hjá Reykjavík Excursions. Ég svara spurningum um áætlun, verð og sótt- og skilastaði."],
};

static ACKNOWLEDGMENT: ReplyPool = ReplyPool {
    english: &[
        "What else would you like to know about the Flybus?",
        "Is there anything specific about your airport transfer you'd like to know?",
        "Feel free to ask about schedules, prices or pick-up locations!",
    ],
    icelandic: &[
        "Hvað annað viltu vita um Flybus?",
        "Er eitthvað sérstakt varðandi flugrútuna sem þú vilt vita?",
        "Ekki hika við að spyrja um áætlun, verð eða sóttstaði!",
    ],
};

static NEGATION: ReplyPool = ReplyPool {
    english: &["Alright! If anything else comes up, I'm here to help."],
    icelandic: &["Allt í lagi! Ef eitthvað fleira kemur upp er ég hér til að hjálpa."],
};

static CONFIRMATION: ReplyPool = ReplyPool {
    english: &["Great! Let me know which details you need and I'll help you out."],
    icelandic: &["Frábært! Láttu mig vita hvað þig vantar og ég aðstoða þig."],
};

const FALLBACK_EN: &str = "I'm still learning about our services. Please contact our service center at 580 5400 or email main@re.is for more information.";
const FALLBACK_IS: &str = "Ég er enn að læra um þjónustuna okkar. Vinsamlegast hafðu samband við þjónustuver í síma 580 5400 eða netfangið main@re.is fyrir nánari upplýsingar.";

/// Fixed apology for turns nothing could answer.
pub fn fallback_reply(language: Language) -> &'static str {
    match language {
        Language::English => FALLBACK_EN,
        Language::Icelandic => FALLBACK_IS,
    }
}

/// How a reply was produced; broadcast alongside each exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    DirectResponse,
    LlmResponse,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePlan {
    /// Reply text is final; `topic` labels the exchange ("greeting", "acknowledgment", ...).
    Canned { text: String, topic: &'static str },
    LlmPrompt(CompletionRequest),
    Fallback { text: String },
}

impl ResponsePlan {
    pub fn kind(&self) -> ReplyKind {
        match self {
            ResponsePlan::Canned { .. } => ReplyKind::DirectResponse,
            ResponsePlan::LlmPrompt(_) => ReplyKind::LlmResponse,
            ResponsePlan::Fallback { .. } => ReplyKind::Fallback,
        }
    }
}

pub struct ResponseDispatcher {
    rng: Mutex<StdRng>,
    history_turns: usize,
}

impl Default for ResponseDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseDispatcher {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic canned-reply selection, for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            history_turns: 6,
        }
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    pub fn plan(&self, result: &RetrievalResult, message: &str) -> ResponsePlan {
        let language = result.context.language;

        if result.is_empty() {
            return ResponsePlan::Fallback {
                text: fallback_reply(language).to_string(),
            };
        }

        if result.is_trivial() {
            if let Some((pool, topic)) = result.relevant_info.first().and_then(canned_pool) {
                return ResponsePlan::Canned {
                    text: self.pick(pool.for_language(language)),
                    topic,
                };
            }
        }

        match build_prompt(message, result, self.history_turns) {
            Ok(request) => ResponsePlan::LlmPrompt(request),
            Err(e) => {
                tracing::warn!(error = %e, "[ResponseDispatcher] Prompt serialization failed");
                ResponsePlan::Fallback {
                    text: fallback_reply(language).to_string(),
                }
            }
        }
    }

    fn pick(&self, replies: &[&str]) -> String {
        let mut rng = self.rng.lock();
        replies
            .choose(&mut *rng)
            .map(|reply| reply.to_string())
            .unwrap_or_default()
    }
}

fn canned_pool(entry: &FactEntry) -> Option<(&'static ReplyPool, &'static str)> {
    match entry {
        FactEntry::CasualChat(kind) => Some(match kind {
            SmallTalk::Greeting => (&GREETING, "greeting"),
            SmallTalk::HowAreYou => (&HOW_ARE_YOU, "how_are_you"),
            SmallTalk::Thanks => (&THANKS, "thanks"),
            SmallTalk::Farewell => (&FAREWELL, "farewell"),
            SmallTalk::Identity => (&IDENTITY, "identity"),
        }),
        FactEntry::Acknowledgment => Some((&ACKNOWLEDGMENT, "acknowledgment")),
        FactEntry::Negation => Some((&NEGATION, "negation")),
        FactEntry::Confirmation => Some((&CONFIRMATION, "confirmation")),
        _ => None,
    }
}
