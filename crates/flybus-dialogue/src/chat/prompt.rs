//! LLM prompt assembly: fixed system instruction plus the fact bundle as JSON.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::dialogue::{FactEntry, RetrievalResult};
use crate::session::SessionContext;
use crate::types::Language;

/// Preferred brand wording, `(avoid, use)`.
pub const TERMINOLOGY: &[(&str, &str)] = &[
    ("reykjavik excursions", "Reykjavík Excursions"),
    ("RE", "Reykjavík Excursions"),
    ("bsi", "BSÍ Bus Terminal"),
    ("bus terminal", "BSÍ Bus Terminal"),
    ("pickup", "pick-up"),
    ("drop off", "drop-off"),
    ("driver", "professional driver"),
    ("bus", "coach"),
    ("tour bus", "coach"),
    ("mini bus", "mini-coach"),
    ("guest", "passenger"),
];

pub const EMOJIS: &[&str] = &["😊", "🚌", "✨", "🌅", "❄️", "📍"];

/// Everything an LLM backend needs for one completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub language: Language,
}

/// The JSON document handed to the model: facts first, then the conversation state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptPayload<'a> {
    question: &'a str,
    relevant_info: &'a [FactEntry],
    context: PromptContext<'a>,
}

/// Session fields worth showing the model. Revision and raw timestamps stay out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptContext<'a> {
    language: Language,
    last_topic: Option<crate::dialogue::Topic>,
    flight_time: Option<crate::types::ClockTime>,
    flight_destination: Option<crate::types::Destination>,
    last_service_type: Option<crate::types::ServiceTier>,
    group_details: Option<crate::types::GroupComposition>,
    history: &'a str,
}

/// Build the fixed system instruction for a reply language.
pub fn build_system_instruction(language: Language) -> String {
    let mut system = String::new();

    system.push_str("# WHO YOU ARE\n");
    system.push_str("You are the Flybus assistant for Reykjavík Excursions, answering questions about the airport transfer between Keflavík Airport and Reykjavík.\n\n");

    system.push_str("# RULES\n");
    system.push_str("- Answer ONLY from the facts in `relevantInfo`. If the facts do not cover the question, say so and refer the passenger to customer service.\n");
    system.push_str("- Never invent prices, times, bus stop numbers or map links.\n");
    system.push_str("- A `direct_pickup` fact means doorstep pick-up: do not mention a bus stop or a map link for it.\n");
    system.push_str("- A `flight_inquiry` fact means details are missing: ask only for the missing items.\n");
    system.push_str("- A `flight_no_departure` fact means no coach reaches the airport in time: say so plainly and do not recommend a departure.\n");
    system.push_str("- Prices are in ISK. Children travel free.\n\n");

    system.push_str("# TERMINOLOGY\n");
    for (avoid, preferred) in TERMINOLOGY {
        system.push_str(&format!("- Say \"{}\" instead of \"{}\"\n", preferred, avoid));
    }
    system.push_str(&format!(
        "- Use at most one emoji from: {}\n\n",
        EMOJIS.join(" ")
    ));

    system.push_str("# LANGUAGE\n");
    match language {
        Language::Icelandic => {
            system.push_str("Reply in Icelandic. Keep proper names such as BSÍ Bus Terminal unchanged.\n")
        }
        Language::English => system.push_str("Reply in English.\n"),
    }
    system
}

/// Serialize a retrieval result into the user-side prompt.
pub fn build_prompt(
    message: &str,
    result: &RetrievalResult,
    history_turns: usize,
) -> Result<CompletionRequest> {
    let context: &SessionContext = &result.context;
    let history = context.format_history(history_turns);
    let payload = PromptPayload {
        question: message,
        relevant_info: &result.relevant_info,
        context: PromptContext {
            language: context.language,
            last_topic: context.last_topic,
            flight_time: context.flight_time,
            flight_destination: context.flight_destination,
            last_service_type: context.last_service_type,
            group_details: context.group_details,
            history: &history,
        },
    };
    let json = serde_json::to_string_pretty(&payload)?;

    Ok(CompletionRequest {
        system: build_system_instruction(context.language),
        prompt: format!(
            "Answer the passenger's question using these facts:\n```json\n{}\n```",
            json
        ),
        language: context.language,
    })
}
