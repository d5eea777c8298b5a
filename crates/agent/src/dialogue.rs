use tracing::{debug, warn};

use freightdesk_core::config::ExtractionConfig;
use freightdesk_core::domain::conversation::{
    is_invoice_notification, ConversationState, MessageRole,
};
use freightdesk_core::domain::shipment::{ServiceLevel, SlotField};
use freightdesk_core::flows::{ConversationLifecycle, DialogueStep};

use crate::extraction::{Gazetteer, SlotExtractor, StaticGazetteer};
use crate::responses;

/// Reply that tells the caller to run quote computation instead of
/// displaying text.
pub const GENERATE_QUOTE: &str = "GENERATE_QUOTE";

const AFFIRMATIVE_KEYWORDS: &[&str] = &["yes", "confirm", "proceed", "generate"];
const CHANGE_KEYWORDS: &[&str] = &["no", "change"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub next_state: ConversationState,
    pub reply: String,
}

impl TurnOutcome {
    pub fn is_quote_request(&self) -> bool {
        self.reply == GENERATE_QUOTE
    }
}

#[derive(Clone, Debug, Default)]
pub struct DialogueEngine<G = StaticGazetteer> {
    extractor: SlotExtractor<G>,
}

impl DialogueEngine {
    /// Built-in gazetteer extended with `extraction.extra_locations`.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let gazetteer =
            StaticGazetteer::default().with_extra_locations(config.extra_locations.clone());
        Self::new(SlotExtractor::new(gazetteer))
    }
}

impl<G> DialogueEngine<G>
where
    G: Gazetteer,
{
    pub fn new(extractor: SlotExtractor<G>) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &SlotExtractor<G> {
        &self.extractor
    }

    /// Runs one inbound message against `state`.
    ///
    /// The input state is left untouched; the returned state carries the
    /// merged slots, the attempt counter and the appended message log.
    pub fn process_turn(&self, state: &ConversationState, message: &str) -> TurnOutcome {
        if is_invoice_notification(message) {
            return TurnOutcome { next_state: state.clone(), reply: String::new() };
        }

        let step = state.current_step();
        let mut next = state.clone();
        let found = self.extractor.smart_extract(message, &state.shipment);
        let filled = next.shipment.merge_missing(found);
        if !filled.is_empty() {
            debug!(
                thread_id = %state.thread_id,
                step = %step,
                filled = %filled.iter().map(SlotField::label).collect::<Vec<_>>().join(","),
                "slots extracted from message"
            );
        }

        let reply = match step {
            DialogueStep::Greeting => {
                next.lifecycle = ConversationLifecycle::Collecting;
                next.attempts = 0;
                if filled.is_empty() {
                    responses::greeting()
                } else {
                    next_prompt(&next)
                }
            }
            DialogueStep::CollectOrigin
            | DialogueStep::CollectDestination
            | DialogueStep::CollectCargo
            | DialogueStep::CollectWeight => {
                let answered = step.target_field().is_some_and(|field| next.shipment.has(field));
                if answered {
                    next.attempts = 0;
                    next_prompt(&next)
                } else {
                    next.attempts = next.attempts.saturating_add(1);
                    responses::prompt_for(step, next.attempts, &next.shipment)
                }
            }
            DialogueStep::CollectServiceLevel => {
                next.shipment.service_level.get_or_insert(ServiceLevel::Standard);
                next.attempts = 0;
                next_prompt(&next)
            }
            DialogueStep::ReadyForQuote => {
                let lowered = message.to_lowercase();
                if AFFIRMATIVE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
                    GENERATE_QUOTE.to_string()
                } else if is_change_request(&lowered) {
                    responses::change_request_prompt()
                } else {
                    responses::confirmation(&next.shipment)
                }
            }
            DialogueStep::QuoteGenerated | DialogueStep::Completed => {
                warn!(
                    thread_id = %state.thread_id,
                    step = %step,
                    "message received outside of slot collection"
                );
                responses::fallback_reply()
            }
        };

        if next.current_step() != step {
            next.attempts = 0;
        }

        next.push_message(MessageRole::User, message);
        if !reply.is_empty() && reply != GENERATE_QUOTE {
            next.push_message(MessageRole::Assistant, reply.clone());
        }
        next.touch();

        TurnOutcome { next_state: next, reply }
    }
}

fn next_prompt(state: &ConversationState) -> String {
    responses::prompt_for(state.current_step(), state.attempts, &state.shipment)
}

fn is_change_request(lowered: &str) -> bool {
    CHANGE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}
