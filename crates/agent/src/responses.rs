//! Prompt templates for each dialogue step.
//!
//! `attempts` is the number of failed asks so far: 0 is the first ask, 1 the
//! first retry. Anything past the first retry gets the most detailed wording.

use freightdesk_core::domain::shipment::{ServiceLevel, ShipmentData};
use freightdesk_core::flows::DialogueStep;

const NOT_SPECIFIED: &str = "Not specified";

pub fn greeting() -> String {
    "Hi! I can help you get a shipping quote. Where will the shipment be picked up from?"
        .to_string()
}

pub fn origin_prompt(attempts: u32) -> String {
    match attempts {
        0 => "Where will the shipment be picked up from?".to_string(),
        1 => "I couldn't catch the pickup city. Could you name it, for example Mumbai or Delhi?"
            .to_string(),
        _ => "Please tell me the origin city of the shipment. A city name works best, such as \
              \"Mumbai\", \"Bangalore\", \"Chennai\" or \"Singapore\". You can also write \
              \"from Pune\"."
            .to_string(),
    }
}

pub fn destination_prompt(attempts: u32, origin: Option<&str>) -> String {
    let from = origin.map(|origin| format!(" from {origin}")).unwrap_or_default();
    match attempts {
        0 => format!("Got it. Where is the shipment going{from}?"),
        1 => format!(
            "I still need the destination for the shipment{from}. Which city should it be \
             delivered to, for example Dubai or London?"
        ),
        _ => format!(
            "Please name the destination city for the shipment{from}. For example \"Dubai\", \
             \"London\", \"New York\" or \"to Hong Kong\". It has to be a different place \
             than the pickup city."
        ),
    }
}

pub fn cargo_prompt(attempts: u32) -> String {
    match attempts {
        0 => "What are you shipping?".to_string(),
        1 => "Could you describe the goods? For example electronics, garments or machinery."
            .to_string(),
        _ => "Please describe the cargo in a few words, such as \"20 boxes of electronics\", \
              \"textile rolls\", \"spare parts for pumps\" or \"office furniture\"."
            .to_string(),
    }
}

pub fn weight_prompt(attempts: u32) -> String {
    match attempts {
        0 => "How much does the shipment weigh?".to_string(),
        1 => "I need an approximate weight, for example 100 kg or 250 lbs.".to_string(),
        _ => "Please give the total weight with a unit, such as \"75 kg\", \"200 lbs\" or \
              \"2 tons\". A plain number is read as kilograms."
            .to_string(),
    }
}

pub fn service_level_prompt(attempts: u32) -> String {
    let options = "Express (fastest), Standard or Economy (cheapest)";
    match attempts {
        0 => format!("Which service level would you like: {options}?"),
        _ => format!(
            "Which service level suits you: {options}? If you have no preference I will use \
             Standard."
        ),
    }
}

/// Summary shown before quoting. Every slot is listed.
pub fn confirmation(data: &ShipmentData) -> String {
    let service_level = data.service_level.unwrap_or(ServiceLevel::Standard);
    format!(
        "Here is your shipment:\n\
         - Origin: {}\n\
         - Destination: {}\n\
         - Cargo: {}\n\
         - Weight: {}\n\
         - Service level: {}\n\
         Shall I generate the quote? Reply \"yes\" to proceed or tell me what to change.",
        display(data.origin.as_deref()),
        display(data.destination.as_deref()),
        display(data.cargo.as_deref()),
        display(data.weight.as_deref()),
        service_level,
    )
}

pub fn change_request_prompt() -> String {
    "What would you like to change?".to_string()
}

pub fn fallback_reply() -> String {
    "Sorry, I didn't understand that. Could you rephrase?".to_string()
}

/// Prompt that asks for whatever `step` is waiting on.
pub fn prompt_for(step: DialogueStep, attempts: u32, data: &ShipmentData) -> String {
    match step {
        DialogueStep::Greeting => greeting(),
        DialogueStep::CollectOrigin => origin_prompt(attempts),
        DialogueStep::CollectDestination => destination_prompt(attempts, data.origin.as_deref()),
        DialogueStep::CollectCargo => cargo_prompt(attempts),
        DialogueStep::CollectWeight => weight_prompt(attempts),
        DialogueStep::CollectServiceLevel => service_level_prompt(attempts),
        DialogueStep::ReadyForQuote => confirmation(data),
        DialogueStep::QuoteGenerated | DialogueStep::Completed => fallback_reply(),
    }
}

fn display(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_SPECIFIED)
}
