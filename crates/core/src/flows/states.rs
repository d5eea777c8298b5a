use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::shipment::SlotField;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStep {
    Greeting,
    CollectOrigin,
    CollectDestination,
    CollectCargo,
    CollectWeight,
    CollectServiceLevel,
    ReadyForQuote,
    QuoteGenerated,
    Completed,
}

impl DialogueStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::CollectOrigin => "collect_origin",
            Self::CollectDestination => "collect_destination",
            Self::CollectCargo => "collect_cargo",
            Self::CollectWeight => "collect_weight",
            Self::CollectServiceLevel => "collect_service_level",
            Self::ReadyForQuote => "ready_for_quote",
            Self::QuoteGenerated => "quote_generated",
            Self::Completed => "completed",
        }
    }

    pub fn collecting(field: SlotField) -> Self {
        match field {
            SlotField::Origin => Self::CollectOrigin,
            SlotField::Destination => Self::CollectDestination,
            SlotField::Cargo => Self::CollectCargo,
            SlotField::Weight => Self::CollectWeight,
            SlotField::ServiceLevel => Self::CollectServiceLevel,
        }
    }

    /// The slot this step asks the user for, if any.
    pub fn target_field(&self) -> Option<SlotField> {
        match self {
            Self::CollectOrigin => Some(SlotField::Origin),
            Self::CollectDestination => Some(SlotField::Destination),
            Self::CollectCargo => Some(SlotField::Cargo),
            Self::CollectWeight => Some(SlotField::Weight),
            Self::CollectServiceLevel => Some(SlotField::ServiceLevel),
            Self::Greeting | Self::ReadyForQuote | Self::QuoteGenerated | Self::Completed => None,
        }
    }
}

impl fmt::Display for DialogueStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a conversation sits outside of slot collection.
///
/// `New` lasts until the first processed turn. `QuoteGenerated` and
/// `Completed` are set by the quoting and booking collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationLifecycle {
    #[default]
    New,
    Collecting,
    QuoteGenerated,
    Completed,
}
