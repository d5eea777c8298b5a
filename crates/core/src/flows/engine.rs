use crate::domain::shipment::ShipmentData;
use crate::flows::states::DialogueStep;

/// Resolves the step a conversation should be in from its collected data alone.
///
/// Ignores attempts and history: the same data always yields the same step.
/// Readiness only needs origin, destination, cargo and weight.
pub fn determine_next_step(data: &ShipmentData) -> DialogueStep {
    if data.is_quotable() {
        return DialogueStep::ReadyForQuote;
    }

    data.first_missing().map(DialogueStep::collecting).unwrap_or(DialogueStep::ReadyForQuote)
}
