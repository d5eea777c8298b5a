use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceLevel {
    Express,
    Standard,
    Economy,
}

impl ServiceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Express => "Express",
            Self::Standard => "Standard",
            Self::Economy => "Economy",
        }
    }
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named slots of a shipment request, listed in the order they are asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotField {
    Origin,
    Destination,
    Cargo,
    Weight,
    ServiceLevel,
}

impl SlotField {
    pub const PRIORITY: [SlotField; 5] =
        [Self::Origin, Self::Destination, Self::Cargo, Self::Weight, Self::ServiceLevel];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Destination => "destination",
            Self::Cargo => "cargo",
            Self::Weight => "weight",
            Self::ServiceLevel => "service_level",
        }
    }
}

/// Partially collected shipment attributes.
///
/// Fields fill monotonically: [`ShipmentData::merge_missing`] only writes
/// slots that are still empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentData {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub cargo: Option<String>,
    pub weight: Option<String>,
    pub service_level: Option<ServiceLevel>,
}

impl ShipmentData {
    pub fn has(&self, field: SlotField) -> bool {
        match field {
            SlotField::Origin => self.origin.is_some(),
            SlotField::Destination => self.destination.is_some(),
            SlotField::Cargo => self.cargo.is_some(),
            SlotField::Weight => self.weight.is_some(),
            SlotField::ServiceLevel => self.service_level.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        SlotField::PRIORITY.iter().all(|field| !self.has(*field))
    }

    /// Origin, destination, cargo and weight are known. Service level is optional.
    pub fn is_quotable(&self) -> bool {
        self.origin.is_some()
            && self.destination.is_some()
            && self.cargo.is_some()
            && self.weight.is_some()
    }

    pub fn first_missing(&self) -> Option<SlotField> {
        SlotField::PRIORITY.into_iter().find(|field| !self.has(*field))
    }

    /// Copies every slot of `found` whose counterpart here is still empty and
    /// returns the slots that were filled.
    pub fn merge_missing(&mut self, found: ShipmentData) -> Vec<SlotField> {
        let mut filled = Vec::new();
        fill(&mut self.origin, found.origin, SlotField::Origin, &mut filled);
        fill(&mut self.destination, found.destination, SlotField::Destination, &mut filled);
        fill(&mut self.cargo, found.cargo, SlotField::Cargo, &mut filled);
        fill(&mut self.weight, found.weight, SlotField::Weight, &mut filled);
        fill(&mut self.service_level, found.service_level, SlotField::ServiceLevel, &mut filled);
        filled
    }
}

fn fill<T>(slot: &mut Option<T>, candidate: Option<T>, field: SlotField, filled: &mut Vec<SlotField>) {
    if slot.is_none() {
        if let Some(value) = candidate {
            *slot = Some(value);
            filled.push(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ServiceLevel, ShipmentData, SlotField};

    #[test]
    fn merge_never_overwrites_existing_slots() {
        let mut data = ShipmentData {
            origin: Some("Mumbai".to_string()),
            ..ShipmentData::default()
        };

        let filled = data.merge_missing(ShipmentData {
            origin: Some("Delhi".to_string()),
            destination: Some("Dubai".to_string()),
            ..ShipmentData::default()
        });

        assert_eq!(filled, vec![SlotField::Destination]);
        assert_eq!(data.origin.as_deref(), Some("Mumbai"));
        assert_eq!(data.destination.as_deref(), Some("Dubai"));
    }

    #[test]
    fn quotable_ignores_service_level() {
        let data = ShipmentData {
            origin: Some("Pune".to_string()),
            destination: Some("London".to_string()),
            cargo: Some("spare parts".to_string()),
            weight: Some("120 kg".to_string()),
            service_level: None,
        };

        assert!(data.is_quotable());
        assert_eq!(data.first_missing(), Some(SlotField::ServiceLevel));
    }

    #[test]
    fn first_missing_follows_priority_order() {
        let data = ShipmentData {
            cargo: Some("textile rolls".to_string()),
            weight: Some("40 kg".to_string()),
            service_level: Some(ServiceLevel::Express),
            ..ShipmentData::default()
        };

        assert_eq!(data.first_missing(), Some(SlotField::Origin));
        assert!(!data.is_empty());
        assert!(ShipmentData::default().is_empty());
    }

    #[test]
    fn labels_match_wire_names() {
        for field in SlotField::PRIORITY {
            let wire = serde_json::to_string(&field).expect("serialize slot");
            assert_eq!(wire, format!("\"{}\"", field.label()));
        }
    }
}
