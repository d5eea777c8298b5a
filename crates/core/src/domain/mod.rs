pub mod conversation;
pub mod shipment;
