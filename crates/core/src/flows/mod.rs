pub mod engine;
pub mod states;

pub use engine::determine_next_step;
pub use states::{ConversationLifecycle, DialogueStep};
