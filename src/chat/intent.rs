//! Command Router: classifies a raw chat line into an [`Intent`].
//!
//! Plain substring checks on the lowercased text. Rules are tried in the
//! order of [`Intent`]'s variants; the first one that matches wins.

/// What the user wants from a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// "use gemini", "switch to codestral-2501", "change model ..."
    SwitchModel,
    /// "show available models", "list models"
    ListModels,
    /// Anything else goes to the model.
    Chat,
}

const SWITCH_PREFIX: &str = "use ";
const SWITCH_PHRASES: &[&str] = &["switch to", "change model"];
const LIST_KEYWORD: &str = "models";
const LIST_VERBS: &[&str] = &["show", "list", "available"];

/// Classify a message.
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();

    if lower.starts_with(SWITCH_PREFIX) || SWITCH_PHRASES.iter().any(|p| lower.contains(p)) {
        return Intent::SwitchModel;
    }

    if lower.contains(LIST_KEYWORD) && LIST_VERBS.iter().any(|v| lower.contains(v)) {
        return Intent::ListModels;
    }

    Intent::Chat
}
