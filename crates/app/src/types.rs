//! Core types for the ParaSummarizer popup
//!
//! Screen modes, tabs and the setup form live here; the transitions between
//! them are in `state.rs`.

/// Which screen the popup shows.
///
/// `Loading → SetupRequired ⇄ Ready → Submitting → Ready`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    /// Still checking for a stored credential
    Loading,
    /// No credential yet, or the user opened settings to rotate it
    SetupRequired,
    /// Credential present, text editable
    Ready,
    /// A request is in flight; submit is disabled
    Submitting,
}

impl UiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiMode::Loading => "loading",
            UiMode::SetupRequired => "setup_required",
            UiMode::Ready => "ready",
            UiMode::Submitting => "submitting",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Summarize,
    History,
}

impl Tab {
    pub fn display_name(&self) -> &'static str {
        match self {
            Tab::Summarize => "Summarizer",
            Tab::History => "History",
        }
    }
}

/// Credential entry form.
#[derive(Clone, Debug, Default)]
pub struct SetupForm {
    pub key_input: String,
    /// Show the key in clear text
    pub reveal: bool,
    /// Rotating an existing key rather than first-time setup
    pub is_update: bool,
}

impl SetupForm {
    pub fn heading(&self) -> &'static str {
        if self.is_update {
            "Update API Key"
        } else {
            "Setup Required"
        }
    }

    pub fn subheading(&self) -> &'static str {
        if self.is_update {
            "Update your OpenAI API key to continue using ParaSummarizer"
        } else {
            "Enter your OpenAI API key to start using ParaSummarizer"
        }
    }
}
