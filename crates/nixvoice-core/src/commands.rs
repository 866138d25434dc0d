//! Spoken command vocabulary for the recognition bridge.
//!
//! A recognized phrase matches a command when its words contain one of the
//! command's trigger phrases as a contiguous run. Commands are tried in
//! vocabulary order, so "help" wins over "dashboard" in "help with dashboard".

use serde::Serialize;

use crate::pages::Page;
use crate::text_prep::{normalize_phrase, words};

/// Canned response for the help command.
pub const HELP_RESPONSE: &str = "You can say: dashboard, repositories, pull requests, admin, or settings to navigate. Say stop to silence the guide.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceCommand {
    Help,
    StopSpeaking,
    Dashboard,
    Repositories,
    PullRequests,
    Admin,
    Settings,
}

/// What the bridge should do for a matched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Speak a canned response.
    Respond(&'static str),
    /// Ask the UI to navigate.
    Navigate(Page),
    /// Cancel the current utterance.
    Silence,
}

const VOCABULARY: &[(VoiceCommand, &[&str])] = &[
    (VoiceCommand::Help, &["help", "what can i say"]),
    (VoiceCommand::StopSpeaking, &["stop", "be quiet", "silence"]),
    (VoiceCommand::Dashboard, &["dashboard", "home"]),
    (VoiceCommand::Repositories, &["repositories", "repos"]),
    (VoiceCommand::PullRequests, &["pull requests", "pull request"]),
    (VoiceCommand::Admin, &["admin panel", "admin"]),
    (VoiceCommand::Settings, &["settings"]),
];

impl VoiceCommand {
    pub fn action(self) -> CommandAction {
        match self {
            VoiceCommand::Help => CommandAction::Respond(HELP_RESPONSE),
            VoiceCommand::StopSpeaking => CommandAction::Silence,
            VoiceCommand::Dashboard => CommandAction::Navigate(Page::Dashboard),
            VoiceCommand::Repositories => CommandAction::Navigate(Page::Repositories),
            VoiceCommand::PullRequests => CommandAction::Navigate(Page::PullRequests),
            VoiceCommand::Admin => CommandAction::Navigate(Page::Admin),
            VoiceCommand::Settings => CommandAction::Navigate(Page::Settings),
        }
    }

    /// Trigger phrases, lowercase.
    pub fn triggers(self) -> &'static [&'static str] {
        VOCABULARY
            .iter()
            .find(|(cmd, _)| *cmd == self)
            .map(|(_, triggers)| *triggers)
            .unwrap_or(&[])
    }
}

/// Match a raw recognized phrase against the vocabulary.
pub fn match_command(phrase: &str) -> Option<VoiceCommand> {
    let normalized = normalize_phrase(phrase);
    let heard = words(&normalized);
    if heard.is_empty() {
        return None;
    }

    VOCABULARY
        .iter()
        .find(|(_, triggers)| {
            triggers
                .iter()
                .any(|trigger| contains_run(&heard, &words(trigger)))
        })
        .map(|(cmd, _)| *cmd)
}

/// True if `needle` appears as a contiguous run inside `haystack`.
fn contains_run(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
