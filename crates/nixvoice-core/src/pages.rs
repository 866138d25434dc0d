//! Application pages the voice guide can navigate to and announce.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Dashboard,
    Repositories,
    Repository,
    CodeEditor,
    PullRequests,
    Admin,
    Settings,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Dashboard,
        Page::Repositories,
        Page::Repository,
        Page::CodeEditor,
        Page::PullRequests,
        Page::Admin,
        Page::Settings,
    ];

    /// Router path. `:id` segments are left for the router to fill.
    pub fn route(self) -> &'static str {
        match self {
            Page::Dashboard => "/dashboard",
            Page::Repositories => "/repositories",
            Page::Repository => "/repository/:id",
            Page::CodeEditor => "/repository/:id/editor",
            Page::PullRequests => "/pull-requests",
            Page::Admin => "/admin",
            Page::Settings => "/settings",
        }
    }

    /// Guidance spoken when the page mounts. The dashboard has none.
    pub fn prompt(self) -> Option<&'static str> {
        match self {
            Page::Dashboard => None,
            Page::Repositories => Some(
                "You're viewing your repositories. You can search, filter, or create new repositories here.",
            ),
            Page::Repository => Some(
                "You're viewing a repository. You can browse the code, check pull requests, or start a live chat with collaborators.",
            ),
            Page::CodeEditor => Some(
                "Welcome to the collaborative code editor! You can write code, get AI suggestions, and collaborate with your team in real-time.",
            ),
            Page::PullRequests => Some(
                "Here are your pull requests. You can review code changes, see AI analysis, and merge approved changes.",
            ),
            Page::Admin => Some(
                "Welcome to the admin panel! You can view the 3D globe showing worldwide commits, manage users, and monitor system health.",
            ),
            Page::Settings => Some(
                "You're in the settings page. You can update your profile, manage security settings, and customize your experience.",
            ),
        }
    }
}

impl std::str::FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s
            .trim()
            .trim_start_matches('/')
            .to_ascii_lowercase()
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        match key.as_str() {
            "" | "dashboard" => Ok(Page::Dashboard),
            "repositories" => Ok(Page::Repositories),
            "repository" => Ok(Page::Repository),
            "code-editor" | "editor" => Ok(Page::CodeEditor),
            "pull-requests" => Ok(Page::PullRequests),
            "admin" => Ok(Page::Admin),
            "settings" => Ok(Page::Settings),
            other => Err(format!("unknown page: {other}")),
        }
    }
}
