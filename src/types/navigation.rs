use std::fmt;

use serde::{Deserialize, Serialize};

/// Error code the content engine reports when a navigation was cancelled or
/// superseded by another one (`ERR_ABORTED`).
pub const ABORTED_ERROR_CODE: i32 = -3;

/// Reported when the view refuses to start a load (`ERR_FAILED`).
pub const FAILED_ERROR_CODE: i32 = -2;

/// Reported for address-like input that is not a valid URL (`ERR_INVALID_URL`).
pub const INVALID_URL_ERROR_CODE: i32 = -300;

/// Where a navigation request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentOrigin {
    UserTyped,
    ProgrammaticRedirect,
    Popup,
    RetryFallback,
}

/// A requested navigation. Never stored; consumed by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target: String,
    pub origin: IntentOrigin,
}

impl NavigationIntent {
    pub fn new(target: impl Into<String>, origin: IntentOrigin) -> Self {
        Self { target: target.into(), origin }
    }

    pub fn typed(target: impl Into<String>) -> Self {
        Self::new(target, IntentOrigin::UserTyped)
    }
}

/// Commands carried by the navigation control bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "target", rename_all = "snake_case")]
pub enum NavCommand {
    Reload,
    Back,
    Forward,
    Navigate(String),
}

/// Identity of one embedded content view instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Correlates an `execute_script` call with its asynchronous result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptTicket(pub u64);

/// What the content view should do with a new-window request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewWindowDisposition {
    Allow,
    Deny,
}

/// Every guest new-window request is turned into a tab by the reconciler, so
/// the view never opens one itself.
pub const NEW_WINDOW_POLICY: NewWindowDisposition = NewWindowDisposition::Deny;

/// Lifecycle events emitted by a content view. No ordering is assumed between
/// events of different navigations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentEvent {
    StartLoading,
    FinishLoading,
    FailLoad {
        is_main_frame: bool,
        error_code: i32,
        description: String,
        validated_url: String,
    },
    StartNavigation {
        url: String,
        is_main_frame: bool,
    },
    DidNavigate {
        url: String,
    },
    DidNavigateInPage {
        url: String,
        is_main_frame: bool,
    },
    WillNavigate {
        url: String,
    },
    Redirect {
        url: String,
        is_main_frame: bool,
    },
    LoadCommit {
        url: String,
        is_main_frame: bool,
    },
    FaviconUpdated {
        favicons: Vec<serde_json::Value>,
    },
    /// The tab bar failed to load the favicon image it was given.
    FaviconImageFailed {
        src: String,
    },
    TitleUpdated {
        title: String,
    },
    NewWindow {
        url: String,
    },
    ScriptResult {
        ticket: ScriptTicket,
        result: Result<serde_json::Value, String>,
    },
}

impl ContentEvent {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ContentEvent::StartLoading => "start-loading",
            ContentEvent::FinishLoading => "finish-loading",
            ContentEvent::FailLoad { .. } => "fail-load",
            ContentEvent::StartNavigation { .. } => "start-navigation",
            ContentEvent::DidNavigate { .. } => "navigate",
            ContentEvent::DidNavigateInPage { .. } => "navigate-in-page",
            ContentEvent::WillNavigate { .. } => "will-navigate",
            ContentEvent::Redirect { .. } => "redirect-navigation",
            ContentEvent::LoadCommit { .. } => "load-commit",
            ContentEvent::FaviconUpdated { .. } => "favicon-updated",
            ContentEvent::FaviconImageFailed { .. } => "favicon-image-failed",
            ContentEvent::TitleUpdated { .. } => "title-updated",
            ContentEvent::NewWindow { .. } => "new-window",
            ContentEvent::ScriptResult { .. } => "script-result",
        }
    }
}

/// A load failure shown in the error overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub error_code: i32,
    pub description: String,
    pub url: String,
}
