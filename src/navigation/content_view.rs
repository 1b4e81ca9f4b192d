//! Boundary to the embedded content view.
//!
//! The reconciler only talks to a view through [`ContentView`]. Lifecycle
//! events travel the other way as [`ContentEvent`] values routed by the host.

use serde::Serialize;

use crate::types::errors::ViewError;
use crate::types::navigation::{ContentEvent, ScriptTicket, ViewId};
use crate::types::tab::TabId;

/// Capabilities the reconciler needs from an embedded browser view.
pub trait ContentView {
    fn id(&self) -> ViewId;
    fn load_url(&mut self, url: &str) -> Result<(), ViewError>;
    fn reload(&mut self);
    fn can_go_back(&self) -> bool;
    fn go_back(&mut self);
    fn can_go_forward(&self) -> bool;
    fn go_forward(&mut self);
    /// Current location, if the view has one.
    fn url(&self) -> Option<String>;
    fn title(&self) -> Option<String>;
    /// Schedules `script`; its value comes back as
    /// [`ContentEvent::ScriptResult`] carrying the same ticket.
    fn execute_script(&mut self, script: &str, ticket: ScriptTicket) -> Result<(), ViewError>;

    /// Lets views that cannot query their engine synchronously track
    /// location and title from the event stream.
    fn observe(&mut self, _event: &ContentEvent) {}
}

/// Creates one view per tab.
pub trait ViewFactory {
    type View: ContentView;

    fn create_view(&mut self, tab_id: &TabId) -> Self::View;
}

/// An operation a [`HeadlessView`] was asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ViewCommand {
    Load { url: String },
    Reload,
    Back,
    Forward,
    ExecuteScript { ticket: ScriptTicket, script: String },
}

/// A content view with no engine behind it. It records every command so an
/// out-of-process host (or a test) can replay them, and tracks history,
/// location and title from the commands and events it sees.
#[derive(Debug)]
pub struct HeadlessView {
    id: ViewId,
    history: Vec<String>,
    cursor: Option<usize>,
    title: Option<String>,
    commands: Vec<ViewCommand>,
    reject_loads: bool,
    reject_scripts: bool,
}

impl HeadlessView {
    pub fn new(id: ViewId) -> Self {
        Self {
            id,
            history: Vec::new(),
            cursor: None,
            title: None,
            commands: Vec::new(),
            reject_loads: false,
            reject_scripts: false,
        }
    }

    /// Makes every subsequent `load_url` fail.
    pub fn reject_loads(&mut self, reject: bool) {
        self.reject_loads = reject;
    }

    /// Makes every subsequent `execute_script` fail.
    pub fn reject_scripts(&mut self, reject: bool) {
        self.reject_scripts = reject;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Commands recorded since the last call.
    pub fn take_commands(&mut self) -> Vec<ViewCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn commands(&self) -> &[ViewCommand] {
        &self.commands
    }

    fn push_entry(&mut self, url: &str) {
        let keep = self.cursor.map(|c| c + 1).unwrap_or(0);
        self.history.truncate(keep);
        self.history.push(url.to_string());
        self.cursor = Some(self.history.len() - 1);
    }

    fn replace_entry(&mut self, url: &str) {
        match self.cursor {
            Some(c) => self.history[c] = url.to_string(),
            None => self.push_entry(url),
        }
    }
}

impl ContentView for HeadlessView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn load_url(&mut self, url: &str) -> Result<(), ViewError> {
        if self.reject_loads {
            return Err(ViewError::LoadRejected(url.to_string()));
        }
        self.commands.push(ViewCommand::Load { url: url.to_string() });
        self.push_entry(url);
        self.title = None;
        Ok(())
    }

    fn reload(&mut self) {
        self.commands.push(ViewCommand::Reload);
    }

    fn can_go_back(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    fn go_back(&mut self) {
        if let Some(c) = self.cursor.filter(|c| *c > 0) {
            self.cursor = Some(c - 1);
            self.commands.push(ViewCommand::Back);
        }
    }

    fn can_go_forward(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.history.len())
    }

    fn go_forward(&mut self) {
        if let Some(c) = self.cursor.filter(|c| c + 1 < self.history.len()) {
            self.cursor = Some(c + 1);
            self.commands.push(ViewCommand::Forward);
        }
    }

    fn url(&self) -> Option<String> {
        self.cursor.and_then(|c| self.history.get(c).cloned())
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn execute_script(&mut self, script: &str, ticket: ScriptTicket) -> Result<(), ViewError> {
        if self.reject_scripts {
            return Err(ViewError::ScriptFailed("scripts disabled".to_string()));
        }
        self.commands.push(ViewCommand::ExecuteScript {
            ticket,
            script: script.to_string(),
        });
        Ok(())
    }

    fn observe(&mut self, event: &ContentEvent) {
        match event {
            ContentEvent::DidNavigate { url } => self.replace_entry(url),
            ContentEvent::Redirect { url, is_main_frame: true }
            | ContentEvent::DidNavigateInPage { url, is_main_frame: true }
            | ContentEvent::LoadCommit { url, is_main_frame: true } => self.replace_entry(url),
            ContentEvent::TitleUpdated { title } if !title.is_empty() => {
                self.title = Some(title.clone());
            }
            _ => {}
        }
    }
}

/// Hands out [`HeadlessView`]s with sequential ids.
#[derive(Debug, Default)]
pub struct HeadlessViewFactory {
    next_id: u64,
}

impl ViewFactory for HeadlessViewFactory {
    type View = HeadlessView;

    fn create_view(&mut self, _tab_id: &TabId) -> HeadlessView {
        self.next_id += 1;
        HeadlessView::new(ViewId(self.next_id))
    }
}
