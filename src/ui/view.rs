//! `ContentView` backed by a native `wry` webview.

use std::rc::Rc;

use tao::event_loop::EventLoopProxy;
use tao::window::Window;
use tracing::{debug, error};
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::{PageLoadEvent, Rect, WebView, WebViewBuilder};

use crate::navigation::content_view::{ContentView, ViewFactory};
use crate::services::theme_engine::TITLE_BAR_HEIGHT;
use crate::types::errors::ViewError;
use crate::types::navigation::{ContentEvent, NewWindowDisposition, ScriptTicket, ViewId, NEW_WINDOW_POLICY};
use crate::types::tab::TabId;

/// Height of the tab strip plus the toolbar row.
pub const CHROME_HEIGHT: u32 = TITLE_BAR_HEIGHT + 41;

/// Events delivered to the tao loop from webview callbacks.
#[derive(Debug)]
pub enum UserEvent {
    View(ViewId, ContentEvent),
    Chrome(String),
}

/// Area below the chrome, in logical pixels.
pub fn content_bounds(window: &Window) -> Rect {
    let size = window.inner_size().to_logical::<f64>(window.scale_factor());
    let top = f64::from(CHROME_HEIGHT);
    Rect {
        position: LogicalPosition::new(0.0, top).into(),
        size: LogicalSize::new(size.width, (size.height - top).max(0.0)).into(),
    }
}

/// Builds `builder` into `window`: packed into the GTK box on Linux, as a
/// positioned child elsewhere.
pub fn attach_webview(builder: WebViewBuilder, window: &Window) -> Result<WebView, String> {
    #[cfg(target_os = "linux")]
    {
        use tao::platform::unix::WindowExtUnix;
        use wry::WebViewBuilderExtUnix;
        let vbox = window.default_vbox().ok_or("window has no GTK box")?;
        builder.build_gtk(vbox).map_err(|e| e.to_string())
    }

    #[cfg(not(target_os = "linux"))]
    {
        builder.build_as_child(window).map_err(|e| e.to_string())
    }
}

pub struct WryView {
    id: ViewId,
    webview: Option<WebView>,
    proxy: EventLoopProxy<UserEvent>,
    history: Vec<String>,
    cursor: Option<usize>,
    traversing: bool,
    title: Option<String>,
}

impl WryView {
    fn webview(&self) -> Result<&WebView, ViewError> {
        self.webview.as_ref().ok_or(ViewError::Detached)
    }

    pub fn set_visible(&self, visible: bool) {
        if let Some(webview) = &self.webview {
            if let Err(e) = webview.set_visible(visible) {
                debug!(view = %self.id, error = %e, "set_visible failed");
            }
        }
    }

    pub fn set_bounds(&self, bounds: Rect) {
        if let Some(webview) = &self.webview {
            if let Err(e) = webview.set_bounds(bounds) {
                debug!(view = %self.id, error = %e, "set_bounds failed");
            }
        }
    }

    fn run_history(&mut self, script: &str) {
        self.traversing = true;
        if let Ok(webview) = self.webview() {
            if let Err(e) = webview.evaluate_script(script) {
                debug!(view = %self.id, error = %e, "history traversal failed");
            }
        }
    }
}

impl ContentView for WryView {
    fn id(&self) -> ViewId {
        self.id
    }

    fn load_url(&mut self, url: &str) -> Result<(), ViewError> {
        self.webview()?
            .load_url(url)
            .map_err(|e| ViewError::LoadRejected(format!("{}: {}", url, e)))
    }

    fn reload(&mut self) {
        if let Ok(webview) = self.webview() {
            if let Err(e) = webview.reload() {
                debug!(view = %self.id, error = %e, "reload failed");
            }
        }
    }

    fn can_go_back(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    fn go_back(&mut self) {
        if let Some(c) = self.cursor.filter(|c| *c > 0) {
            self.cursor = Some(c - 1);
            self.run_history("history.back()");
        }
    }

    fn can_go_forward(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.history.len())
    }

    fn go_forward(&mut self) {
        if self.can_go_forward() {
            self.cursor = self.cursor.map(|c| c + 1);
            self.run_history("history.forward()");
        }
    }

    fn url(&self) -> Option<String> {
        self.webview
            .as_ref()
            .and_then(|w| w.url().ok())
            .filter(|u| !u.is_empty())
            .or_else(|| self.cursor.and_then(|c| self.history.get(c).cloned()))
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn execute_script(&mut self, script: &str, ticket: ScriptTicket) -> Result<(), ViewError> {
        let proxy = self.proxy.clone();
        let id = self.id;
        self.webview()?
            .evaluate_script_with_callback(script, move |raw: String| {
                let result = serde_json::from_str(&raw).map_err(|e| e.to_string());
                let _ = proxy.send_event(UserEvent::View(id, ContentEvent::ScriptResult { ticket, result }));
            })
            .map_err(|e| ViewError::ScriptFailed(e.to_string()))
    }

    fn observe(&mut self, event: &ContentEvent) {
        match event {
            ContentEvent::DidNavigate { url } => {
                if std::mem::take(&mut self.traversing) {
                    return;
                }
                let keep = self.cursor.map_or(0, |c| c + 1);
                self.history.truncate(keep);
                if self.history.last() != Some(url) {
                    self.history.push(url.clone());
                }
                self.cursor = Some(self.history.len() - 1);
            }
            ContentEvent::TitleUpdated { title } => self.title = Some(title.clone()),
            ContentEvent::StartLoading => self.title = None,
            _ => {}
        }
    }
}

/// Creates one child webview per tab, wiring its callbacks to the loop.
pub struct WryViewFactory {
    window: Rc<Window>,
    proxy: EventLoopProxy<UserEvent>,
    next_id: u64,
}

impl WryViewFactory {
    pub fn new(window: Rc<Window>, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self { window, proxy, next_id: 0 }
    }

    fn builder(&self, id: ViewId) -> WebViewBuilder<'static> {
        let send = {
            let proxy = self.proxy.clone();
            move |event: ContentEvent| {
                let _ = proxy.send_event(UserEvent::View(id, event));
            }
        };
        let on_load = send.clone();
        let on_title = send.clone();
        let on_nav = send.clone();
        let on_new_window = send;

        WebViewBuilder::new()
            .with_bounds(content_bounds(&self.window))
            .with_visible(false)
            .with_on_page_load_handler(move |event, url| match event {
                PageLoadEvent::Started => {
                    on_load(ContentEvent::StartLoading);
                    on_load(ContentEvent::StartNavigation { url, is_main_frame: true });
                }
                PageLoadEvent::Finished => {
                    on_load(ContentEvent::DidNavigate { url });
                    on_load(ContentEvent::FinishLoading);
                }
            })
            .with_document_title_changed_handler(move |title| {
                on_title(ContentEvent::TitleUpdated { title });
            })
            .with_navigation_handler(move |url| {
                on_nav(ContentEvent::WillNavigate { url });
                true
            })
            .with_new_window_req_handler(move |url, _features| {
                on_new_window(ContentEvent::NewWindow { url });
                match NEW_WINDOW_POLICY {
                    NewWindowDisposition::Allow => wry::NewWindowResponse::Allow,
                    NewWindowDisposition::Deny => wry::NewWindowResponse::Deny,
                }
            })
            .with_devtools(cfg!(debug_assertions))
    }
}

impl ViewFactory for WryViewFactory {
    type View = WryView;

    fn create_view(&mut self, tab_id: &TabId) -> WryView {
        self.next_id += 1;
        let id = ViewId(self.next_id);
        let webview = match attach_webview(self.builder(id), &self.window) {
            Ok(webview) => Some(webview),
            Err(e) => {
                error!(tab = %tab_id, error = %e, "failed to create webview");
                None
            }
        };
        WryView {
            id,
            webview,
            proxy: self.proxy.clone(),
            history: Vec::new(),
            cursor: None,
            traversing: false,
            title: None,
        }
    }
}
