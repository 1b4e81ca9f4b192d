//! Native browser window using `wry` + `tao`.
//!
//! Layout:
//! - One chrome webview on top renders the tab strip and the toolbar from
//!   `resources/ui`. It talks to Rust through `window.ipc.postMessage()`.
//! - Each tab owns a child webview below it. Only the active one is visible.
//! - Webview callbacks never touch state directly; they post a
//!   [`UserEvent`] and the loop feeds it to the [`App`].

use std::rc::Rc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tao::event::{Event, StartCause, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy, EventLoopWindowTarget};
use tao::window::{Theme, Window, WindowBuilder, WindowId};
use tracing::{debug, info, warn};
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::{Rect, WebView, WebViewBuilder};

use crate::app::App;
use crate::config::AppConfig;
use crate::host::HostBridge;
use crate::managers::tab_manager::TabSessionStoreTrait;
use crate::navigation::content_view::ContentView;
use crate::services::theme_engine::{Palette, PaletteSink, ThemeEngineTrait, TitleBarOverlay};
use crate::types::navigation::{ContentEvent, NavCommand};
use crate::types::settings::ThemeMode;
use crate::types::tab::TabId;
use crate::ui::view::{attach_webview, content_bounds, UserEvent, WryViewFactory, CHROME_HEIGHT};

const CHROME_HTML: &str = include_str!("../../resources/ui/chrome.html");
const CHROME_JS: &str = include_str!("../../resources/ui/chrome.js");

/// Toast expiry is checked at this interval.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

type GuiApp = App<WryViewFactory>;

fn chrome_page() -> String {
    CHROME_HTML.replace("</body>", &format!("<script>{}</script></body>", CHROME_JS))
}

fn chrome_bounds(window: &Window) -> Rect {
    let width = window.inner_size().to_logical::<f64>(window.scale_factor()).width;
    Rect {
        position: LogicalPosition::new(0.0, 0.0).into(),
        size: LogicalSize::new(width, f64::from(CHROME_HEIGHT)).into(),
    }
}

fn eval(webview: &WebView, script: &str) {
    if let Err(e) = webview.evaluate_script(script) {
        debug!(error = %e, "chrome script failed");
    }
}

/// A secondary top-level window opened for a cross-window popup.
struct PopupWindow {
    window: Window,
    _webview: WebView,
}

/// Window-side effects requested by the core.
struct GuiHost<'a> {
    target: &'a EventLoopWindowTarget<UserEvent>,
    window: &'a Window,
    chrome: &'a WebView,
    popups: &'a mut Vec<PopupWindow>,
}

impl HostBridge for GuiHost<'_> {
    fn open_popup_window(&mut self, url: &str) {
        let window = match WindowBuilder::new()
            .with_title(url)
            .with_inner_size(tao::dpi::LogicalSize::new(800.0, 600.0))
            .build(self.target)
        {
            Ok(window) => window,
            Err(e) => {
                warn!(%url, error = %e, "popup window creation failed");
                return;
            }
        };
        match attach_webview(WebViewBuilder::new().with_url(url), &window) {
            Ok(webview) => {
                info!(%url, "popup window opened");
                self.popups.push(PopupWindow { window, _webview: webview });
            }
            Err(e) => warn!(%url, error = %e, "popup webview creation failed"),
        }
    }

    fn set_theme_mode(&mut self, mode: ThemeMode, overlay: &TitleBarOverlay) {
        let theme = match mode {
            ThemeMode::Light => Some(Theme::Light),
            ThemeMode::Dark => Some(Theme::Dark),
            ThemeMode::System => None,
        };
        self.window.set_theme(theme);
        debug!(%mode, color = %overlay.color, "window theme applied");
    }
}

impl PaletteSink for GuiHost<'_> {
    fn apply_palette(&mut self, palette: &Palette) {
        let css = Value::String(palette.to_css());
        eval(self.chrome, &format!("window.__suma_palette&&window.__suma_palette({})", css));
    }
}

struct Shell {
    app: GuiApp,
    window: Rc<Window>,
    chrome: WebView,
    popups: Vec<PopupWindow>,
}

impl Shell {
    fn handle_chrome(&mut self, target: &EventLoopWindowTarget<UserEvent>, message: &str) {
        let Ok(msg) = serde_json::from_str::<Value>(message) else {
            warn!("malformed chrome message dropped");
            return;
        };
        let id = msg.get("id").and_then(Value::as_str).map(TabId::from);
        match msg.get("cmd").and_then(Value::as_str).unwrap_or("") {
            "ready" => {
                let mut host = GuiHost {
                    target,
                    window: &self.window,
                    chrome: &self.chrome,
                    popups: &mut self.popups,
                };
                self.app.theme_engine.apply_palette(&mut host);
            }
            "activate" => {
                if let Some(id) = id {
                    self.app.activate_tab(&id);
                }
            }
            "close" => {
                if let Some(id) = id {
                    self.app.close_tab(&id);
                }
            }
            "new_tab" => {
                self.app.create_tab(None);
            }
            "submit" => {
                let input = msg.get("input").and_then(Value::as_str).unwrap_or("");
                self.app.submit_address(input);
            }
            "back" => self.app.publish(NavCommand::Back),
            "forward" => self.app.publish(NavCommand::Forward),
            "reload" => self.app.publish(NavCommand::Reload),
            "favicon_failed" => {
                let src = msg.get("src").and_then(Value::as_str).unwrap_or("").to_string();
                let view = id.and_then(|id| self.app.slot(&id).map(|s| s.view.id()));
                if let Some(view) = view {
                    self.app.dispatch_view_event(view, ContentEvent::FaviconImageFailed { src });
                }
            }
            other => debug!(cmd = other, "unknown chrome command"),
        }
    }

    fn sync_views(&self) {
        for (view, active) in self.app.views() {
            view.set_visible(active);
        }
    }

    fn layout(&self) {
        if let Err(e) = self.chrome.set_bounds(chrome_bounds(&self.window)) {
            debug!(error = %e, "chrome resize failed");
        }
        for (view, _) in self.app.views() {
            view.set_bounds(content_bounds(&self.window));
        }
    }

    fn render(&self) {
        let active = self.app.store.get_active();
        let status = self
            .app
            .statuses()
            .into_iter()
            .find(|s| s.active);
        let state = json!({
            "tabs": self.app.tab_strip(),
            "url": active.url,
            "status": status,
        });
        eval(&self.chrome, &format!("window.__suma_render&&window.__suma_render({})", state));
        self.window.set_title(if active.title.is_empty() { "Suma" } else { active.title.as_str() });
    }

    fn flush(&mut self, target: &EventLoopWindowTarget<UserEvent>) {
        let mut host = GuiHost {
            target,
            window: &self.window,
            chrome: &self.chrome,
            popups: &mut self.popups,
        };
        self.app.flush_host(&mut host);
        self.sync_views();
        self.render();
    }

    fn close_popup(&mut self, id: WindowId) -> bool {
        let before = self.popups.len();
        self.popups.retain(|p| p.window.id() != id);
        before != self.popups.len()
    }
}

fn build_chrome(window: &Window, proxy: EventLoopProxy<UserEvent>) -> Result<WebView, String> {
    let builder = WebViewBuilder::new()
        .with_html(chrome_page())
        .with_bounds(chrome_bounds(window))
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            let _ = proxy.send_event(UserEvent::Chrome(msg.into_body()));
        })
        .with_devtools(cfg!(debug_assertions));
    attach_webview(builder, window)
}

// ─── Main entry point ───

pub fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Suma")
            .with_inner_size(tao::dpi::LogicalSize::new(1280.0, 800.0))
            .build(&event_loop)?,
    );
    // The chrome goes in first so it sits above the tab views in the GTK box.
    let chrome = build_chrome(&window, proxy.clone())?;
    let app = App::new(&config, WryViewFactory::new(window.clone(), proxy))?;

    let mut shell = Shell { app, window, chrome, popups: Vec::new() };
    shell.sync_views();
    info!("browser window ready");

    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::WaitUntil(Instant::now() + TICK_INTERVAL);

        match event {
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                shell.app.tick(Instant::now());
                shell.render();
            }

            Event::WindowEvent { window_id, event: WindowEvent::CloseRequested, .. } => {
                if !shell.close_popup(window_id) {
                    shell.app.shutdown();
                    *control_flow = ControlFlow::Exit;
                }
            }

            Event::WindowEvent { event: WindowEvent::Resized(_), .. } => shell.layout(),

            Event::UserEvent(UserEvent::View(view, event)) => {
                shell.app.dispatch_view_event(view, event);
                shell.flush(target);
            }

            Event::UserEvent(UserEvent::Chrome(message)) => {
                shell.handle_chrome(target, &message);
                shell.flush(target);
            }

            _ => {}
        }
    });
}
