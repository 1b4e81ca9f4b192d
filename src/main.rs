//! Suma: a minimal tabbed web browser shell.
//!
//! Entry point: with the `gui` feature, opens the native browser window.
//! Without it, runs a console walkthrough of the shell core against
//! headless views.

use suma::config::AppConfig;
use suma::logging::init_logging;

#[cfg(feature = "gui")]
fn main() {
    let config = AppConfig::from_env();
    init_logging(&config.log_filter);
    if let Err(e) = suma::ui::webview_app::run(config) {
        tracing::error!(error = %e, "failed to start Suma");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "gui"))]
fn main() {
    let config = AppConfig::from_env();
    init_logging(&config.log_filter);

    println!();
    println!("Suma v{} (headless demo)", env!("CARGO_PKG_VERSION"));
    println!();

    demo_normalizer();
    demo_tabs();
    if let Err(e) = demo_navigation(&config) {
        tracing::error!(error = %e, "navigation demo failed");
        std::process::exit(1);
    }
    demo_theme();
}

#[cfg(not(feature = "gui"))]
fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

#[cfg(not(feature = "gui"))]
fn demo_normalizer() {
    use suma::services::url_normalizer::{classify_input, normalize};
    section("URL Normalizer");

    for input in ["example.com", "localhost:3000", "rust ownership", "http://example.com", "  "] {
        println!(
            "  {:<22} {:?} → {}",
            format!("{:?}", input),
            classify_input(input),
            normalize(input)
        );
    }
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_tabs() {
    use suma::managers::tab_manager::{TabSessionStore, TabSessionStoreTrait};
    section("Tab Session Store");

    let mut store = TabSessionStore::new(None);
    let first = store.active_id().clone();
    let second = store.create_tab(Some("github.com"));
    let third = store.create_tab(Some("crates.io"));
    store.activate_tab(&second);
    println!("  Created 3 tabs, active = {}", store.get_active().url);

    store.close_tab(&second);
    println!("  Closed the active tab, active = {}", store.get_active().url);
    store.close_tab(&third);
    println!("  Closed another, count = {}", store.len());
    println!("  Closing the last tab is refused: {}", !store.close_tab(&first));
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_navigation(config: &suma::config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    use suma::app::App;
    use suma::managers::popup_bridge::PopupOrigin;
    use suma::managers::tab_manager::TabSessionStoreTrait;
    use suma::navigation::content_view::{ContentView, HeadlessViewFactory};
    use suma::types::navigation::ContentEvent;
    section("Navigation");

    let mut app = App::in_memory(config, HeadlessViewFactory::default())?;
    app.submit_address("example.com");
    for (view, command) in app.take_view_commands() {
        println!("  view {} ← {:?}", view, command);
    }

    let tab = app.store.active_id().clone();
    let Some(view) = app.slot(&tab).map(|s| s.view.id()) else {
        return Ok(());
    };
    app.dispatch_view_event(view, ContentEvent::StartLoading);
    app.dispatch_view_event(
        view,
        ContentEvent::FailLoad {
            is_main_frame: true,
            error_code: -105,
            description: "ERR_NAME_NOT_RESOLVED".into(),
            validated_url: "https://example.com/".into(),
        },
    );
    for status in app.statuses().iter().filter(|s| s.active) {
        println!("  after failure: phase = {:?}, toast = {:?}", status.phase, status.toast);
    }

    app.open_popup("https://example.org", PopupOrigin::SameWindow);
    println!("  popup opened, {} tabs", app.store.len());
    app.shutdown();
    println!();
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn demo_theme() {
    use suma::services::theme_engine::{palette, ThemeEngine, ThemeEngineTrait};
    use suma::types::settings::ThemeMode;
    section("Theme Engine");

    let engine = ThemeEngine::default();
    println!("  mode = {}, accent = {}", engine.get_theme(), engine.get_accent_color());
    print!("{}", palette(ThemeMode::Light, "#EF5C63").to_css());
    println!();
}
