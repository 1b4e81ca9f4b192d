//! Suma native UI layer.
//!
//! Uses `wry` for the webviews and `tao` for windowing:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! Browser chrome is HTML/CSS/JS in its own webview; every tab gets a child
//! webview that implements `ContentView`.

pub mod view;
pub mod webview_app;
