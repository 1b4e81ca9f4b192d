//! RPC method handler for the Suma JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested. `handle_method`
//! dispatches a fixed set of method names onto the [`App`].

use std::sync::Mutex;
use std::time::Instant;

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::popup_bridge::PopupOrigin;
use crate::managers::tab_bar::{ClickTarget, IntentEffect, TabBarIntent};
use crate::managers::tab_manager::TabSessionStoreTrait;
use crate::navigation::content_view::HeadlessViewFactory;
use crate::navigation::reconciler::EventOutcome;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::theme_engine::ThemeEngineTrait;
use crate::types::errors::RpcError;
use crate::types::navigation::{ContentEvent, NavCommand, ViewId};
use crate::types::settings::{ThemeMode, ACCENT_SWATCHES};
use crate::types::tab::TabId;

/// The app as driven over RPC: every view is headless and its commands are
/// forwarded to the client.
pub type HeadlessApp = App<HeadlessViewFactory>;

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::InvalidParams(format!("missing {}", name)))
}

fn tab_param(params: &Value) -> Result<TabId, RpcError> {
    str_param(params, "id").map(TabId::from)
}

fn tab_list(a: &HeadlessApp) -> Value {
    json!({
        "active": a.store.active_id(),
        "revision": a.store.revision(),
        "tabs": a.tab_strip(),
        "status": a.statuses(),
    })
}

fn outcome_name(outcome: EventOutcome) -> &'static str {
    match outcome {
        EventOutcome::Applied => "applied",
        EventOutcome::Ignored => "ignored",
        EventOutcome::DefaultPrevented => "default_prevented",
    }
}

fn effect_json(effect: &IntentEffect) -> Value {
    match effect {
        IntentEffect::Activated(id) => json!({ "effect": "activated", "id": id }),
        IntentEffect::Closed(id) => json!({ "effect": "closed", "id": id }),
        IntentEffect::Created(id) => json!({ "effect": "created", "id": id }),
        IntentEffect::Unchanged => json!({ "effect": "unchanged" }),
    }
}

fn lock(app: &Mutex<HeadlessApp>) -> Result<std::sync::MutexGuard<'_, HeadlessApp>, RpcError> {
    app.lock().map_err(|e| RpcError::Internal(e.to_string()))
}

/// Dispatch a JSON-RPC method call.
pub fn handle_method(app: &Mutex<HeadlessApp>, method: &str, params: &Value) -> Result<Value, RpcError> {
    match method {
        "ping" => Ok(json!({ "pong": true })),

        // ─── Tabs ───
        "tab.list" => {
            let a = lock(app)?;
            Ok(tab_list(&a))
        }
        "tab.create" => {
            let url = params.get("url").and_then(Value::as_str);
            let mut a = lock(app)?;
            let id = a.create_tab(url);
            Ok(json!({ "id": id }))
        }
        "tab.close" => {
            let id = tab_param(params)?;
            let mut a = lock(app)?;
            Ok(json!({ "closed": a.close_tab(&id) }))
        }
        "tab.activate" => {
            let id = tab_param(params)?;
            let mut a = lock(app)?;
            Ok(json!({ "activated": a.activate_tab(&id) }))
        }
        "tab.click" => {
            let id = tab_param(params)?;
            let target = match params.get("target").and_then(Value::as_str).unwrap_or("body") {
                "body" => ClickTarget::Body,
                "close" => ClickTarget::CloseButton,
                other => return Err(RpcError::InvalidParams(format!("unknown click target: {}", other))),
            };
            let mut a = lock(app)?;
            Ok(effect_json(&a.click_tab(&id, target)))
        }
        "tab.new" => {
            let mut a = lock(app)?;
            Ok(effect_json(&a.apply_tab_intent(TabBarIntent::NewTab)))
        }

        // ─── Navigation ───
        "address.submit" => {
            let input = params.get("input").and_then(Value::as_str).unwrap_or("");
            let mut a = lock(app)?;
            a.submit_address(input);
            Ok(json!({ "tab": a.store.get_active().as_ref() }))
        }
        "nav.back" | "nav.forward" | "nav.reload" | "nav.navigate" => {
            let command = match method {
                "nav.back" => NavCommand::Back,
                "nav.forward" => NavCommand::Forward,
                "nav.reload" => NavCommand::Reload,
                _ => NavCommand::Navigate(str_param(params, "target")?.to_string()),
            };
            let mut a = lock(app)?;
            a.publish(command);
            Ok(json!({ "ok": true }))
        }

        // ─── Host relays ───
        "view.event" => {
            let view = params
                .get("view")
                .and_then(Value::as_u64)
                .ok_or_else(|| RpcError::InvalidParams("missing view".to_string()))?;
            let event: ContentEvent = serde_json::from_value(params.get("event").cloned().unwrap_or(Value::Null))
                .map_err(|e| RpcError::InvalidParams(format!("bad event: {}", e)))?;
            let mut a = lock(app)?;
            let outcome = a.dispatch_view_event(ViewId(view), event);
            Ok(json!({ "outcome": outcome_name(outcome) }))
        }
        "favicon.report" => {
            let view = params
                .get("view")
                .and_then(Value::as_u64)
                .ok_or_else(|| RpcError::InvalidParams("missing view".to_string()))?;
            let favicons = params
                .get("favicons")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let mut a = lock(app)?;
            let outcome = a.dispatch_view_event(ViewId(view), ContentEvent::FaviconUpdated { favicons });
            Ok(json!({ "outcome": outcome_name(outcome) }))
        }
        "popup.open" => {
            let url = str_param(params, "url")?;
            let origin = if params.get("new_window").and_then(Value::as_bool).unwrap_or(false) {
                PopupOrigin::CrossWindow
            } else {
                PopupOrigin::SameWindow
            };
            let mut a = lock(app)?;
            a.open_popup(url, origin);
            Ok(json!({ "active": a.store.active_id() }))
        }
        "app.tick" => {
            let mut a = lock(app)?;
            a.tick(Instant::now());
            Ok(json!({ "ok": true }))
        }

        // ─── Theme ───
        "theme.get" => {
            let a = lock(app)?;
            let settings = a
                .settings_engine
                .load_theme()
                .map_err(|e| RpcError::Internal(e.to_string()))?;
            Ok(json!({
                "color": settings.color,
                "mode": settings.mode,
                "palette": a.palette(),
                "swatches": ACCENT_SWATCHES,
            }))
        }
        "theme.set_color" => {
            let color = str_param(params, "color")?;
            let mut a = lock(app)?;
            let palette = a
                .set_theme_color(color)
                .map_err(|e| RpcError::InvalidParams(e.to_string()))?;
            Ok(json!({ "color": a.theme_engine.get_accent_color(), "palette": palette }))
        }
        "theme.set_mode" => {
            let mode: ThemeMode = str_param(params, "mode")?
                .parse()
                .map_err(RpcError::InvalidParams)?;
            let mut a = lock(app)?;
            let palette = a
                .set_theme_mode(mode)
                .map_err(|e| RpcError::Internal(e.to_string()))?;
            Ok(json!({ "mode": mode, "palette": palette }))
        }

        // ─── Assistant ───
        "assistant.run" => {
            let text = params.get("text").and_then(Value::as_str).unwrap_or("");
            let mut a = lock(app)?;
            let reply = a.run_assistant(text);
            Ok(json!({ "reply": reply, "status": a.assistant.status() }))
        }
        "assistant.state" => {
            let a = lock(app)?;
            Ok(json!({
                "status": a.assistant.status(),
                "history": a.assistant.history(),
            }))
        }
        "assistant.dismiss" => {
            let mut a = lock(app)?;
            a.assistant.dismiss_error();
            Ok(json!({ "status": a.assistant.status() }))
        }

        _ => Err(RpcError::UnknownMethod(method.to_string())),
    }
}
