// Suma state managers
// Managers own mutable shell state: the tab session, the tab bar projection, popup routing.

pub mod popup_bridge;
pub mod tab_bar;
pub mod tab_manager;
