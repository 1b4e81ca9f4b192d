// Navigation layer: content-view boundary, event routing, control bus and
// the per-tab reconciler that keeps the session store in step with each view.

pub mod bus;
pub mod content_view;
pub mod favicon;
pub mod reconciler;
pub mod router;
pub mod state;
