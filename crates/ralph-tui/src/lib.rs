//! Terminal UI for the Ralph job dashboard.
//!
//! Watches a directory of background jobs and shows their status, tasks,
//! logs and iteration history, refreshing on a fixed interval.
//!
//! ## Hotkeys
//!
//! - `↑↓` / `j k` - Move selection
//! - `←→` / `h l`, `Tab` - Switch tabs
//! - `1`-`6` - Jump to tab
//! - `Enter` - Open / confirm
//! - `Space` - Toggle
//! - `Esc` - Close / back
//! - `n` - New project, `d` - Delete project
//! - `r` - Refresh now, `p` - Pause auto-refresh
//! - `?` - Help
//! - `q` - Quit

pub mod app;
pub mod editor;
pub mod event;
pub mod nav;
pub mod refresh;
pub mod render;
pub mod theme;
pub mod view;

pub use app::{App, AppResult};
pub use nav::{Effect, NavEvent, NavState, reduce};
pub use refresh::{LogBuffer, RefreshScheduler};
pub use view::Screen;
