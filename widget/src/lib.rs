//! RatePair Widget
//!
//! Controller for a two-field currency converter. It owns the field values,
//! the main currency and the rate store, runs keystrokes through validation
//! and conversion, and asks for fresh rates when the held ones go stale.

pub mod config;
pub mod controller;
pub mod refresh;
pub mod runtime;
pub mod state;

pub use config::{StalenessMode, WidgetConfig};
pub use controller::ConverterWidget;
pub use refresh::{RefreshHandle, TokioRefresher};
pub use runtime::{WidgetEvent, WidgetRuntime};
pub use state::{WidgetStatus, WidgetView};
