pub mod layout;
pub mod registry;
pub mod surface;
pub mod types;

pub use layout::{LayoutSnapshot, WidgetSnapshot};
pub use registry::WidgetRegistry;
pub use surface::{Content, ImageElement, Placeholder, WebcamElements, WidgetSurface};
pub use types::{PidGains, Widget, WidgetId, WidgetKind};
