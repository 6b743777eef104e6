mod animator;
mod controller;
mod timer;
mod view;

pub use animator::{AnimationConfig, FRAMES, FRAME_INTERVAL_MS};
pub use controller::StatusController;
pub use view::{MemorySink, StatusSink, TriggerEvent, View, ViewId, STATUS_BAR_KEY};
