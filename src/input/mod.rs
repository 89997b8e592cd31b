mod event;
mod sink;
mod uinput;

pub use event::*;
pub use sink::{EventSink, UinputSink};
pub use uinput::{create_touch_device, Resolution};
