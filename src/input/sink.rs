use std::io;

use evdevil::event::InputEvent;
use evdevil::uinput::UinputDevice;

use super::event::{input_event, EV_SYN, SYN_REPORT};

/// Receiver of raw `(type, code, value)` input events.
pub trait EventSink {
    fn emit(&mut self, ty: u16, code: u16, value: i32) -> io::Result<()>;

    /// Terminate the current frame.
    fn sync(&mut self) -> io::Result<()> {
        self.emit(EV_SYN, SYN_REPORT, 0)
    }
}

/// Records events in order, e.g. for inspecting a frame's output.
impl EventSink for Vec<(u16, u16, i32)> {
    fn emit(&mut self, ty: u16, code: u16, value: i32) -> io::Result<()> {
        self.push((ty, code, value));
        Ok(())
    }
}

/// Batches events and hands them to the kernel one frame at a time.
pub struct UinputSink {
    device: UinputDevice,
    batch: Vec<InputEvent>,
    frames: u64,
}

impl UinputSink {
    pub fn new(device: UinputDevice) -> Self {
        Self {
            device,
            batch: Vec::with_capacity(64),
            frames: 0,
        }
    }
}

impl EventSink for UinputSink {
    fn emit(&mut self, ty: u16, code: u16, value: i32) -> io::Result<()> {
        self.batch.push(input_event(ty, code, value));
        if ty != EV_SYN || code != SYN_REPORT {
            return Ok(());
        }

        let result = self.device.write(&self.batch);
        self.batch.clear();
        result?;

        self.frames += 1;
        if self.frames == 1 {
            log::info!("[touch] first event batch (events are flowing)");
        } else if self.frames % 500 == 0 {
            log::debug!("[touch] batches written: {}", self.frames);
        }
        Ok(())
    }
}
