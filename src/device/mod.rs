mod ipts;

pub use ipts::{BUFFERS, IPTS};

/// Device-specific parameters for the touch transport and emitter.
#[derive(Debug, Clone, Copy)]
pub struct DeviceProfile {
    pub name: &'static str,

    // Output coordinate space (device units)
    pub max_x: i32,
    pub max_y: i32,
    pub diagonal: i32,

    // Number of tracking slots advertised to uinput
    pub max_contacts: i32,

    // Directory holding the numbered buffer nodes
    pub device_dir: &'static str,
}

impl DeviceProfile {
    /// Get profile for the current device (defaults to IPTS).
    pub fn current() -> &'static Self {
        &IPTS
    }
}
