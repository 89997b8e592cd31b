use super::DeviceProfile;

/// Depth of the kernel buffer ring (`/dev/ipts/0` .. `/dev/ipts/15`).
pub const BUFFERS: usize = 16;

pub const IPTS: DeviceProfile = DeviceProfile {
    name: "IPTS Touch",

    // Fixed output space of the IPTS touch protocol, independent of the panel
    max_x: 9600,
    max_y: 7200,
    diagonal: 12000,

    max_contacts: 16,

    device_dir: "/dev/ipts",
};
