use evdevil::event::{Abs, Key};
use evdevil::uinput::{AbsSetup, UinputDevice};
use evdevil::AbsInfo;
use evdevil::Bus;
use evdevil::InputId;
use evdevil::InputProp;

use crate::config::Config;
use crate::control::DeviceInfo;
use crate::device::DeviceProfile;

/// Axis resolutions in units/mm, derived from the physical screen size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub x: i32,
    pub y: i32,
    pub diagonal: i32,
}

impl Resolution {
    /// `width` and `height` are in cm, hence the factor of ten.
    pub fn new(profile: &DeviceProfile, config: &Config) -> Self {
        let diagonal = config.width.hypot(config.height);

        Self {
            x: (f64::from(profile.max_x) / (config.width * 10.0)).round() as i32,
            y: (f64::from(profile.max_y) / (config.height * 10.0)).round() as i32,
            diagonal: (f64::from(profile.diagonal) / (diagonal * 10.0)).round() as i32,
        }
    }
}

pub fn create_touch_device(
    profile: &DeviceProfile,
    config: &Config,
    info: &DeviceInfo,
) -> Result<UinputDevice, Box<dyn std::error::Error + Send + Sync>> {
    let res = Resolution::new(profile, config);
    let slots = profile.max_contacts - 1;

    let axes = [
        AbsSetup::new(Abs::MT_SLOT, AbsInfo::new(0, slots)),
        AbsSetup::new(Abs::MT_TRACKING_ID, AbsInfo::new(0, slots)),
        AbsSetup::new(
            Abs::MT_POSITION_X,
            AbsInfo::new(0, profile.max_x).with_resolution(res.x),
        ),
        AbsSetup::new(
            Abs::MT_POSITION_Y,
            AbsInfo::new(0, profile.max_y).with_resolution(res.y),
        ),
        AbsSetup::new(Abs::MT_ORIENTATION, AbsInfo::new(0, 180)),
        AbsSetup::new(
            Abs::MT_TOUCH_MAJOR,
            AbsInfo::new(0, profile.diagonal).with_resolution(res.diagonal),
        ),
        AbsSetup::new(
            Abs::MT_TOUCH_MINOR,
            AbsInfo::new(0, profile.diagonal).with_resolution(res.diagonal),
        ),
        AbsSetup::new(Abs::X, AbsInfo::new(0, profile.max_x).with_resolution(res.x)),
        AbsSetup::new(Abs::Y, AbsInfo::new(0, profile.max_y).with_resolution(res.y)),
    ];

    // INPUT_PROP_DIRECT = touchscreen. Vendor/product of the panel so udev rules can match it.
    let device = UinputDevice::builder()?
        .with_input_id(InputId::new(
            Bus::VIRTUAL,
            info.vendor,
            info.product,
            0,
        ))?
        .with_props([InputProp::DIRECT])?
        .with_abs_axes(axes)?
        .with_keys([Key::BTN_TOUCH])?
        .build(profile.name)?;

    if let Ok(name) = device.sysname() {
        log::info!(
            "[touch] uinput device created: /sys/devices/virtual/input/{}",
            name.to_string_lossy()
        );
    }
    log::debug!("[touch] resolution {:?}", res);

    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::IPTS;

    #[test]
    fn resolution_follows_screen_size() {
        let config = Config {
            width: 26.0,
            height: 17.3,
            ..Config::default()
        };

        let res = Resolution::new(&IPTS, &config);

        // 9600 / 260, 7200 / 173, 12000 / (hypot(26, 17.3) * 10)
        assert_eq!(res.x, 37);
        assert_eq!(res.y, 42);
        assert_eq!(res.diagonal, 38);
    }
}
