//! Translate tracked contacts into Linux multitouch and single-touch events.

mod single;
mod tracker;

use std::borrow::Cow;
use std::io;

pub use single::{Pointer, SingleTouch};
pub use tracker::ContactTracker;

use crate::config::Config;
use crate::contact::{Contact, Vector2};
use crate::device::DeviceProfile;
use crate::input::{
    EventSink, ABS_MT_ORIENTATION, ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_SLOT,
    ABS_MT_TOUCH_MAJOR, ABS_MT_TOUCH_MINOR, ABS_MT_TRACKING_ID, ABS_X, ABS_Y, BTN_TOUCH, EV_ABS,
    EV_KEY,
};

pub struct TouchDevice<S> {
    sink: S,
    config: Config,
    profile: DeviceProfile,
    tracker: ContactTracker,
    single: SingleTouch,
    enabled: bool,
}

impl<S: EventSink> TouchDevice<S> {
    pub fn new(sink: S, config: Config, profile: DeviceProfile) -> Self {
        Self {
            sink,
            config,
            profile,
            tracker: ContactTracker::new(),
            single: SingleTouch::new(),
            enabled: true,
        }
    }

    /// Pass one frame of detected contacts to the kernel.
    pub fn update(&mut self, contacts: &[Contact]) -> io::Result<()> {
        let contacts = self.in_range(contacts);
        let contacts = contacts.as_ref();

        self.tracker.update(contacts);

        if !self.enabled || self.is_blocked(contacts) {
            self.lift_all()?;
            return self.sink.sync();
        }

        self.process_multitouch(contacts)?;
        self.process_singletouch(contacts)?;

        self.sink.sync()
    }

    /// Lift everything and ignore all further input until [`enable`](Self::enable).
    pub fn disable(&mut self) -> io::Result<()> {
        self.enabled = false;

        self.lift_all()?;
        self.sink.sync()?;

        self.tracker.clear();
        Ok(())
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether any contact is on the screen.
    pub fn active(&self) -> bool {
        !self.tracker.current().is_empty()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Drop contacts whose index has no slot on the uinput device.
    fn in_range<'a>(&self, contacts: &'a [Contact]) -> Cow<'a, [Contact]> {
        let slots = usize::try_from(self.profile.max_contacts).unwrap_or(0);

        if contacts.iter().all(|c| has_slot(c, slots)) {
            return Cow::Borrowed(contacts);
        }

        for contact in contacts.iter().filter(|c| !has_slot(c, slots)) {
            log::warn!(
                "[touch] ignoring contact {:?}, only {} slots available",
                contact.index,
                slots
            );
        }

        Cow::Owned(
            contacts
                .iter()
                .filter(|c| has_slot(c, slots))
                .cloned()
                .collect(),
        )
    }

    /// A palm on the screen blocks all input, if configured.
    fn is_blocked(&self, contacts: &[Contact]) -> bool {
        self.config.disable_on_palm && contacts.iter().any(|c| !c.is_valid())
    }

    fn process_multitouch(&mut self, contacts: &[Contact]) -> io::Result<()> {
        for contact in contacts {
            let Some(index) = contact.index else {
                continue;
            };

            if !contact.is_stable() {
                continue;
            }

            if contact.is_valid() {
                self.emit_multitouch(index, contact)?;
            } else {
                self.lift_multitouch(index)?;
            }
        }

        for index in self.tracker.lifted().clone() {
            self.lift_multitouch(index)?;
        }

        Ok(())
    }

    fn emit_multitouch(&mut self, index: usize, contact: &Contact) -> io::Result<()> {
        let mean = self.transform(contact.mean);

        let mut orientation = contact.orientation;
        if self.config.invert_x != self.config.invert_y {
            orientation = 1.0 - orientation;
        }

        let x = scale(mean.x, self.profile.max_x);
        let y = scale(mean.y, self.profile.max_y);

        let angle = scale(orientation, 180);
        let major = scale(contact.size.max(), self.profile.diagonal);
        let minor = scale(contact.size.min(), self.profile.diagonal);

        let id = slot(index);
        self.sink.emit(EV_ABS, ABS_MT_SLOT, id)?;
        self.sink.emit(EV_ABS, ABS_MT_TRACKING_ID, id)?;
        self.sink.emit(EV_ABS, ABS_MT_POSITION_X, x)?;
        self.sink.emit(EV_ABS, ABS_MT_POSITION_Y, y)?;

        self.sink.emit(EV_ABS, ABS_MT_ORIENTATION, angle)?;
        self.sink.emit(EV_ABS, ABS_MT_TOUCH_MAJOR, major)?;
        self.sink.emit(EV_ABS, ABS_MT_TOUCH_MINOR, minor)
    }

    fn lift_multitouch(&mut self, index: usize) -> io::Result<()> {
        self.sink.emit(EV_ABS, ABS_MT_SLOT, slot(index))?;
        self.sink.emit(EV_ABS, ABS_MT_TRACKING_ID, -1)
    }

    fn process_singletouch(&mut self, contacts: &[Contact]) -> io::Result<()> {
        match self
            .single
            .select(contacts, self.tracker.lifted(), self.enabled)
        {
            Pointer::Down(contact) => self.emit_singletouch(contact),
            Pointer::Hold => Ok(()),
            Pointer::Up => self.lift_singletouch(),
        }
    }

    fn emit_singletouch(&mut self, contact: &Contact) -> io::Result<()> {
        let mean = self.transform(contact.mean);

        let x = scale(mean.x, self.profile.max_x);
        let y = scale(mean.y, self.profile.max_y);

        self.sink.emit(EV_KEY, BTN_TOUCH, 1)?;
        self.sink.emit(EV_ABS, ABS_X, x)?;
        self.sink.emit(EV_ABS, ABS_Y, y)
    }

    fn lift_singletouch(&mut self) -> io::Result<()> {
        self.sink.emit(EV_KEY, BTN_TOUCH, 0)
    }

    /// Lift every contact that was down in this or the previous frame, and the pointer.
    fn lift_all(&mut self) -> io::Result<()> {
        let tracked: Vec<usize> = self.tracker.tracked().collect();
        for index in tracked {
            self.lift_multitouch(index)?;
        }

        self.lift_singletouch()
    }

    fn transform(&self, mut mean: Vector2) -> Vector2 {
        if self.config.invert_x {
            mean.x = 1.0 - mean.x;
        }

        if self.config.invert_y {
            mean.y = 1.0 - mean.y;
        }

        mean
    }
}

fn scale(value: f64, max: i32) -> i32 {
    (value * f64::from(max)).round() as i32
}

/// Untracked contacts always pass, they are skipped later on.
fn has_slot(contact: &Contact, slots: usize) -> bool {
    contact.index.map_or(true, |index| index < slots)
}

/// Only called for indices that passed [`has_slot`].
fn slot(index: usize) -> i32 {
    index as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::IPTS;
    use crate::input::{EV_SYN, SYN_REPORT};

    type Events = Vec<(u16, u16, i32)>;

    const SYNC: (u16, u16, i32) = (EV_SYN, SYN_REPORT, 0);
    const UP: (u16, u16, i32) = (EV_KEY, BTN_TOUCH, 0);

    fn device(config: Config) -> TouchDevice<Events> {
        TouchDevice::new(Vec::new(), config, IPTS)
    }

    fn contact(index: usize, x: f64, y: f64) -> Contact {
        Contact {
            index: Some(index),
            mean: Vector2::new(x, y),
            size: Vector2::new(0.01, 0.02),
            orientation: 0.25,
            ..Contact::default()
        }
    }

    fn lift(index: i32) -> [(u16, u16, i32); 2] {
        [(EV_ABS, ABS_MT_SLOT, index), (EV_ABS, ABS_MT_TRACKING_ID, -1)]
    }

    fn take(dev: &mut TouchDevice<Events>) -> Events {
        std::mem::take(dev.sink_mut())
    }

    #[test]
    fn emits_full_multitouch_update() {
        let mut dev = device(Config::default());
        dev.update(&[contact(0, 0.5, 0.25)]).unwrap();

        let events = take(&mut dev);
        assert_eq!(
            &events[..7],
            &[
                (EV_ABS, ABS_MT_SLOT, 0),
                (EV_ABS, ABS_MT_TRACKING_ID, 0),
                (EV_ABS, ABS_MT_POSITION_X, 4800),
                (EV_ABS, ABS_MT_POSITION_Y, 1800),
                (EV_ABS, ABS_MT_ORIENTATION, 45),
                (EV_ABS, ABS_MT_TOUCH_MAJOR, 240),
                (EV_ABS, ABS_MT_TOUCH_MINOR, 120),
            ]
        );
        // Pointer was already on index 0, so it is reported immediately
        assert_eq!(
            &events[7..],
            &[(EV_KEY, BTN_TOUCH, 1), (EV_ABS, ABS_X, 4800), (EV_ABS, ABS_Y, 1800), SYNC]
        );
    }

    #[test]
    fn inverting_one_axis_mirrors_orientation() {
        let mut dev = device(Config {
            invert_x: true,
            ..Config::default()
        });

        let mut c = contact(3, 0.25, 0.6);
        c.orientation = 0.1;
        dev.update(&[c]).unwrap();

        let events = take(&mut dev);
        assert!(events.contains(&(EV_ABS, ABS_MT_POSITION_X, 7200)));
        assert!(events.contains(&(EV_ABS, ABS_MT_POSITION_Y, 4320)));
        assert!(events.contains(&(EV_ABS, ABS_MT_ORIENTATION, 162)));
    }

    #[test]
    fn pointer_position_follows_inversion() {
        let mut dev = device(Config {
            invert_x: true,
            ..Config::default()
        });

        // Index 0 is the initial pointer, so it is reported in the first frame
        dev.update(&[contact(0, 0.25, 0.6)]).unwrap();

        let events = take(&mut dev);
        assert_eq!(
            &events[7..],
            &[(EV_KEY, BTN_TOUCH, 1), (EV_ABS, ABS_X, 7200), (EV_ABS, ABS_Y, 4320), SYNC]
        );
    }

    #[test]
    fn inverting_both_axes_keeps_orientation() {
        let mut dev = device(Config {
            invert_x: true,
            invert_y: true,
            ..Config::default()
        });

        let mut c = contact(3, 0.25, 0.6);
        c.orientation = 0.1;
        dev.update(&[c]).unwrap();

        let events = take(&mut dev);
        assert!(events.contains(&(EV_ABS, ABS_MT_POSITION_X, 7200)));
        assert!(events.contains(&(EV_ABS, ABS_MT_POSITION_Y, 2880)));
        assert!(events.contains(&(EV_ABS, ABS_MT_ORIENTATION, 18)));
    }

    #[test]
    fn indices_without_a_slot_are_ignored() {
        let mut dev = device(Config::default());
        let max = IPTS.max_contacts as usize;

        let contacts = [
            contact(usize::MAX, 0.1, 0.1),
            contact(usize::MAX - 1, 0.2, 0.2),
            contact(max, 0.3, 0.3),
            contact(max - 1, 0.4, 0.4),
        ];
        dev.update(&contacts).unwrap();
        dev.update(&contacts).unwrap();

        let slots: Vec<i32> = take(&mut dev)
            .into_iter()
            .filter(|&(ty, code, _)| ty == EV_ABS && code == ABS_MT_SLOT)
            .map(|(_, _, value)| value)
            .collect();
        assert_eq!(slots, vec![max as i32 - 1, max as i32 - 1]);

        // The pointer went to the only contact with a slot
        assert_eq!(dev.single.index(), max - 1);

        dev.update(&[]).unwrap();
        let mut expected: Events = lift(max as i32 - 1).to_vec();
        expected.extend([UP, SYNC]);
        assert_eq!(take(&mut dev), expected);
    }

    #[test]
    fn vanished_contact_is_lifted() {
        let mut dev = device(Config::default());
        dev.update(&[contact(1, 0.1, 0.1), contact(2, 0.2, 0.2)]).unwrap();
        take(&mut dev);

        dev.update(&[contact(2, 0.2, 0.2)]).unwrap();
        let events = take(&mut dev);

        let slot_two = 7;
        assert_eq!(&events[slot_two..slot_two + 2], &lift(1));
        assert!(dev.active());
    }

    #[test]
    fn invalid_contact_is_lifted_without_palm_blocking() {
        let mut dev = device(Config::default());
        dev.update(&[contact(1, 0.1, 0.1), contact(2, 0.2, 0.2)]).unwrap();
        take(&mut dev);

        let mut palm = contact(1, 0.1, 0.1);
        palm.valid = Some(false);
        dev.update(&[palm, contact(2, 0.2, 0.2)]).unwrap();

        let events = take(&mut dev);
        assert_eq!(&events[..2], &lift(1));
        assert_eq!(events[2], (EV_ABS, ABS_MT_SLOT, 2));
        assert_eq!(events[3], (EV_ABS, ABS_MT_TRACKING_ID, 2));
    }

    #[test]
    fn palm_blocks_everything() {
        let mut dev = device(Config {
            disable_on_palm: true,
            ..Config::default()
        });
        dev.update(&[contact(1, 0.1, 0.1), contact(2, 0.2, 0.2)]).unwrap();
        take(&mut dev);

        let mut palm = contact(3, 0.5, 0.5);
        palm.valid = Some(false);
        dev.update(&[contact(1, 0.1, 0.1), contact(2, 0.2, 0.2), palm]).unwrap();

        let mut expected: Events = Vec::new();
        for index in 1..=3 {
            expected.extend(lift(index));
        }
        expected.extend([UP, SYNC]);
        assert_eq!(take(&mut dev), expected);
    }

    #[test]
    fn palm_block_keeps_pointer_selection() {
        let mut dev = device(Config {
            disable_on_palm: true,
            ..Config::default()
        });
        dev.update(&[contact(4, 0.1, 0.1)]).unwrap();
        assert_eq!(dev.single.index(), 4);

        let mut palm = contact(5, 0.5, 0.5);
        palm.valid = Some(false);
        dev.update(&[palm]).unwrap();
        assert_eq!(dev.single.index(), 4);
    }

    #[test]
    fn unstable_update_is_dropped() {
        let mut dev = device(Config::default());
        dev.update(&[contact(1, 0.1, 0.1)]).unwrap();
        take(&mut dev);

        let mut shaky = contact(1, 0.3, 0.3);
        shaky.stable = Some(false);
        dev.update(&[shaky]).unwrap();

        // Pointer is held as well, only the sync remains
        assert_eq!(take(&mut dev), vec![SYNC]);
        assert!(dev.active());

        dev.update(&[contact(1, 0.3, 0.3)]).unwrap();
        let events = take(&mut dev);
        assert_eq!(events[0], (EV_ABS, ABS_MT_SLOT, 1));
        assert_eq!(events[1], (EV_ABS, ABS_MT_TRACKING_ID, 1));
        assert!(!events.contains(&(EV_ABS, ABS_MT_TRACKING_ID, -1)));
    }

    #[test]
    fn pointer_stays_down_across_frames() {
        let mut dev = device(Config::default());

        // First frame only selects index 3
        dev.update(&[contact(3, 0.5, 0.5)]).unwrap();
        assert_eq!(take(&mut dev).iter().filter(|e| **e == UP).count(), 1);

        for frame in 0..10_i32 {
            let x = 0.1 + 0.05 * f64::from(frame);
            dev.update(&[contact(3, x, 0.5)]).unwrap();

            let events = take(&mut dev);
            let downs = events.iter().filter(|e| **e == (EV_KEY, BTN_TOUCH, 1)).count();
            assert_eq!(downs, 1);
            assert!(!events.contains(&UP));
            assert!(events.contains(&(EV_ABS, ABS_X, scale(x, IPTS.max_x))));
        }
    }

    #[test]
    fn disable_lifts_everything_once() {
        let mut dev = device(Config::default());
        dev.update(&[contact(1, 0.1, 0.1), contact(2, 0.2, 0.2)]).unwrap();
        take(&mut dev);

        dev.disable().unwrap();
        let mut expected: Events = Vec::new();
        expected.extend(lift(1));
        expected.extend(lift(2));
        expected.extend([UP, SYNC]);
        assert_eq!(take(&mut dev), expected);
        assert!(!dev.enabled());
        assert!(!dev.active());

        dev.disable().unwrap();
        assert_eq!(take(&mut dev), vec![UP, SYNC]);
    }

    #[test]
    fn disabled_device_reports_nothing_new() {
        let mut dev = device(Config::default());
        dev.disable().unwrap();
        take(&mut dev);

        dev.update(&[contact(6, 0.4, 0.4)]).unwrap();
        let mut expected: Events = lift(6).to_vec();
        expected.extend([UP, SYNC]);
        assert_eq!(take(&mut dev), expected);

        dev.enable();
        assert!(dev.enabled());
        dev.update(&[contact(6, 0.4, 0.4)]).unwrap();
        assert!(take(&mut dev).contains(&(EV_ABS, ABS_MT_TRACKING_ID, 6)));
    }
}
