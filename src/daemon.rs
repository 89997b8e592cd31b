//! Poll loop: doorbell -> read -> detect -> emit -> feedback.

use std::thread;
use std::time::{Duration, Instant};

use crate::contact::Contact;
use crate::control::{Buffer, Control};
use crate::error::Result;
use crate::input::EventSink;
use crate::touch::TouchDevice;

/// Consecutive processing failures after which the device is reset.
const MAX_ERRORS: u32 = 50;

const ACTIVE_POLL: Duration = Duration::from_millis(10);
const IDLE_POLL: Duration = Duration::from_millis(200);
const IDLE_AFTER: Duration = Duration::from_secs(5);

pub type DetectError = Box<dyn std::error::Error + Send + Sync>;

/// Turns a raw frame into the list of contacts on the screen.
pub trait ContactDetector {
    /// `contacts` is cleared before every call.
    fn detect(&mut self, frame: &[u8], contacts: &mut Vec<Contact>) -> std::result::Result<(), DetectError>;
}

impl<F> ContactDetector for F
where
    F: FnMut(&[u8], &mut Vec<Contact>) -> std::result::Result<(), DetectError>,
{
    fn detect(&mut self, frame: &[u8], contacts: &mut Vec<Contact>) -> std::result::Result<(), DetectError> {
        self(frame, contacts)
    }
}

pub struct Daemon<B: Buffer, S, D, const N: usize> {
    control: Control<B, N>,
    touch: TouchDevice<S>,
    detector: D,
    frame: Vec<u8>,
    contacts: Vec<Contact>,
    errors: u32,
    frames: u64,
}

impl<B, S, D, const N: usize> Daemon<B, S, D, N>
where
    B: Buffer,
    S: EventSink,
    D: ContactDetector,
{
    pub fn new(control: Control<B, N>, touch: TouchDevice<S>, detector: D) -> Self {
        let frame = vec![0; control.info().buffer_size as usize];

        Self {
            control,
            touch,
            detector,
            frame,
            contacts: Vec::new(),
            errors: 0,
            frames: 0,
        }
    }

    pub fn control(&self) -> &Control<B, N> {
        &self.control
    }

    pub fn touch(&self) -> &TouchDevice<S> {
        &self.touch
    }

    /// Process every frame the device has produced since the last call.
    ///
    /// Returns whether any frame was processed. Transport errors are fatal.
    pub fn step(&mut self) -> Result<bool> {
        let doorbell = self.control.doorbell()?;
        let mut processed = false;

        while self.control.current_doorbell() < doorbell {
            let len = self.control.read(&mut self.frame)?;
            self.process(len);
            self.control.send_feedback()?;

            processed = true;
        }

        Ok(processed)
    }

    /// Run until the transport fails.
    pub fn run(&mut self) -> Result<()> {
        let mut last_activity = Instant::now();

        loop {
            if self.step()? {
                last_activity = Instant::now();
            }

            if last_activity.elapsed() < IDLE_AFTER {
                thread::sleep(ACTIVE_POLL);
            } else {
                thread::sleep(IDLE_POLL);
            }
        }
    }

    fn process(&mut self, len: usize) {
        self.frames += 1;
        if self.frames == 1 {
            log::info!("[touch] first frame received ({} bytes)", len);
        } else if self.frames % 500 == 0 {
            log::debug!("[touch] frames processed: {}", self.frames);
        }

        self.contacts.clear();
        let result = self
            .detector
            .detect(&self.frame[..len], &mut self.contacts)
            .and_then(|()| self.touch.update(&self.contacts).map_err(Into::into));

        match result {
            Ok(()) => self.errors = 0,
            Err(e) => {
                self.errors += 1;
                log::warn!("[touch] failed to process frame: {}", e);

                if self.errors >= MAX_ERRORS {
                    log::error!("[touch] {} consecutive failures", self.errors);
                    self.errors = 0;

                    if let Err(e) = self.control.reset() {
                        log::error!("[touch] reset failed: {}", e);
                    }
                }
            }
        }
    }
}
