//! Ring-buffer transport between the IPTS kernel driver and the daemon.
//!
//! The driver exposes a ring of `N` buffers as numbered device nodes. A
//! doorbell counter tells us how many frames the device has produced; the
//! buffer holding the next unread frame is `doorbell % N`. Every consumed
//! buffer has to be acknowledged with a feedback ioctl before the device
//! will fill it again.

mod ioctl;

use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

pub use ioctl::{DeviceInfo, IptsBuffer};

use crate::device::BUFFERS;
use crate::error::{Error, Op, Result};

/// A single buffer node of the ring.
pub trait Buffer {
    /// Whether the device accepts commands. Probe failures count as not ready.
    fn ready(&self) -> bool;
    fn device_info(&self) -> io::Result<DeviceInfo>;
    fn doorbell(&self) -> io::Result<u32>;
    fn send_feedback(&self) -> io::Result<()>;
    fn send_reset(&self) -> io::Result<()>;
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize>;
}

/// How long to wait for the device before attempting an operation anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_secs(1),
        }
    }
}

pub struct Control<B: Buffer = IptsBuffer, const N: usize = BUFFERS> {
    buffers: [B; N],
    info: DeviceInfo,
    doorbell: u32,
    policy: ReadyPolicy,
}

impl<const N: usize> Control<IptsBuffer, N> {
    /// Open `<dir>/0` .. `<dir>/N-1` and synchronise with the device.
    pub fn open(dir: &Path) -> Result<Self> {
        let buffers = (0..N)
            .map(|i| IptsBuffer::open(&dir.join(i.to_string())))
            .collect::<Result<Vec<_>>>()?;

        for buffer in &buffers {
            log::trace!("Opened {}", buffer.path().display());
        }

        log::info!("Opened {} buffers in {}", N, dir.display());

        match buffers.try_into() {
            Ok(buffers) => Self::new(buffers, ReadyPolicy::default()),
            Err(_) => unreachable!("exactly N buffers were opened"),
        }
    }
}

impl<B: Buffer, const N: usize> Control<B, N> {
    /// Take ownership of an already opened ring: flush stale feedback state,
    /// fetch the device info and latch the current doorbell.
    pub fn new(buffers: [B; N], policy: ReadyPolicy) -> Result<Self> {
        let mut control = Self {
            buffers,
            info: DeviceInfo::default(),
            doorbell: 0,
            policy,
        };

        control.flush()?;

        control.wait_for_device();
        control.info = control
            .current()
            .device_info()
            .map_err(Error::transport(Op::GetDeviceInfo))?;

        log::info!(
            "Connected to device {:04x}:{:04x} (version {}, buffer size {}, max contacts {})",
            control.info.vendor,
            control.info.product,
            control.info.version,
            control.info.buffer_size,
            control.info.max_contacts
        );

        control.doorbell = control.doorbell()?;
        Ok(control)
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// The locally tracked doorbell, i.e. the number of the next frame to read.
    pub fn current_doorbell(&self) -> u32 {
        self.doorbell
    }

    /// Query the hardware doorbell.
    ///
    /// A value below the local counter means the device was reset underneath
    /// us (suspend/resume). All buffers are flushed and the local counter is
    /// snapped back to the hardware value.
    pub fn doorbell(&mut self) -> Result<u32> {
        self.wait_for_device();

        let doorbell = self
            .current()
            .doorbell()
            .map_err(Error::transport(Op::GetDoorbell))?;

        if self.doorbell > doorbell {
            log::warn!(
                "Doorbell went backwards ({} -> {}), device was reset",
                self.doorbell,
                doorbell
            );

            self.flush()?;
            self.doorbell = doorbell;
        }

        Ok(doorbell)
    }

    /// Read the frame held by the current buffer. Does not advance the doorbell.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.wait_for_device();

        let slot = self.slot();
        self.buffers[slot]
            .read(dest)
            .map_err(Error::transport(Op::Read))
    }

    /// Acknowledge the current buffer and move on to the next one.
    pub fn send_feedback(&mut self) -> Result<()> {
        let slot = self.slot();
        self.send_feedback_to(slot)?;

        self.doorbell = self.doorbell.wrapping_add(1);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.wait_for_device();

        log::warn!("Resetting device");
        self.current()
            .send_reset()
            .map_err(Error::transport(Op::SendReset))
    }

    fn slot(&self) -> usize {
        self.doorbell as usize % N
    }

    fn current(&self) -> &B {
        &self.buffers[self.slot()]
    }

    fn send_feedback_to(&self, slot: usize) -> Result<()> {
        self.wait_for_device();

        self.buffers[slot]
            .send_feedback()
            .map_err(Error::transport(Op::SendFeedback))
    }

    fn flush(&self) -> Result<()> {
        (0..N).try_for_each(|slot| self.send_feedback_to(slot))
    }

    fn wait_for_device(&self) {
        for _ in 0..self.policy.attempts {
            if self.current().ready() {
                return;
            }

            thread::sleep(self.policy.interval);
        }

        log::debug!(
            "Device not ready after {} attempts, continuing anyway",
            self.policy.attempts
        );
    }
}
