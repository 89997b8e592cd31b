//! Kernel interface of the IPTS buffer nodes.

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use super::Buffer;
use crate::error::{Error, Result};

/// Static capabilities reported by `GET_DEVICE_INFO`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub vendor: u16,
    pub product: u16,
    pub version: u32,
    pub buffer_size: u32,
    pub max_contacts: u8,
    pub reserved: [u8; 19],
}

mod sys {
    use nix::{ioctl_none, ioctl_read};

    use super::DeviceInfo;

    ioctl_read!(get_device_ready, 0x86, 0x01, u8);
    ioctl_read!(get_device_info, 0x86, 0x02, DeviceInfo);
    ioctl_read!(get_doorbell, 0x86, 0x03, u32);
    ioctl_none!(send_feedback, 0x86, 0x04);
    ioctl_none!(send_reset, 0x86, 0x05);
}

/// One numbered buffer node, e.g. `/dev/ipts/3`.
#[derive(Debug)]
pub struct IptsBuffer {
    path: PathBuf,
    file: File,
}

impl IptsBuffer {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Buffer for IptsBuffer {
    fn ready(&self) -> bool {
        let mut ready: u8 = 0;

        // SAFETY: the fd is open for the lifetime of self and `ready` outlives the call.
        match unsafe { sys::get_device_ready(self.file.as_raw_fd(), &mut ready) } {
            Ok(_) => ready > 0,
            Err(_) => false,
        }
    }

    fn device_info(&self) -> io::Result<DeviceInfo> {
        let mut info = DeviceInfo::default();

        // SAFETY: DeviceInfo is repr(C) and matches struct ipts_device_info.
        unsafe { sys::get_device_info(self.file.as_raw_fd(), &mut info) }?;
        Ok(info)
    }

    fn doorbell(&self) -> io::Result<u32> {
        let mut doorbell: u32 = 0;

        // SAFETY: see `ready`.
        unsafe { sys::get_doorbell(self.file.as_raw_fd(), &mut doorbell) }?;
        Ok(doorbell)
    }

    fn send_feedback(&self) -> io::Result<()> {
        // SAFETY: argument-less ioctl on an open fd.
        unsafe { sys::send_feedback(self.file.as_raw_fd()) }?;
        Ok(())
    }

    fn send_reset(&self) -> io::Result<()> {
        // SAFETY: argument-less ioctl on an open fd.
        unsafe { sys::send_reset(self.file.as_raw_fd()) }?;
        Ok(())
    }

    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        self.file.read(dest)
    }
}
