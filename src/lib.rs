//! Intel Precise Touch to uinput bridge.
//!
//! [`control`] talks to the kernel buffer ring, [`touch`] turns the contacts
//! found in each frame into Linux multitouch events, and [`daemon`] ties the
//! two together with a pluggable [`daemon::ContactDetector`].

pub mod config;
pub mod contact;
pub mod control;
pub mod daemon;
pub mod device;
pub mod error;
pub mod input;
pub mod touch;

pub use error::{Error, Result};
