//! Driver for Brother P-touch label printers (PT-E550W, PT-P750W, PT-P710BT).
//!
//! A label is turned into a [`PrintJob`], which a [`Session`] streams to the printer
//! over some [`Backend`].

use std::time::Duration;

macro_rules! backends {
	[$($(# [$($m:tt)*])? $mod:ident :: $name:ident),* $(,)?] => {
		$(
			$(# [$($m)*])*
			mod $mod;
			$(# [$($m)*])*
			pub use crate::$mod::$name;
		)*
	};
}

backends! [
	#[cfg(feature = "usb")]
	usb::UsbBackend,
	#[cfg(feature = "file")]
	file::FileBackend,
];

#[cfg(feature = "usb")]
pub use crate::usb::discover;

pub mod cmd;
pub mod packbits;
pub mod raster;
pub mod status;

mod config;
mod error;
mod job;
mod model;
mod session;

pub use crate::{
	cmd::Mode,
	config::SessionConfig,
	error::{Error, ProtocolError, RasterError, Result, TransportError},
	job::{PrintJob, MINIMUM_TAPE_POINTS},
	model::{DeviceIdentity, Model, VENDOR_ID},
	raster::{Bitmap, ColorSpace, ImageSource, RasterLine, TapeWidth},
	session::{Session, SessionState},
	status::{parse_status, Status},
};

/// Byte transport to a printer.
pub trait Backend {
	/// Send a prefix of `buf` to the printer.
	///
	/// # Return value
	/// The number of bytes the transport accepted, which may be less than `buf.len()`.
	fn send(&mut self, buf: &[u8], timeout: Duration) -> Result<usize, TransportError>;

	/// Receive at most `buf.len()` bytes of data from the printer.
	///
	/// # Return value
	/// This functions the number of bytes received from the printer, `0` if nothing was pending.
	fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError>;
}
