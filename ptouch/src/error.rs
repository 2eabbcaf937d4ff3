use thiserror::Error;

use crate::{
	raster::TapeWidth,
	status::{ErrorInformation1, ErrorInformation2},
};

/// Failure of the underlying byte transport.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("transfer timed out")]
	Timeout,

	#[error("device is no longer connected")]
	Disconnected,

	#[cfg(feature = "usb")]
	#[error("usb error: {0}")]
	Usb(rusb::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

#[cfg(feature = "usb")]
impl From<rusb::Error> for TransportError {
	fn from(e: rusb::Error) -> Self {
		match e {
			rusb::Error::Timeout => Self::Timeout,
			rusb::Error::NoDevice => Self::Disconnected,
			e => Self::Usb(e),
		}
	}
}

/// The printer said something we cannot make sense of.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
	#[error("status reply must be 32 bytes, got {len}")]
	ShortRead { len: usize },

	#[error("malformed status header: mark {mark:#04x}, size {size:#04x}")]
	BadHeader { mark: u8, size: u8 },

	#[error("unknown {field} value {value:#04x}")]
	UnknownEnumValue { field: &'static str, value: u8 },

	#[error("no status reply after {attempts} attempts")]
	Timeout { attempts: u32 },
}

/// The input image cannot be turned into raster lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
	#[error("image must be {expected} pixels high, got {actual}")]
	DimensionMismatch { expected: u32, actual: u32 },

	#[error("neither side of the {width}x{height} image matches the {pins} printable pins")]
	NoFit { pins: u32, width: u32, height: u32 },

	#[error("unsupported color space for printing: {0}")]
	UnsupportedColorSpace(String),

	#[error("unsupported tape width: {0}mm")]
	UnknownTapeWidth(u8),

	#[error("packbits stream is truncated at offset {offset}")]
	CorruptRun { offset: usize },
}

/// Everything that can go wrong while talking to a printer.
#[derive(Debug, Error)]
pub enum Error {
	#[error("no supported printer found")]
	NoDriver,

	#[error("no tape cassette is loaded")]
	NoMedia,

	#[error("the loaded tape is not compatible with this printer")]
	IncompatibleMedia,

	#[error("job was encoded for {job} tape, but {loaded}mm tape is loaded")]
	TapeMismatch { loaded: u8, job: TapeWidth },

	#[error("printer reported an error: {error_1:?} {error_2:?}")]
	DeviceError {
		error_1: ErrorInformation1,
		error_2: ErrorInformation2,
	},

	#[error("printer was turned off")]
	PoweredOff,

	#[error("write stalled after {written} of {expected} bytes")]
	WriteStalled { written: usize, expected: usize },

	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	#[error(transparent)]
	Raster(#[from] RasterError),

	#[error(transparent)]
	Transport(#[from] TransportError),
}

#[cfg(feature = "usb")]
impl From<rusb::Error> for Error {
	fn from(e: rusb::Error) -> Self {
		Self::Transport(e.into())
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
