//! Raster command builders.
//!
//! Every function returns the exact bytes of one command and has no other effect,
//! so the whole command stream of a job can be checked without a printer.

use bitflags::bitflags;

use crate::raster::RasterLine;

bitflags! {
	/// Various mode settings (`ESC i M`).
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct Mode: u8 {
		const AUTO_CUT = 0x40;
		const MIRROR_PRINTING = 0x80;
	}
}

impl Default for Mode {
	fn default() -> Self {
		Self::AUTO_CUT
	}
}

/// Length of [`invalidate()`].
pub const INVALIDATE_LEN: usize = 100;

/// Flags of the print information command: recover on error, validate the width.
const PRINT_INFO_FLAGS: u8 = 0x84;

/// Media width announced in the print information command.
const PRINT_INFO_WIDTH: u8 = 24;

/// Zeroes that flush whatever half-received command the printer may still be waiting on.
pub fn invalidate() -> Vec<u8> {
	vec![0x00; INVALIDATE_LEN]
}

/// `ESC @`
pub fn initialize() -> Vec<u8> {
	vec![0x1b, 0x40]
}

/// `ESC i a 01`: switch the dynamic command mode to raster.
pub fn enter_raster_mode() -> Vec<u8> {
	vec![0x1b, 0x69, 0x61, 0x01]
}

/// `ESC i ! 00`: have the printer push status changes on its own.
pub fn enable_status_push() -> Vec<u8> {
	vec![0x1b, 0x69, 0x21, 0x00]
}

/// `ESC i z`: announces the number of raster lines that follow.
pub fn print_information(lines: u32) -> Vec<u8> {
	let mut buf = vec![0x1b, 0x69, 0x7a, PRINT_INFO_FLAGS, 0x00, PRINT_INFO_WIDTH, 0x00];
	buf.extend_from_slice(&lines.to_le_bytes());
	buf.extend_from_slice(&[0x00, 0x00]);
	buf
}

/// `ESC i M`
pub fn set_mode(mode: Mode) -> Vec<u8> {
	vec![0x1b, 0x69, 0x4d, mode.bits()]
}

/// `ESC i K 08`: no chain printing, the tape is fed and cut after this job.
pub fn set_advanced_mode() -> Vec<u8> {
	vec![0x1b, 0x69, 0x4b, 0x08]
}

/// `ESC i d`: feed amount in dots.
pub fn margin_amount(dots: u16) -> Vec<u8> {
	let [lo, hi] = dots.to_le_bytes();
	vec![0x1b, 0x69, 0x64, lo, hi]
}

/// `M 02`: raster lines are TIFF (PackBits) compressed.
pub fn set_compression_mode() -> Vec<u8> {
	vec![0x4d, 0x02]
}

/// `Z` for an empty line, `G` followed by the compressed length and data otherwise.
pub fn raster_data(line: RasterLine) -> Vec<u8> {
	match line {
		RasterLine::Blank => vec![0x5a],
		RasterLine::Data(packed) => {
			let mut buf = Vec::with_capacity(3 + packed.len());
			buf.push(0x47);
			buf.extend_from_slice(&(packed.len() as u16).to_le_bytes());
			buf.extend(packed);
			buf
		},
	}
}

/// `SUB`: print the buffered lines and feed.
pub fn print_and_feed() -> Vec<u8> {
	vec![0x1a]
}

/// `ESC i S`
pub fn status_request() -> Vec<u8> {
	vec![0x1b, 0x69, 0x53]
}
