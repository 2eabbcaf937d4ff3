use std::fmt::{self, Display, Formatter};

use bitflags::bitflags;

use crate::{cmd::Mode, error::ProtocolError, raster::TapeWidth};

/// Generates a closed, byte-valued enum whose `TryFrom<u8>` refuses unknown values.
macro_rules! byte_enum {
	(
		$(#[$m:meta])*
		$vis:vis enum $name:ident ($field:literal) {
			$($var:ident = $val:literal => $desc:literal),* $(,)?
		}
	) => {
		$(#[$m])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		#[repr(u8)]
		$vis enum $name {
			$($var = $val),*
		}

		impl $name {
			/// Human readable name, as printed on the cassette or in the manual.
			pub fn name(self) -> &'static str {
				match self {
					$(Self::$var => $desc),*
				}
			}
		}

		impl TryFrom<u8> for $name {
			type Error = ProtocolError;

			fn try_from(value: u8) -> Result<Self, ProtocolError> {
				match value {
					$($val => Ok(Self::$var),)*
					value => Err(ProtocolError::UnknownEnumValue { field: $field, value }),
				}
			}
		}

		impl From<$name> for u8 {
			fn from(v: $name) -> u8 {
				v as u8
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
				f.write_str(self.name())
			}
		}
	};
}

/// Byte offsets inside the 32 byte status reply.
mod offset {
	pub const HEAD_MARK: usize = 0;
	pub const SIZE: usize = 1;
	pub const MODEL_CODE: usize = 4;
	pub const ERROR_INFORMATION_1: usize = 8;
	pub const ERROR_INFORMATION_2: usize = 9;
	pub const MEDIA_WIDTH: usize = 10;
	pub const MEDIA_TYPE: usize = 11;
	pub const MODE: usize = 15;
	pub const MEDIA_LENGTH: usize = 17;
	pub const STATUS_TYPE: usize = 18;
	pub const PHASE_TYPE: usize = 19;
	pub const PHASE_NUMBER: usize = 20;
	pub const NOTIFICATION_NUMBER: usize = 22;
	pub const TAPE_COLOR: usize = 24;
	pub const TEXT_COLOR: usize = 25;
	pub const HARDWARE_SETTINGS: usize = 26;
}

const HEAD_MARK: u8 = 0x80;

bitflags! {
	/// Error information 1 (offset 8).
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ErrorInformation1: u8 {
		const NO_MEDIA = 0x01;
		const END_OF_MEDIA = 0x02;
		const CUTTER_JAM = 0x04;
		const WEAK_BATTERIES = 0x08;
		const PRINTER_IN_USE = 0x10;
		const HIGH_VOLTAGE_ADAPTER = 0x40;
	}

	/// Error information 2 (offset 9).
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ErrorInformation2: u8 {
		const WRONG_MEDIA = 0x01;
		const EXPANSION_BUFFER_FULL = 0x02;
		const COMMUNICATION_ERROR = 0x04;
		const COMMUNICATION_BUFFER_FULL = 0x08;
		const COVER_OPEN = 0x10;
		const OVERHEATING = 0x20;
		const BLACK_MARKING_NOT_DETECTED = 0x40;
		const SYSTEM_ERROR = 0x80;
	}
}

impl ErrorInformation1 {
	/// Errors the printer cannot print through.
	pub const BLOCKING: Self = Self::CUTTER_JAM;
}

impl ErrorInformation2 {
	/// Errors the printer cannot print through.
	pub const BLOCKING: Self = Self::WRONG_MEDIA
		.union(Self::COVER_OPEN)
		.union(Self::OVERHEATING)
		.union(Self::SYSTEM_ERROR);
}

byte_enum! {
	pub enum MediaType ("media type") {
		NoMedia = 0x00 => "No media",
		LaminatedTape = 0x01 => "Laminated tape",
		NonLaminatedTape = 0x03 => "Non-laminated tape",
		HeatShrinkTube = 0x11 => "Heat-shrink tube",
		IncompatibleTape = 0xff => "Incompatible tape",
	}
}

byte_enum! {
	pub enum StatusType ("status type") {
		ReplyToStatusRequest = 0x00 => "Reply to status request",
		PrintingCompleted = 0x01 => "Printing completed",
		ErrorOccurred = 0x02 => "Error occurred",
		TurnedOff = 0x04 => "Turned off",
		Notification = 0x05 => "Notification",
		PhaseChange = 0x06 => "Phase change",
	}
}

byte_enum! {
	pub enum PhaseType ("phase type") {
		Editing = 0x00 => "Editing state",
		Printing = 0x01 => "Printing state",
	}
}

byte_enum! {
	pub enum Notification ("notification number") {
		NotAvailable = 0x00 => "Not available",
		CoverOpen = 0x01 => "Cover open",
		CoverClosed = 0x02 => "Cover closed",
	}
}

byte_enum! {
	pub enum TapeColor ("tape color") {
		White = 0x01 => "White",
		Other = 0x02 => "Other",
		Clear = 0x03 => "Clear",
		Red = 0x04 => "Red",
		Blue = 0x05 => "Blue",
		Yellow = 0x06 => "Yellow",
		Green = 0x07 => "Green",
		Black = 0x08 => "Black",
		ClearWhiteText = 0x09 => "Clear (white text)",
		MatteWhite = 0x20 => "Matte white",
		MatteClear = 0x21 => "Matte clear",
		MatteSilver = 0x22 => "Matte silver",
		SatinGold = 0x23 => "Satin gold",
		SatinSilver = 0x24 => "Satin silver",
		BlueD = 0x30 => "Blue (D)",
		RedD = 0x31 => "Red (D)",
		FluorescentOrange = 0x40 => "Fluorescent orange",
		FluorescentYellow = 0x41 => "Fluorescent yellow",
		BerryPinkS = 0x50 => "Berry pink (S)",
		LightGrayS = 0x51 => "Light gray (S)",
		LimeGreenS = 0x52 => "Lime green (S)",
		YellowF = 0x60 => "Yellow (F)",
		PinkF = 0x61 => "Pink (F)",
		BlueF = 0x62 => "Blue (F)",
		WhiteHeatShrinkTube = 0x70 => "White (heat-shrink tube)",
		WhiteFlexId = 0x90 => "White (flex ID)",
		YellowFlexId = 0x91 => "Yellow (flex ID)",
		Cleaning = 0xf0 => "Cleaning",
		Stencil = 0xf1 => "Stencil",
		Incompatible = 0xff => "Incompatible",
	}
}

byte_enum! {
	pub enum TextColor ("text color") {
		White = 0x01 => "White",
		Other = 0x02 => "Other",
		Red = 0x04 => "Red",
		Blue = 0x05 => "Blue",
		Black = 0x08 => "Black",
		Gold = 0x0a => "Gold",
		BlueF = 0x62 => "Blue (F)",
		Cleaning = 0xf0 => "Cleaning",
		Stencil = 0xf1 => "Stencil",
		Incompatible = 0xff => "Incompatible",
	}
}

/// Meaning of the phase number, which depends on the phase type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Editing,
	Feed,
	Printing,
	CoverOpenWhileReceiving,
	Other { phase_type: PhaseType, number: u16 },
}

/// Decoded status reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
	pub model_code: u8,
	pub error_1: ErrorInformation1,
	pub error_2: ErrorInformation2,
	/// Tape width in millimeters, 0 without a cassette.
	pub media_width: u8,
	pub media_type: MediaType,
	pub mode: Mode,
	pub media_length: u8,
	pub status_type: StatusType,
	pub phase_type: PhaseType,
	pub phase_number: u16,
	pub notification: Notification,
	/// `None` when the printer does not report a color (e.g. no cassette).
	pub tape_color: Option<TapeColor>,
	pub text_color: Option<TextColor>,
	pub hardware_settings: [u8; 4],
}

impl Status {
	/// Size of a status reply on the wire.
	pub const LEN: usize = 32;

	pub fn has_errors(&self) -> bool {
		!self.error_1.is_empty() || !self.error_2.is_empty()
	}

	/// Whether any error is set that keeps the printer from printing.
	///
	/// Warnings like [`ErrorInformation1::WEAK_BATTERIES`] and unknown bits don't count.
	pub fn is_blocked(&self) -> bool {
		self.error_1.intersects(ErrorInformation1::BLOCKING) || self.error_2.intersects(ErrorInformation2::BLOCKING)
	}

	/// The loaded tape, if it is one we can print on.
	pub fn tape_width(&self) -> Option<TapeWidth> {
		TapeWidth::try_from(self.media_width).ok()
	}

	pub fn phase(&self) -> Phase {
		match (self.phase_type, self.phase_number) {
			(PhaseType::Editing, 0x0000) => Phase::Editing,
			(PhaseType::Editing, 0x0001) => Phase::Feed,
			(PhaseType::Printing, 0x0000) => Phase::Printing,
			(PhaseType::Printing, 0x0014) => Phase::CoverOpenWhileReceiving,
			(phase_type, number) => Phase::Other { phase_type, number },
		}
	}
}

fn color<T: TryFrom<u8, Error = ProtocolError>>(b: u8) -> Result<Option<T>, ProtocolError> {
	match b {
		0x00 => Ok(None),
		b => T::try_from(b).map(Some),
	}
}

/// Parse a raw status reply.
///
/// Anything but exactly [`Status::LEN`] bytes is a [`ProtocolError::ShortRead`],
/// even if the missing tail would have been zeroes.
pub fn parse_status(buf: &[u8]) -> Result<Status, ProtocolError> {
	if buf.len() != Status::LEN {
		return Err(ProtocolError::ShortRead { len: buf.len() });
	}

	if buf[offset::HEAD_MARK] != HEAD_MARK || buf[offset::SIZE] as usize != Status::LEN {
		return Err(ProtocolError::BadHeader {
			mark: buf[offset::HEAD_MARK],
			size: buf[offset::SIZE],
		});
	}

	let hw = offset::HARDWARE_SETTINGS;
	let pn = offset::PHASE_NUMBER;

	Ok(Status {
		model_code: buf[offset::MODEL_CODE],
		error_1: ErrorInformation1::from_bits_retain(buf[offset::ERROR_INFORMATION_1]),
		error_2: ErrorInformation2::from_bits_retain(buf[offset::ERROR_INFORMATION_2]),
		media_width: buf[offset::MEDIA_WIDTH],
		media_type: MediaType::try_from(buf[offset::MEDIA_TYPE])?,
		mode: Mode::from_bits_retain(buf[offset::MODE]),
		media_length: buf[offset::MEDIA_LENGTH],
		status_type: StatusType::try_from(buf[offset::STATUS_TYPE])?,
		phase_type: PhaseType::try_from(buf[offset::PHASE_TYPE])?,
		phase_number: u16::from_be_bytes([buf[pn], buf[pn + 1]]),
		notification: Notification::try_from(buf[offset::NOTIFICATION_NUMBER])?,
		tape_color: color(buf[offset::TAPE_COLOR])?,
		text_color: color(buf[offset::TEXT_COLOR])?,
		hardware_settings: [buf[hw], buf[hw + 1], buf[hw + 2], buf[hw + 3]],
	})
}

impl Display for Status {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let unknown = |c: Option<&'static str>| c.unwrap_or("-");

		writeln!(f, " + Media width: {}mm", self.media_width)?;
		writeln!(f, " + Media type : {}", self.media_type)?;
		writeln!(f, " + Tape color : {}", unknown(self.tape_color.map(TapeColor::name)))?;
		writeln!(f, " + Text color : {}", unknown(self.text_color.map(TextColor::name)))?;
		if self.has_errors() {
			writeln!(f, " + Errors     : {:?} {:?}", self.error_1, self.error_2)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	/// A PT-P750W with 12mm white/black laminated tape, idle.
	fn reply() -> [u8; 32] {
		[
			0x80, 0x20, 0x42, 0x30, 0x68, 0x30, 0x00, 0x00,
			0x00, 0x00, 0x0c, 0x01, 0x00, 0x00, 0x00, 0x40,
			0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
			0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
		]
	}

	#[test]
	fn parses_reference_reply() {
		let status = parse_status(&reply()).unwrap();
		assert_eq!(status, Status {
			model_code: 0x68,
			error_1: ErrorInformation1::empty(),
			error_2: ErrorInformation2::empty(),
			media_width: 12,
			media_type: MediaType::LaminatedTape,
			mode: Mode::AUTO_CUT,
			media_length: 0,
			status_type: StatusType::ReplyToStatusRequest,
			phase_type: PhaseType::Editing,
			phase_number: 0,
			notification: Notification::NotAvailable,
			tape_color: Some(TapeColor::White),
			text_color: Some(TextColor::Black),
			hardware_settings: [0; 4],
		});
		assert_eq!(status.tape_width(), Some(TapeWidth::Mm12));
		assert_eq!(status.phase(), Phase::Editing);
		assert!(!status.has_errors());
	}

	#[test]
	fn parses_error_reply() {
		let mut buf = reply();
		buf[8] = 0x01 | 0x20;
		buf[9] = 0x10;
		buf[18] = 0x02;
		buf[19] = 0x01;
		buf[21] = 0x14;

		let status = parse_status(&buf).unwrap();
		assert_eq!(status.status_type, StatusType::ErrorOccurred);
		assert!(status.error_1.contains(ErrorInformation1::NO_MEDIA));
		// unknown bits are kept for diagnosis
		assert_eq!(status.error_1.bits(), 0x21);
		assert_eq!(status.error_2, ErrorInformation2::COVER_OPEN);
		assert_eq!(status.phase(), Phase::CoverOpenWhileReceiving);
		assert!(status.is_blocked());
	}

	#[test]
	fn warnings_do_not_block() {
		let mut buf = reply();
		buf[8] = 0x08 | 0x10 | 0x20;
		let status = parse_status(&buf).unwrap();
		assert!(status.has_errors());
		assert!(!status.is_blocked());

		buf[8] = 0x04;
		assert!(parse_status(&buf).unwrap().is_blocked());
	}

	#[test]
	fn wrong_length_is_short_read() {
		let buf = reply();
		for len in [0, 1, 16, 31] {
			assert_eq!(parse_status(&buf[..len]), Err(ProtocolError::ShortRead { len }));
		}

		let mut long = buf.to_vec();
		long.push(0);
		assert_eq!(parse_status(&long), Err(ProtocolError::ShortRead { len: 33 }));
	}

	#[test]
	fn bad_header() {
		let mut buf = reply();
		buf[0] = 0x00;
		assert_eq!(
			parse_status(&buf),
			Err(ProtocolError::BadHeader { mark: 0x00, size: 0x20 })
		);
	}

	#[test]
	fn unknown_enum_values_are_errors() {
		let mut buf = reply();
		buf[11] = 0x42;
		assert_eq!(
			parse_status(&buf),
			Err(ProtocolError::UnknownEnumValue { field: "media type", value: 0x42 })
		);

		let mut buf = reply();
		buf[24] = 0x0b;
		assert_eq!(
			parse_status(&buf),
			Err(ProtocolError::UnknownEnumValue { field: "tape color", value: 0x0b })
		);

		let mut buf = reply();
		buf[18] = 0x03;
		assert_eq!(
			parse_status(&buf),
			Err(ProtocolError::UnknownEnumValue { field: "status type", value: 0x03 })
		);
	}

	#[test]
	fn empty_printer() {
		let mut buf = reply();
		buf[8] = 0x01;
		buf[10] = 0x00;
		buf[11] = 0x00;
		buf[24] = 0x00;
		buf[25] = 0x00;

		let status = parse_status(&buf).unwrap();
		assert_eq!(status.media_type, MediaType::NoMedia);
		assert_eq!(status.tape_color, None);
		assert_eq!(status.text_color, None);
		assert_eq!(status.tape_width(), None);
	}

	#[test]
	fn incompatible_is_not_unknown() {
		let mut buf = reply();
		buf[11] = 0xff;
		buf[24] = 0xff;
		buf[25] = 0xff;

		let status = parse_status(&buf).unwrap();
		assert_eq!(status.media_type, MediaType::IncompatibleTape);
		assert_eq!(status.tape_color, Some(TapeColor::Incompatible));
		assert_eq!(status.text_color, Some(TextColor::Incompatible));
	}

	#[test]
	fn display() {
		let status = parse_status(&reply()).unwrap();
		assert_eq!(
			status.to_string(),
			" + Media width: 12mm\n + Media type : Laminated tape\n + Tape color : White\n + Text color : Black\n"
		);
	}
}
