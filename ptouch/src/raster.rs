//! Conversion of images into raster lines.
//!
//! The tape runs past the print head, so one raster line is one image *column*:
//! the image height must match the pins the loaded tape covers, the image width
//! becomes the label length.

use std::fmt::{self, Debug, Display, Formatter};

use crate::{error::RasterError, packbits};

/// Number of pins on the print head.
pub const PRINT_HEAD_PINS: u32 = 128;

/// One raster line covers the whole print head, one bit per pin.
pub const LINE_LENGTH_BYTES: usize = (PRINT_HEAD_PINS / 8) as usize;

/// Supported tape widths, named after their nominal width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TapeWidth {
	Mm3_5,
	Mm6,
	Mm9,
	Mm12,
	Mm18,
	Mm24,
}

impl TapeWidth {
	pub const ALL: [Self; 6] = [
		Self::Mm3_5,
		Self::Mm6,
		Self::Mm9,
		Self::Mm12,
		Self::Mm18,
		Self::Mm24,
	];

	/// The media width byte the printer reports for this tape.
	pub fn category(self) -> u8 {
		match self {
			Self::Mm3_5 => 4,
			Self::Mm6 => 6,
			Self::Mm9 => 9,
			Self::Mm12 => 12,
			Self::Mm18 => 18,
			Self::Mm24 => 24,
		}
	}

	/// Unused pins on either side of the tape.
	pub fn margin_pins(self) -> u32 {
		match self {
			Self::Mm3_5 => 52,
			Self::Mm6 => 48,
			Self::Mm9 => 39,
			Self::Mm12 => 29,
			Self::Mm18 => 8,
			Self::Mm24 => 0,
		}
	}

	/// Pins that actually touch the tape, i.e. the required image height.
	pub fn printable_pins(self) -> u32 {
		PRINT_HEAD_PINS - 2 * self.margin_pins()
	}
}

impl TryFrom<u8> for TapeWidth {
	type Error = RasterError;

	fn try_from(category: u8) -> Result<Self, RasterError> {
		Self::ALL
			.into_iter()
			.find(|t| t.category() == category)
			.ok_or(RasterError::UnknownTapeWidth(category))
	}
}

impl Display for TapeWidth {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Mm3_5 => f.write_str("3.5mm"),
			t => write!(f, "{}mm", t.category()),
		}
	}
}

/// Pixel layout of an [`ImageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
	/// One sample per pixel, non-zero is ink.
	Bilevel,
	/// One sample per pixel.
	Gray,
	/// Three samples per pixel.
	Rgb,
	/// Four samples per pixel, alpha last.
	Rgba,
	/// Anything else, by name. Cannot be printed.
	Other(String),
}

/// Anything that can hand out pixels.
pub trait ImageSource {
	fn width(&self) -> u32;
	fn height(&self) -> u32;
	fn color_space(&self) -> ColorSpace;

	/// The samples of the pixel at `(x, y)`, laid out as described by [`ImageSource::color_space()`].
	fn pixel(&self, x: u32, y: u32) -> &[u8];
}

/// A monochrome image, `true` is ink.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
	width: u32,
	height: u32,
	pixels: Vec<bool>,
}

impl Bitmap {
	/// Create a blank bitmap.
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			pixels: vec![false; width as usize * height as usize],
		}
	}

	pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
		let mut bitmap = Self::new(width, height);
		for y in 0..height {
			for x in 0..width {
				bitmap.set(x, y, f(x, y));
			}
		}
		bitmap
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	fn index(&self, x: u32, y: u32) -> Option<usize> {
		(x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
	}

	pub fn get(&self, x: u32, y: u32) -> Option<bool> {
		self.index(x, y).map(|i| self.pixels[i])
	}

	/// Set a pixel, out of bounds coordinates are ignored.
	pub fn set(&mut self, x: u32, y: u32, ink: bool) {
		if let Some(i) = self.index(x, y) {
			self.pixels[i] = ink;
		}
	}

	/// Rotate by 90 degrees counter-clockwise.
	pub fn rotate90(&self) -> Self {
		let w = self.width as usize;
		Self::from_fn(self.height, self.width, |x, y| self.pixels[x as usize * w + (w - 1 - y as usize)])
	}

	pub fn invert(&mut self) {
		self.pixels.iter_mut().for_each(|p| *p = !*p);
	}
}

impl Debug for Bitmap {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f
			.debug_struct("Bitmap")
			.field("width", &self.width)
			.field("height", &self.height)
			.finish()
	}
}

impl ImageSource for Bitmap {
	fn width(&self) -> u32 {
		self.width
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn color_space(&self) -> ColorSpace {
		ColorSpace::Bilevel
	}

	fn pixel(&self, x: u32, y: u32) -> &[u8] {
		match self.get(x, y) {
			Some(true) => &[1],
			_ => &[0],
		}
	}
}

/// One compressed raster line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterLine {
	/// Every pin is off.
	Blank,
	/// PackBits compressed line.
	Data(Vec<u8>),
}

impl RasterLine {
	/// Compress a full raster line.
	pub fn pack(line: &[u8; LINE_LENGTH_BYTES]) -> Self {
		if line.iter().all(|&b| b == 0) {
			Self::Blank
		} else {
			Self::Data(packbits::pack(line))
		}
	}

	/// Recover the uncompressed line.
	pub fn unpack(&self) -> Result<Vec<u8>, RasterError> {
		match self {
			Self::Blank => Ok(vec![0; LINE_LENGTH_BYTES]),
			Self::Data(packed) => packbits::unpack(packed),
		}
	}

	/// Size of the line's command on the wire.
	pub fn wire_len(&self) -> usize {
		match self {
			Self::Blank => 1,
			Self::Data(packed) => 3 + packed.len(),
		}
	}
}

/// Reduce any supported image to ink and no ink.
///
/// - bilevel and grayscale: any non-zero sample is ink
/// - RGB: anything but pure white is ink
/// - RGBA: anything not fully transparent is ink
pub fn reduce(source: &dyn ImageSource) -> Result<Bitmap, RasterError> {
	let ink: fn(&[u8]) -> bool = match source.color_space() {
		ColorSpace::Bilevel | ColorSpace::Gray => |p| p.first().is_some_and(|&v| v != 0),
		ColorSpace::Rgb => |p| p.iter().take(3).any(|&c| c < 0xff),
		ColorSpace::Rgba => |p| p.get(3).is_some_and(|&a| a != 0),
		ColorSpace::Other(name) => return Err(RasterError::UnsupportedColorSpace(name)),
	};

	Ok(Bitmap::from_fn(source.width(), source.height(), |x, y| ink(source.pixel(x, y))))
}

/// Make the image height match the tape, rotating it if only the width does.
pub fn fit(bitmap: Bitmap, tape: TapeWidth) -> Result<Bitmap, RasterError> {
	let pins = tape.printable_pins();

	if bitmap.height() == pins {
		Ok(bitmap)
	} else if bitmap.width() == pins {
		log::debug!("rotating {bitmap:?} to fit {tape} tape");
		Ok(bitmap.rotate90())
	} else {
		Err(RasterError::NoFit {
			pins,
			width: bitmap.width(),
			height: bitmap.height(),
		})
	}
}

/// Turn every column of `bitmap` into a raster line for `tape`.
pub fn encode(bitmap: &Bitmap, tape: TapeWidth) -> Result<Vec<RasterLine>, RasterError> {
	let pins = tape.printable_pins();
	if bitmap.height() != pins {
		return Err(RasterError::DimensionMismatch {
			expected: pins,
			actual: bitmap.height(),
		});
	}

	let margin = tape.margin_pins();
	let lines = (0..bitmap.width())
		.map(|x| {
			let mut line = [0u8; LINE_LENGTH_BYTES];
			for y in (0..pins).filter(|&y| bitmap.get(x, y) == Some(true)) {
				let pin = (margin + y) as usize;
				line[pin / 8] |= 128 >> (pin % 8);
			}
			RasterLine::pack(&line)
		})
		.collect();

	Ok(lines)
}

/// [`reduce()`], [`fit()`] and [`encode()`] in one go.
pub fn rasterize(source: &dyn ImageSource, tape: TapeWidth) -> Result<Vec<RasterLine>, RasterError> {
	let bitmap = fit(reduce(source)?, tape)?;
	encode(&bitmap, tape)
}
