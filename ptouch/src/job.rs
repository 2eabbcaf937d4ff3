use std::fmt::{self, Debug, Formatter};

use crate::{
	cmd::Mode,
	error::RasterError,
	raster::{self, ImageSource, RasterLine, TapeWidth},
};

/// Shortest label the cutter can handle, in dots (25.4mm at 180dpi).
pub const MINIMUM_TAPE_POINTS: u32 = 174;

/// A label, ready to be printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PrintJob {
	tape: TapeWidth,
	lines: Vec<RasterLine>,
	margin: u16,
	mode: Mode,
}

impl PrintJob {
	/// Create a job from already encoded lines.
	///
	/// If the label plus `margin` would be shorter than [`MINIMUM_TAPE_POINTS`],
	/// the margin is extended until it is not.
	pub fn new(lines: Vec<RasterLine>, tape: TapeWidth, margin: u16) -> Self {
		let margin = normalize_margin(lines.len(), margin);

		Self {
			tape,
			lines,
			margin,
			mode: Mode::default(),
		}
	}

	/// Rasterize `source` for `tape`, rotating it if needed.
	pub fn from_image(source: &dyn ImageSource, tape: TapeWidth, margin: u16) -> Result<Self, RasterError> {
		let lines = raster::rasterize(source, tape)?;
		Ok(Self::new(lines, tape, margin))
	}

	/// Replace the default mode (auto-cut, no mirroring).
	pub fn with_mode(mut self, mode: Mode) -> Self {
		self.mode = mode;
		self
	}

	pub fn tape(&self) -> TapeWidth {
		self.tape
	}

	pub fn lines(&self) -> &[RasterLine] {
		&self.lines
	}

	/// Number of raster lines, i.e. the label length in dots without the margin.
	pub fn len(&self) -> usize {
		self.lines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	/// The cut margin in dots, after normalization.
	pub fn margin(&self) -> u16 {
		self.margin
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	pub fn into_lines(self) -> Vec<RasterLine> {
		self.lines
	}
}

fn normalize_margin(lines: usize, margin: u16) -> u16 {
	let minimum = MINIMUM_TAPE_POINTS as usize;
	if lines + margin as usize >= minimum {
		return margin;
	}

	let extended = (minimum - lines) as u16;
	log::info!(
		"label ({lines}) + cut margin ({margin}) is shorter than the minimum tape length ({minimum}), \
		extending the cut margin to {extended}"
	);
	extended
}

impl Debug for PrintJob {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f
			.debug_struct("PrintJob")
			.field("tape", &self.tape)
			.field("lines", &self.lines.len())
			.field("margin", &self.margin)
			.field("mode", &self.mode)
			.finish()
	}
}
