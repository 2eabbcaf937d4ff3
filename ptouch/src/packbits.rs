//! PackBits run-length coding, as used by TIFF and the printer's compressed raster mode.
//!
//! Every run starts with a signed header byte `n`:
//! - `0..=127`: the next `n + 1` bytes are copied literally
//! - `-127..=-1`: the next byte is repeated `1 - n` times
//! - `-128`: no-op

use crate::error::RasterError;

/// Longest literal or repeat run a single header can describe, minus one.
const MAX_RUN: usize = 127;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
	Literal,
	Repeat,
}

fn flush_literal(out: &mut Vec<u8>, literal: &mut Vec<u8>) {
	if literal.is_empty() {
		return;
	}
	out.push((literal.len() - 1) as u8);
	out.append(literal);
}

fn flush_repeat(out: &mut Vec<u8>, count: usize, b: u8) {
	out.push((1 - count as i16) as u8);
	out.push(b);
}

/// Compress `data`.
///
/// Any two equal neighbouring bytes start a repeat run, which keeps the output
/// identical to the encoder the printer vendor's tools use.
pub fn pack(data: &[u8]) -> Vec<u8> {
	let Some((&last, _)) = data.split_last() else {
		return Vec::new();
	};

	let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 1);
	let mut literal = Vec::with_capacity(MAX_RUN + 1);
	let mut state = State::Literal;
	let mut repeat = 0;

	for pair in data.windows(2) {
		let (cur, next) = (pair[0], pair[1]);

		match (cur == next, state) {
			(true, State::Literal) => {
				flush_literal(&mut out, &mut literal);
				state = State::Repeat;
				repeat = 1;
			},
			(true, State::Repeat) => {
				if repeat == MAX_RUN {
					flush_repeat(&mut out, repeat, cur);
					repeat = 0;
				}
				repeat += 1;
			},
			(false, State::Repeat) => {
				flush_repeat(&mut out, repeat + 1, cur);
				state = State::Literal;
				repeat = 0;
			},
			(false, State::Literal) => {
				if literal.len() == MAX_RUN {
					flush_literal(&mut out, &mut literal);
				}
				literal.push(cur);
			},
		}
	}

	match state {
		State::Literal => {
			literal.push(last);
			flush_literal(&mut out, &mut literal);
		},
		State::Repeat => flush_repeat(&mut out, repeat + 1, last),
	}

	out
}

/// Decompress `data`.
pub fn unpack(data: &[u8]) -> Result<Vec<u8>, RasterError> {
	let mut out = Vec::with_capacity(data.len() * 2);
	let mut i = 0;

	while i < data.len() {
		let offset = i;
		let header = data[i] as i8;
		i += 1;

		match header {
			-128 => {},
			0..=127 => {
				let n = header as usize + 1;
				let run = data
					.get(i..i + n)
					.ok_or(RasterError::CorruptRun { offset })?;
				out.extend_from_slice(run);
				i += n;
			},
			_ => {
				let n = (1 - header as isize) as usize;
				let b = *data.get(i).ok_or(RasterError::CorruptRun { offset })?;
				out.resize(out.len() + n, b);
				i += 1;
			},
		}
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	#[test]
	fn short_inputs() {
		assert_eq!(pack(&[]), Vec::<u8>::new());
		assert_eq!(pack(&[0x42]), [0x00, 0x42]);
		assert_eq!(pack(&[0x42, 0x42]), [0xff, 0x42]);
		assert_eq!(pack(&[0x01, 0x02]), [0x01, 0x01, 0x02]);
	}

	#[test]
	fn mixed_line() {
		let mut line = vec![0x00];
		line.extend_from_slice(&[0xaa; 14]);
		line.push(0x00);

		assert_eq!(pack(&line), [0x00, 0x00, 0xf3, 0xaa, 0x00, 0x00]);
	}

	#[test]
	fn solid_line() {
		assert_eq!(pack(&[0xff; 16]), [0xf1, 0xff]);
	}

	#[test]
	fn literal_line() {
		let line: Vec<u8> = (1..=16).collect();
		let packed = pack(&line);
		assert_eq!(packed[0], 15);
		assert_eq!(&packed[1..], &line[..]);
	}

	#[test]
	fn long_runs_are_split() {
		let packed = pack(&[0x55; 300]);
		// 127 + 127 + 46
		assert_eq!(packed, [0x82, 0x55, 0x82, 0x55, 0xd3, 0x55]);
		assert_eq!(unpack(&packed).unwrap(), vec![0x55; 300]);

		let data: Vec<u8> = (0..300u32).map(|i| (i % 251) as u8).collect();
		let packed = pack(&data);
		assert_eq!(packed[0], 126);
		assert_eq!(unpack(&packed).unwrap(), data);
	}

	#[test]
	fn unpack_skips_noop() {
		assert_eq!(unpack(&[0x80, 0x00, 0x07]).unwrap(), [0x07]);
	}

	#[test]
	fn unpack_truncated() {
		assert_eq!(unpack(&[0x03, 0x01]), Err(RasterError::CorruptRun { offset: 0 }));
		assert_eq!(unpack(&[0x00, 0x01, 0xfe]), Err(RasterError::CorruptRun { offset: 2 }));
	}

	proptest! {
		#[test]
		fn raster_line_roundtrip(line in proptest::array::uniform16(any::<u8>())) {
			prop_assert_eq!(unpack(&pack(&line)).unwrap(), line.to_vec());
		}

		#[test]
		fn arbitrary_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
			prop_assert_eq!(unpack(&pack(&data)).unwrap(), data);
		}
	}
}
