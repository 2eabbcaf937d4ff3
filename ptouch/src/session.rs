use std::fmt::{self, Display, Formatter};

use crate::{
	cmd,
	config::SessionConfig,
	error::{Error, ProtocolError, Result, TransportError},
	job::PrintJob,
	model::DeviceIdentity,
	status::{parse_status, MediaType, Status, StatusType},
	Backend,
};

/// Where a [`Session`] is in the print sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Idle,
	StatusQueried,
	Configured,
	Streaming,
	AwaitingCompletion,
	Completed,
	Error,
}

impl Display for SessionState {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		<Self as fmt::Debug>::fmt(self, f)
	}
}

/// Exclusive connection to one printer.
///
/// The protocol is half-duplex, so every operation blocks until the printer answered
/// or the configured timeouts ran out.
pub struct Session {
	backend: Box<dyn Backend>,
	identity: Option<DeviceIdentity>,
	config: SessionConfig,
	state: SessionState,
	last_status: Option<Status>,
}

impl Session {
	/// Construct a new session using `backend` as it's [`Backend`].
	pub fn new(backend: impl Backend + 'static, config: SessionConfig) -> Self {
		Self {
			backend: Box::new(backend),
			identity: None,
			config,
			state: SessionState::Idle,
			last_status: None,
		}
	}

	/// Open the printer found by [`discover()`](crate::discover).
	#[cfg(feature = "usb")]
	pub fn open(identity: &DeviceIdentity, config: SessionConfig) -> Result<Self> {
		let backend = crate::UsbBackend::open(identity)?;
		let mut session = Self::new(backend, config);
		session.identity = Some(identity.clone());
		Ok(session)
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	/// The printer this session talks to, unknown for sessions made with [`Session::new()`].
	pub fn identity(&self) -> Option<&DeviceIdentity> {
		self.identity.as_ref()
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// The most recent status the printer sent.
	pub fn last_status(&self) -> Option<&Status> {
		self.last_status.as_ref()
	}

	/// Abandon whatever the printer was doing and bring it back to its initial state.
	///
	/// The printer has no way to cancel a command sequence, this is the only way out.
	pub fn reset(&mut self) -> Result<()> {
		self.guard(Self::reinitialize)
	}

	/// Query the printer's status.
	pub fn status(&mut self) -> Result<Status> {
		self.guard(Self::query_status)
	}

	/// Print `job` and wait until the printer is done with it.
	pub fn print(&mut self, job: PrintJob) -> Result<()> {
		self.guard(|s| s.print_job(job))
	}

	fn guard<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
		let result = f(self);
		if let Err(e) = &result {
			log::debug!("session failed in state {}: {e}", self.state);
			self.transition(SessionState::Error);
		}
		result
	}

	fn transition(&mut self, state: SessionState) {
		if self.state != state {
			log::debug!("session: {} -> {state}", self.state);
			self.state = state;
		}
	}

	fn reinitialize(&mut self) -> Result<()> {
		self.send(&cmd::invalidate())?;
		self.send(&cmd::initialize())?;
		self.transition(SessionState::Idle);
		Ok(())
	}

	fn query_status(&mut self) -> Result<Status> {
		self.reinitialize()?;

		let retries = self.config.status_retries.max(1);
		for attempt in 1..=retries {
			self.send(&cmd::status_request())?;
			match self.recv_status() {
				Ok(Some(status)) => {
					log::debug!("status: {:?}, media {}mm {}", status.status_type, status.media_width, status.media_type);
					self.last_status = Some(status.clone());
					self.transition(SessionState::StatusQueried);
					return Ok(status);
				},
				Ok(None) => log::warn!("no status reply (attempt {attempt}/{retries})"),
				Err(Error::Protocol(e @ (ProtocolError::ShortRead { .. } | ProtocolError::BadHeader { .. }))) => {
					log::warn!("{e} (attempt {attempt}/{retries})");
				},
				Err(e) => return Err(e),
			}
		}

		Err(ProtocolError::Timeout { attempts: retries }.into())
	}

	fn print_job(&mut self, job: PrintJob) -> Result<()> {
		let status = self.query_status()?;
		match status.media_type {
			MediaType::NoMedia => return Err(Error::NoMedia),
			MediaType::IncompatibleTape => return Err(Error::IncompatibleMedia),
			_ => {},
		}

		if status.is_blocked() {
			return Err(Error::DeviceError {
				error_1: status.error_1,
				error_2: status.error_2,
			});
		} else if status.has_errors() {
			log::warn!("printing despite {:?} {:?}", status.error_1, status.error_2);
		}

		if status.media_width != job.tape().category() {
			return Err(Error::TapeMismatch {
				loaded: status.media_width,
				job: job.tape(),
			});
		}

		log::info!("printing {job:?}");

		let setup = [
			cmd::enter_raster_mode(),
			cmd::enable_status_push(),
			cmd::print_information(job.len() as u32),
			cmd::set_mode(job.mode()),
			cmd::set_advanced_mode(),
			cmd::margin_amount(job.margin()),
			cmd::set_compression_mode(),
		];
		for command in &setup {
			self.send(command)?;
		}
		self.transition(SessionState::Configured);

		self.transition(SessionState::Streaming);
		for line in job.into_lines() {
			self.send(&cmd::raster_data(line))?;
		}

		self.send(&cmd::print_and_feed())?;
		self.transition(SessionState::AwaitingCompletion);

		self.await_completion()
	}

	fn await_completion(&mut self) -> Result<()> {
		let attempts = self.config.poll_attempts.max(1);
		let mut empty = 0;

		loop {
			let Some(status) = self.recv_status()? else {
				empty += 1;
				if empty >= attempts {
					return Err(ProtocolError::Timeout { attempts }.into());
				}
				std::thread::sleep(self.config.poll_interval);
				continue;
			};

			empty = 0;
			log::debug!("status: {:?}, phase {:?}", status.status_type, status.phase());
			let status_type = status.status_type;
			let (error_1, error_2) = (status.error_1, status.error_2);
			self.last_status = Some(status);

			match status_type {
				StatusType::PrintingCompleted => break,
				StatusType::ErrorOccurred => return Err(Error::DeviceError { error_1, error_2 }),
				StatusType::TurnedOff => return Err(Error::PoweredOff),
				_ => {},
			}
		}

		// The printer follows up with a phase change back to editing.
		match self.recv_status() {
			Ok(Some(status)) => {
				log::debug!("trailing status: {:?}, phase {:?}", status.status_type, status.phase());
				self.last_status = Some(status);
			},
			Ok(None) => log::debug!("no trailing status after completion"),
			Err(e) => log::warn!("ignoring trailing status: {e}"),
		}

		self.transition(SessionState::Completed);
		Ok(())
	}

	/// Write all of `buf`, a transfer that accepts nothing is fatal.
	fn send(&mut self, buf: &[u8]) -> Result<()> {
		log::trace!("send({}): {buf:02x?}", buf.len());

		let mut written = 0;
		while written < buf.len() {
			let n = self.backend.send(&buf[written..], self.config.write_timeout)?;
			if n == 0 {
				return Err(Error::WriteStalled {
					written,
					expected: buf.len(),
				});
			}
			written += n.min(buf.len() - written);
		}

		Ok(())
	}

	/// Read one status reply, assembling it from partial reads.
	///
	/// `Ok(None)` means the printer had nothing to say.
	fn recv_status(&mut self) -> Result<Option<Status>> {
		let mut buf = [0u8; Status::LEN];
		let mut filled = 0;

		while filled < buf.len() {
			let n = match self.backend.recv(&mut buf[filled..], self.config.read_timeout) {
				Ok(n) => n.min(buf.len() - filled),
				Err(TransportError::Timeout) => 0,
				Err(e) => return Err(e.into()),
			};
			if n == 0 {
				break;
			}

			log::trace!("recv({n}): {:02x?}", &buf[filled..filled + n]);
			filled += n;
		}

		match filled {
			0 => Ok(None),
			n => Ok(Some(parse_status(&buf[..n])?)),
		}
	}
}
