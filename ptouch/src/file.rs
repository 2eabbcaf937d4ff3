use std::{
	fs::{File, OpenOptions},
	io::{ErrorKind, Read, Write},
	path::{Path, PathBuf},
	time::Duration,
};

use crate::{error::TransportError, Backend};

/// A backend talking to a printer device node, like `/dev/usb/lp0`.
pub struct FileBackend {
	file: File,
	path: PathBuf,
}

impl FileBackend {
	/// Open a printer device node for reading and writing.
	///
	/// The node is opened non-blocking, transfers wait for it at most as long as their timeout.
	pub fn open(path: &Path) -> Result<Self, TransportError> {
		let mut options = OpenOptions::new();
		options.read(true).write(true);

		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;
			options.custom_flags(libc::O_NONBLOCK);
		}

		let file = options.open(path)?;
		log::debug!("opened {}", path.display());

		Ok(Self {
			file,
			path: path.to_path_buf(),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[derive(Clone, Copy)]
enum Ready {
	Read,
	Write,
}

/// Wait until the node is ready, `false` if `timeout` ran out first.
#[cfg(unix)]
fn wait(file: &File, ready: Ready, timeout: Duration) -> Result<bool, TransportError> {
	use std::os::unix::io::AsRawFd;

	let mut pfd = libc::pollfd {
		fd: file.as_raw_fd(),
		events: match ready {
			Ready::Read => libc::POLLIN,
			Ready::Write => libc::POLLOUT,
		},
		revents: 0,
	};
	let ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

	loop {
		let n = unsafe { libc::poll(&mut pfd, 1, ms) };
		if n >= 0 {
			if pfd.revents & libc::POLLNVAL != 0 {
				return Err(TransportError::Disconnected);
			}
			return Ok(n > 0);
		}

		let e = std::io::Error::last_os_error();
		if e.kind() != ErrorKind::Interrupted {
			return Err(e.into());
		}
	}
}

#[cfg(not(unix))]
fn wait(_file: &File, _ready: Ready, _timeout: Duration) -> Result<bool, TransportError> {
	Ok(true)
}

fn transfer_error(e: std::io::Error) -> TransportError {
	match e.kind() {
		ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout,
		ErrorKind::NotFound => TransportError::Disconnected,
		_ => e.into(),
	}
}

impl Backend for FileBackend {
	fn send(&mut self, buf: &[u8], timeout: Duration) -> Result<usize, TransportError> {
		if !wait(&self.file, Ready::Write, timeout)? {
			return Err(TransportError::Timeout);
		}

		let n = self.file.write(buf).map_err(transfer_error)?;
		self.file.flush().map_err(transfer_error)?;
		Ok(n)
	}

	fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, TransportError> {
		if !wait(&self.file, Ready::Read, timeout)? {
			return Err(TransportError::Timeout);
		}

		self.file.read(buf).map_err(transfer_error)
	}
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use std::{ffi::CString, os::unix::ffi::OsStrExt, time::Instant};

	/// A named pipe standing in for a printer that never answers on its own.
	struct Fifo(PathBuf);

	impl Fifo {
		fn new(name: &str) -> Self {
			let path = std::env::temp_dir().join(format!("ptouch-{name}-{}", std::process::id()));
			let _ = std::fs::remove_file(&path);

			let c = CString::new(path.as_os_str().as_bytes()).unwrap();
			assert_eq!(unsafe { libc::mkfifo(c.as_ptr(), 0o600) }, 0, "mkfifo {}", path.display());
			Self(path)
		}
	}

	impl Drop for Fifo {
		fn drop(&mut self) {
			let _ = std::fs::remove_file(&self.0);
		}
	}

	#[test]
	fn quiet_device_times_out() {
		let fifo = Fifo::new("quiet");
		let mut backend = FileBackend::open(&fifo.0).unwrap();

		let start = Instant::now();
		let result = backend.recv(&mut [0; 32], Duration::from_millis(100));

		assert!(matches!(result, Err(TransportError::Timeout)), "{result:?}");
		assert!(start.elapsed() >= Duration::from_millis(100));
		assert!(start.elapsed() < Duration::from_secs(2));
	}

	#[test]
	fn reads_pending_data() {
		let fifo = Fifo::new("pending");
		let mut backend = FileBackend::open(&fifo.0).unwrap();

		assert_eq!(backend.send(&[0x80, 0x20, 0x42], Duration::from_millis(100)).unwrap(), 3);

		let mut buf = [0; 32];
		let n = backend.recv(&mut buf, Duration::from_millis(100)).unwrap();
		assert_eq!(&buf[..n], [0x80, 0x20, 0x42]);

		let result = backend.recv(&mut buf, Duration::from_millis(10));
		assert!(matches!(result, Err(TransportError::Timeout)), "{result:?}");
	}
}
