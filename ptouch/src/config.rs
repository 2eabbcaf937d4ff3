use std::time::Duration;

/// Timeouts and retry budgets of a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
	/// Bound for a single write transfer.
	pub write_timeout: Duration,

	/// Bound for a single read transfer.
	pub read_timeout: Duration,

	/// How often a status request is sent before giving up, at least once.
	pub status_retries: u32,

	/// How many empty or timed out reads in a row are tolerated while waiting for the print to finish.
	pub poll_attempts: u32,

	/// Pause after an empty read.
	pub poll_interval: Duration,
}

impl SessionConfig {
	pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
		self.write_timeout = timeout;
		self
	}

	pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
		self.read_timeout = timeout;
		self
	}

	/// Set both transfer timeouts.
	pub fn with_timeout(self, timeout: Duration) -> Self {
		self
			.with_write_timeout(timeout)
			.with_read_timeout(timeout)
	}

	pub fn with_status_retries(mut self, retries: u32) -> Self {
		self.status_retries = retries.max(1);
		self
	}

	pub fn with_poll_attempts(mut self, attempts: u32) -> Self {
		self.poll_attempts = attempts.max(1);
		self
	}

	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;
		self
	}
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			write_timeout: Duration::from_secs(15),
			read_timeout: Duration::from_secs(15),
			status_retries: 3,
			poll_attempts: 20,
			poll_interval: Duration::from_millis(100),
		}
	}
}
