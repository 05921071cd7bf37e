//! Countdown bound to the offer currently on display.
//!
//! The timer is a pure state machine; the engine loop drives it with one
//! `tick` per second. The controller owns exactly one instance, which is
//! what guarantees a single running countdown system-wide: arming it for a
//! new head implicitly cancels whatever was running before.

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
	/// No countdown is running.
	Idle,
	/// Still counting; `remaining` seconds left.
	Running { remaining: u32 },
	/// Reached zero; the displayed offer must be auto-rejected.
	Expired,
}

#[derive(Debug, Default)]
pub struct Countdown {
	remaining: u32,
	active: bool,
}

impl Countdown {
	pub fn new() -> Self {
		Self::default()
	}

	/// Arm the countdown at `seconds`, cancelling any running countdown.
	pub fn start(&mut self, seconds: u32) {
		self.remaining = seconds;
		self.active = true;
	}

	/// Disarm without expiring; no auto-reject will fire.
	pub fn cancel(&mut self) {
		self.active = false;
		self.remaining = 0;
	}

	/// Advance by one second.
	///
	/// Reports [`Tick::Expired`] exactly once per armed countdown; the timer
	/// is idle afterwards.
	pub fn tick(&mut self) -> Tick {
		if !self.active {
			return Tick::Idle;
		}

		self.remaining = self.remaining.saturating_sub(1);
		if self.remaining == 0 {
			self.active = false;
			Tick::Expired
		} else {
			Tick::Running {
				remaining: self.remaining,
			}
		}
	}

	pub fn is_active(&self) -> bool {
		self.active
	}

	pub fn remaining_seconds(&self) -> u32 {
		self.remaining
	}
}
