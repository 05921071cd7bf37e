//! Common identifier and time types used throughout the dispatch core.

/// Backend-assigned order identifier.
pub type OrderId = u64;

/// Backend-assigned delivery worker identifier.
pub type WorkerId = u64;

/// Timestamp (Unix seconds)
pub type Timestamp = u64;

/// Current wall-clock time as Unix seconds.
pub fn now() -> Timestamp {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_now_is_monotonic_enough() {
		let a = now();
		let b = now();
		assert!(b >= a);
		// Sanity: later than 2020-01-01.
		assert!(a > 1_577_836_800);
	}
}
