//! UID generation for objects this tool creates.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a UID under the 2.25 (UUID-derived) arc.
///
/// Uniqueness comes from wall-clock nanoseconds, the process id, and a
/// process-wide counter; the result stays within the 64-character UID limit.
pub fn new_uid() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("2.25.{}.{}.{}", nanos, process::id(), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_unique_and_bounded() {
        let a = new_uid();
        let b = new_uid();
        assert_ne!(a, b);
        assert!(a.starts_with("2.25."));
        assert!(a.len() <= 64);
    }
}
