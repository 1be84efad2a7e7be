//! Time conversion helpers

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a `chrono::Duration` into fractional seconds.
///
/// Returns `None` if the duration is too large to be represented in
/// microseconds.
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_microseconds()
        .map(|us| (us as f64) * 1e-6)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::seconds(2)),
            Some(2.0)
        );
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }
}
