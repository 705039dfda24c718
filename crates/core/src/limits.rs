//! Size limits of the agent protocol
//!
//! The agent rejects any message whose encoded line exceeds 128 KiB − 1
//! bytes. Configured limits above that ceiling are silently reduced to it.

/// Absolute ceiling on one encoded record line, in bytes
pub const MAX_RECORD_SIZE: usize = 128 * 1024 - 1;

/// Clamp a configured record size limit to the protocol ceiling
#[inline]
pub fn clamp_record_size(configured: usize) -> usize {
    configured.min(MAX_RECORD_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_value() {
        assert_eq!(MAX_RECORD_SIZE, 131_071);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_record_size(100), 100);
        assert_eq!(clamp_record_size(MAX_RECORD_SIZE), MAX_RECORD_SIZE);
        assert_eq!(clamp_record_size(MAX_RECORD_SIZE + 1), MAX_RECORD_SIZE);
        assert_eq!(clamp_record_size(usize::MAX), MAX_RECORD_SIZE);
    }
}
