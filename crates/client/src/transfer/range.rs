//! Byte-range planning for resumable downloads

/// Next action for a partially downloaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RangePlan {
    /// Local length equals remote length; nothing left to fetch
    Complete,
    /// Local file is longer than the remote object; it was taken from an
    /// older, larger generation of the object and must be discarded
    Stale,
    /// Fetch the half-open window `[start, end)` and append it
    Fetch { start: u64, end: u64 },
}

/// Compute the next byte range for a download
///
/// The window starts at the current on-disk length and spans at most
/// `part_size` bytes, clipped so it never runs past the remote length.
pub(crate) fn next_range(remote_len: u64, local_len: u64, part_size: u64) -> RangePlan {
    if local_len == remote_len {
        return RangePlan::Complete;
    }
    if local_len > remote_len {
        return RangePlan::Stale;
    }

    RangePlan::Fetch {
        start: local_len,
        end: remote_len.min(local_len.saturating_add(part_size)),
    }
}
