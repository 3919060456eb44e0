//! Percentage progress over a byte stream of known length.

/// Turns a running byte count into a deduplicated, non-decreasing percentage stream.
#[derive(Debug)]
pub struct ProgressTracker {
    total: Option<u64>,
    downloaded: u64,
    last_emitted: Option<u8>,
}

impl ProgressTracker {
    /// `total` is the declared content length. `None` or zero disables reporting.
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|&t| t > 0),
            downloaded: 0,
            last_emitted: None,
        }
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// Record `bytes` more and return the percentage if it should be emitted.
    ///
    /// A value is returned only when it is strictly greater than the last one returned.
    /// The first value is always returned. Values are capped at 100 when the server
    /// sends more than it declared.
    pub fn advance(&mut self, bytes: u64) -> Option<u8> {
        self.downloaded += bytes;
        let total = self.total?;

        let percent = (self.downloaded.saturating_mul(100) / total).min(100) as u8;
        match self.last_emitted {
            Some(last) if percent <= last => None,
            _ => {
                self.last_emitted = Some(percent);
                Some(percent)
            }
        }
    }
}
