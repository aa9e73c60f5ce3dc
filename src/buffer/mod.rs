//! Buffering of console output between matches

use bytes::{Buf, BytesMut};

/// When the search window overflows, the oldest `1 / SPILL_RATIO` of it is
/// moved out of the window.
const SPILL_RATIO: usize = 3;

/// Output received from the remote side that has not been consumed by a match yet.
///
/// Patterns are searched in a window of at most `max_size` bytes at the tail of
/// the output. Text pushed out of the window is kept aside and still becomes
/// part of the before-text of the next match, so no output is ever lost.
/// Everything up to the end of a match is removed when the match is taken, so
/// [`unread`](OutputBuffer::unread) is always the searchable text seen since
/// the last consumption point.
pub struct OutputBuffer {
    window: BytesMut,
    spilled: BytesMut,
    max_size: usize,
}

impl OutputBuffer {
    /// Create an empty buffer searching at most `max_size` bytes
    pub fn new(max_size: usize) -> Self {
        Self {
            window: BytesMut::with_capacity(max_size),
            spilled: BytesMut::new(),
            max_size: max_size.max(1),
        }
    }

    /// Append freshly read output
    pub fn append(&mut self, data: &[u8]) {
        if self.window.len() + data.len() > self.max_size {
            self.compact(data.len());
        }

        // A single chunk larger than the whole window only keeps its tail searchable
        let data = if data.len() > self.max_size {
            let (head, tail) = data.split_at(data.len() - self.max_size);
            self.spilled.extend_from_slice(head);
            tail
        } else {
            data
        };

        self.window.extend_from_slice(data);
    }

    /// Searchable bytes seen since the last consumption point
    pub fn unread(&self) -> &[u8] {
        &self.window
    }

    /// Consume the buffer through `end` of the window, splitting it into the
    /// text before `start` (including spilled text) and the matched text
    /// `start..end`.
    pub fn take_match(&mut self, start: usize, end: usize) -> (String, String) {
        let end = end.min(self.window.len());
        let start = start.min(end);

        let mut consumed = self.window.split_to(end);
        let mut before = self.spilled.split();
        before.extend_from_slice(&consumed.split_to(start));

        (
            String::from_utf8_lossy(&before).into_owned(),
            String::from_utf8_lossy(&consumed).into_owned(),
        )
    }

    /// Consume everything, returning it as text
    pub fn take_all(&mut self) -> String {
        let mut all = self.spilled.split();
        all.extend_from_slice(&self.window.split());
        String::from_utf8_lossy(&all).into_owned()
    }

    /// Number of searchable unread bytes
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether there is no unread output at all
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty() && self.spilled.is_empty()
    }

    /// Unread bytes held outside the search window
    pub fn spilled(&self) -> usize {
        self.spilled.len()
    }

    fn compact(&mut self, incoming: usize) {
        let overflow = (self.window.len() + incoming).saturating_sub(self.max_size);
        let amount = overflow
            .max(self.max_size / SPILL_RATIO)
            .min(self.window.len());

        if amount > 0 {
            self.spilled.extend_from_slice(&self.window[..amount]);
            self.window.advance(amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer() {
        let buffer = OutputBuffer::new(1024);
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.spilled(), 0);
    }

    #[test]
    fn test_multiple_appends() {
        let mut buffer = OutputBuffer::new(1024);
        buffer.append(b"Infoblox ");
        buffer.append(b">");
        assert_eq!(buffer.unread(), b"Infoblox >");
    }

    #[test]
    fn test_take_match_splits_before_and_matched() {
        let mut buffer = OutputBuffer::new(1024);
        buffer.append(b"Last login: today\nInfoblox > rest");

        let (before, matched) = buffer.take_match(27, 28);
        assert_eq!(before, "Last login: today\nInfoblox ");
        assert_eq!(matched, ">");
        assert_eq!(buffer.unread(), b" rest");
    }

    #[test]
    fn test_take_match_clamps_out_of_range() {
        let mut buffer = OutputBuffer::new(1024);
        buffer.append(b"short");

        let (before, matched) = buffer.take_match(3, 100);
        assert_eq!(before, "sho");
        assert_eq!(matched, "rt");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_take_all() {
        let mut buffer = OutputBuffer::new(1024);
        buffer.append(b"Connection closed by remote host");

        assert_eq!(buffer.take_all(), "Connection closed by remote host");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_compaction_spills_oldest() {
        let mut buffer = OutputBuffer::new(90);
        buffer.append(b"0123456789".repeat(5).as_slice());
        buffer.append(b"ABCDEFGHIJ".repeat(5).as_slice());

        assert!(buffer.len() <= 90);
        assert!(buffer.unread().ends_with(b"ABCDEFGHIJ"));
        assert_eq!(buffer.spilled() + buffer.len(), 100);
    }

    #[test]
    fn test_oversized_chunk_keeps_tail_searchable() {
        let mut buffer = OutputBuffer::new(8);
        buffer.append(b"0123456789>");

        assert_eq!(buffer.unread(), b"3456789>");
        assert_eq!(buffer.spilled(), 3);
    }

    #[test]
    fn test_spilled_text_stays_in_before() {
        let mut buffer = OutputBuffer::new(16);
        let body: String = (0..20).map(|i| format!("line {i:02}\n")).collect();
        for chunk in body.as_bytes().chunks(5) {
            buffer.append(chunk);
        }
        buffer.append(b"Infoblox >");

        let end = buffer.len();
        let (before, matched) = buffer.take_match(end - 1, end);
        assert_eq!(before, format!("{body}Infoblox "));
        assert_eq!(matched, ">");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_take_all_includes_spilled() {
        let mut buffer = OutputBuffer::new(4);
        buffer.append(b"Connection ");
        buffer.append(b"closed");

        assert_eq!(buffer.take_all(), "Connection closed");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut buffer = OutputBuffer::new(64);
        buffer.append(&[b'o', b'k', 0xFF, b'>']);

        let (before, matched) = buffer.take_match(3, 4);
        assert_eq!(before, "ok\u{FFFD}");
        assert_eq!(matched, ">");
    }
}
