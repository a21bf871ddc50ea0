//! Accumulation buffer and completion anchors.
//!
//! Every chunk read from the device is sanitized before it lands in the
//! buffer, so anchors are always matched against clean text. Single-shot
//! anchors only re-scan the region that could contain a new match (the
//! scrapli tail-search trick); counted anchors scan the whole buffer.

use std::ops::Range;

use regex::bytes::Regex;

use super::sanitize::Sanitizer;

/// The pattern whose appearance signals that a command has finished, and how
/// many times it must appear.
#[derive(Debug, Clone)]
pub struct Anchor {
    pattern: Regex,
    occurrences: usize,
}

impl Anchor {
    /// Create an anchor that completes on the `occurrences`-th match.
    ///
    /// An occurrence count of zero is treated as one.
    pub fn new(pattern: Regex, occurrences: usize) -> Self {
        Self {
            pattern,
            occurrences: occurrences.max(1),
        }
    }

    /// Compile a regex anchor.
    pub fn compile(pattern: &str, occurrences: usize) -> Result<Self, regex::Error> {
        Ok(Self::new(Regex::new(pattern)?, occurrences))
    }

    /// Anchor on a literal string (e.g. a discovered prompt), matched once.
    pub fn literal(text: &str) -> Result<Self, regex::Error> {
        Self::compile(&regex::escape(text), 1)
    }

    /// The underlying regex.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Number of matches required for completion.
    pub fn occurrences(&self) -> usize {
        self.occurrences
    }

    /// Count non-overlapping matches in `data`, stopping at the required number.
    pub fn count(&self, data: &[u8]) -> usize {
        self.pattern
            .find_iter(data)
            .take(self.occurrences)
            .count()
    }

    /// Byte range of the match that completes the anchor, if present.
    pub fn completion(&self, data: &[u8]) -> Option<Range<usize>> {
        self.pattern
            .find_iter(data)
            .nth(self.occurrences - 1)
            .map(|m| m.range())
    }

    /// Whether `data` holds enough matches to complete.
    pub fn is_satisfied(&self, data: &[u8]) -> bool {
        self.count(data) >= self.occurrences
    }
}

/// Buffer for accumulating sanitized output and checking anchors.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated, sanitized output.
    buffer: Vec<u8>,

    /// Streaming sanitizer; keeps state for sequences split across reads.
    sanitizer: Sanitizer,

    /// How far back from the previously checked end a single-shot anchor is
    /// re-searched, so matches straddling two reads are not missed.
    search_depth: usize,

    /// Buffer length at the last anchor check.
    checked: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            sanitizer: Sanitizer::new(),
            search_depth,
            checked: 0,
        }
    }

    /// Sanitize a raw chunk and append it.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = self.sanitizer.push(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Check whether the anchor is complete, scanning only what is needed.
    pub fn check(&mut self, anchor: &Anchor) -> bool {
        let satisfied = if anchor.occurrences() == 1 {
            let start = self.checked.saturating_sub(self.search_depth);
            anchor.pattern().find_at(&self.buffer, start).is_some()
        } else {
            anchor.is_satisfied(&self.buffer)
        };
        self.checked = self.buffer.len();
        satisfied
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.checked = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_slice(), b"Green text");
    }

    #[test]
    fn test_prompt_hidden_by_split_sequence() {
        let mut buffer = PatternBuffer::new(100);
        let anchor = Anchor::literal("A:router#").unwrap();

        buffer.extend(b"output\r\nA:rou\x1b[");
        assert!(!buffer.check(&anchor));

        buffer.extend(b"?25hter# ");
        assert!(buffer.check(&anchor));
    }

    #[test]
    fn test_single_anchor_spanning_reads() {
        let mut buffer = PatternBuffer::new(20);
        let anchor = Anchor::literal("router#").unwrap();

        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nrout");
        assert!(!buffer.check(&anchor));

        buffer.extend(b"er#");
        assert!(buffer.check(&anchor));
    }

    #[test]
    fn test_single_anchor_at_start_of_large_chunk() {
        let mut buffer = PatternBuffer::new(10);
        let anchor = Anchor::literal("router#").unwrap();

        let mut chunk = b"router#".to_vec();
        chunk.extend_from_slice(&[b'x'; 500]);
        buffer.extend(&chunk);
        assert!(buffer.check(&anchor));
    }

    #[test]
    fn test_counted_anchor_requires_all_occurrences() {
        let anchor = Anchor::compile(r"\[edit\]|commit complete", 4).unwrap();
        let mut buffer = PatternBuffer::new(1000);

        buffer.extend(b"configure\nEntering configuration mode\n\n[edit]\nadmin@vmx# ");
        assert!(!buffer.check(&anchor));
        buffer.extend(b"set system host-name r1\n\n[edit]\nadmin@vmx# ");
        assert!(!buffer.check(&anchor));
        buffer.extend(b"commit\ncommit complete\n");
        assert_eq!(anchor.count(buffer.as_slice()), 3);
        assert!(!buffer.check(&anchor));
        buffer.extend(b"\n[edit]\nadmin@vmx# ");
        assert!(buffer.check(&anchor));
    }

    #[test]
    fn test_completion_range_is_nth_match() {
        let anchor = Anchor::compile("#", 2).unwrap();
        assert_eq!(anchor.completion(b"a#b#c#"), Some(3..4));
        assert_eq!(anchor.completion(b"a#b"), None);
    }

    #[test]
    fn test_zero_occurrences_means_one() {
        let anchor = Anchor::compile(">", 0).unwrap();
        assert_eq!(anchor.occurrences(), 1);
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), b"test data");
        assert!(buffer.is_empty());
    }
}
