//! Terminal control sequence stripping.
//!
//! Device PTYs interleave command output with CSI sequences (cursor movement,
//! screen clears, colours) and DEC private-mode toggles such as bracketed
//! paste (`ESC[?2004h`), cursor visibility (`ESC[?25l`), autowrap
//! (`ESC[?7h`) and application keypad. All of them are removed before any
//! pattern matching happens.
//!
//! Parsing is done with `vte`, so a sequence split across two reads is still
//! recognised when the same [`Sanitizer`] sees both halves.

use vte::{Parser, Perform};

/// Strip control sequences from a complete chunk of output.
///
/// Printable text, newlines, carriage returns and tabs are kept; every escape
/// sequence and every other C0 control byte is dropped. The function is pure
/// and idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &[u8]) -> Vec<u8> {
    let mut sanitizer = Sanitizer::new();
    sanitizer.push(raw)
}

/// Lossy string convenience wrapper around [`sanitize`].
pub fn sanitize_str(raw: &str) -> String {
    String::from_utf8_lossy(&sanitize(raw.as_bytes())).into_owned()
}

/// Streaming sanitizer that keeps parser state between chunks.
pub struct Sanitizer {
    parser: Parser,
}

impl Sanitizer {
    /// Create a sanitizer in the ground state.
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Feed a chunk and return the clean bytes it produced.
    ///
    /// An incomplete trailing sequence is held in the parser and completed
    /// (and discarded) by the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(chunk.len());
        let mut collector = Collector { out: &mut out };
        self.parser.advance(&mut collector, chunk);
        out
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sanitizer").finish_non_exhaustive()
    }
}

struct Collector<'a> {
    out: &'a mut Vec<u8>,
}

impl Perform for Collector<'_> {
    fn print(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_csi_colour() {
        assert_eq!(sanitize(b"\x1b[32mGreen text\x1b[0m"), b"Green text");
    }

    #[test]
    fn test_strips_dec_private_modes() {
        let raw = b"\x1b[?2004hA:srl1# \x1b[?25l\x1b[?12h\x1b[?7lshow\x1b[?2004l\r\n";
        assert_eq!(sanitize(raw), b"A:srl1# show\r\n");
    }

    #[test]
    fn test_strips_cursor_movement_and_clear() {
        let raw = b"\x1b[2J\x1b[H\x1b[1;1Hadmin@vmx>\x1b[K ";
        assert_eq!(sanitize(raw), b"admin@vmx> ");
    }

    #[test]
    fn test_keeps_line_structure() {
        assert_eq!(sanitize(b"a\r\nb\tc\n"), b"a\r\nb\tc\n");
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut sanitizer = Sanitizer::new();
        let mut out = sanitizer.push(b"RP/0/RP0/CPU0:R1\x1b[?20");
        out.extend(sanitizer.push(b"04l#"));
        assert_eq!(out, b"RP/0/RP0/CPU0:R1#");
    }

    #[test]
    fn test_clean_input_untouched() {
        let clean = "Physical interface: ge-0/0/0, Enabled\n";
        assert_eq!(sanitize_str(clean), clean);
    }

    fn control_sequence() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            "[0-9;]{0,6}[A-Za-z]".prop_map(|s| format!("\x1b[{s}").into_bytes()),
            prop::sample::select(vec!["2004", "25", "12", "7", "1"])
                .prop_flat_map(|mode| {
                    prop::sample::select(vec!['h', 'l'])
                        .prop_map(move |flag| format!("\x1b[?{mode}{flag}").into_bytes())
                }),
        ]
    }

    proptest! {
        #[test]
        fn prop_removes_sequences_and_is_idempotent(
            parts in prop::collection::vec(("[ -~\n]{0,12}", control_sequence()), 0..8)
        ) {
            let mut raw = Vec::new();
            let mut expected = Vec::new();
            for (text, seq) in &parts {
                raw.extend_from_slice(text.as_bytes());
                raw.extend_from_slice(seq);
                expected.extend_from_slice(text.as_bytes());
            }

            let once = sanitize(&raw);
            prop_assert!(!once.contains(&0x1b));
            prop_assert_eq!(&once, &expected);
            prop_assert_eq!(sanitize(&once), once);
        }
    }
}
