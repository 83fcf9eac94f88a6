use std::fmt;

/// Location in the parsed input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Line number, starting at 1
    pub line: usize,

    /// Column number, in code points, starting at 1 (a newline character sits at column 0 of the next line)
    pub col: usize,

    /// Byte offset, starting at 0
    pub offset: usize,
}

impl Position {
    /// Position before the first code point has been read
    pub(crate) fn start() -> Self {
        Self {
            line: 1,
            col: 0,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{} ({})", self.line, self.col, self.offset)
    }
}

/// Snapshot of the cursor, used to backtrack
///
/// It holds the position along with the code point found there and its width in bytes.
/// A width of 0 means the end of the input was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Savepoint {
    pub(crate) position: Position,
    pub(crate) rune: char,
    pub(crate) width: usize,
}

impl Savepoint {
    pub(crate) fn start() -> Self {
        Self {
            position: Position::start(),
            rune: char::REPLACEMENT_CHARACTER,
            width: 0,
        }
    }

    /// Is the cursor at the end of the input?
    pub(crate) fn at_eof(&self) -> bool {
        self.width == 0
    }

    /// Does the cursor sit on a byte which isn't valid UTF-8?
    pub(crate) fn at_invalid_byte(&self) -> bool {
        self.width == 1 && self.rune == char::REPLACEMENT_CHARACTER
    }

    /// Move over the current code point
    pub(crate) fn advance(&mut self, input: &[u8]) {
        self.position.offset += self.width;

        let (rune, width) = decode_rune(&input[self.position.offset..]);
        self.rune = rune;
        self.width = width;

        self.position.col += 1;

        if rune == '\n' {
            self.position.line += 1;
            self.position.col = 0;
        }
    }
}

/// Decode the first code point of a byte slice
///
/// Returns the replacement character with a width of 0 for an empty slice,
/// and with a width of 1 for a byte which doesn't start a valid UTF-8 sequence.
pub(crate) fn decode_rune(bytes: &[u8]) -> (char, usize) {
    if bytes.is_empty() {
        return (char::REPLACEMENT_CHARACTER, 0);
    }

    let head = &bytes[..bytes.len().min(4)];

    let valid = match std::str::from_utf8(head) {
        Ok(valid) => valid,
        Err(err) => std::str::from_utf8(&head[..err.valid_up_to()]).unwrap_or_default(),
    };

    match valid.chars().next() {
        Some(c) => (c, c.len_utf8()),
        None => (char::REPLACEMENT_CHARACTER, 1),
    }
}
