//! Accumulator for `;`-delimited text fields

/// Collects the lines of one multi-line text value.
///
/// Lines are joined with `\n`; trailing whitespace before the closing `;`
/// is dropped when the value is finished.
#[derive(Debug, Default)]
pub struct ValueBuffer {
    text: String,
    open: bool,
    start_line: u32,
}

impl ValueBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a value with the text that followed the opening `;`
    pub fn begin(&mut self, first_line: &str, line: u32) {
        self.text.clear();
        self.text.push_str(first_line);
        self.open = true;
        self.start_line = line;
    }

    pub fn push_line(&mut self, line: &str) {
        self.text.push('\n');
        self.text.push_str(line);
    }

    /// Close the value and hand it out, leaving the buffer empty
    pub fn finish(&mut self) -> String {
        self.open = false;
        let trimmed = self.text.trim_end().len();
        self.text.truncate(trimmed);
        std::mem::take(&mut self.text)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Line of the opening `;`
    pub fn start_line(&self) -> u32 {
        self.start_line
    }
}
