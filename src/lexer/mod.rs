// Modules --------------------------------------------------------------------
mod scan;
mod token;


// Exports --------------------------------------------------------------------
pub use self::token::{Token, TokenKind};


// Internal Dependencies ------------------------------------------------------
use crate::error::PreprocError;
use crate::fileline::FileLine;


// Types ----------------------------------------------------------------------
/// Scanner start conditions. `Initial` sits at the bottom of the condition
/// stack and is never popped; the driver pushes the others around define
/// bodies, argument collection and `<...>` include filenames.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StartCondition {
    Initial,
    DefForm,
    DefValue,
    DefArg,
    IncFilename
}

/// One scan buffer. Buffers stack within a lexer: the top buffer is consumed
/// first, which is what makes unput re-injection work.
struct ScanBuffer {
    chars: Vec<char>,
    pos: usize
}

impl ScanBuffer {

    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn remaining(&self) -> usize {
        self.chars.len() - self.pos
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.chars.len()
    }

}


// Lexer Implementation -------------------------------------------------------
/// One lexer per open file. Holds the buffer stack, the start-condition
/// stack and the accumulators the driver reads back out (`def_value` for
/// define bodies and collected argument text, `paren_level` for argument
/// nesting). Lexers themselves stack across include boundaries; that outer
/// stack lives on the driver.
pub struct Lexer {
    buffers: Vec<ScanBuffer>,
    conditions: Vec<StartCondition>,
    fileline: FileLine,
    def_value: String,
    paren_level: usize,
    enter_exit: usize,
    pedantic: bool,
    pending_errors: Vec<PreprocError>
}

impl Lexer {

    pub fn new(fileline: FileLine, pedantic: bool) -> Self {
        Self {
            buffers: Vec::with_capacity(4),
            conditions: vec![StartCondition::Initial],
            fileline,
            def_value: String::new(),
            paren_level: 0,
            enter_exit: 0,
            pedantic,
            pending_errors: Vec::new()
        }
    }

    pub fn fileline(&self) -> &FileLine {
        &self.fileline
    }

    /// Pushes text to be scanned before anything already buffered. This is
    /// the unput mechanism: expansion results re-enter the scanner here.
    pub fn scan_bytes(&mut self, text: &str) {
        self.buffers.push(ScanBuffer::new(text));
    }

    /// Pushes text behind everything already buffered, used to load a fresh
    /// file in slabs that are consumed in order.
    pub fn scan_bytes_back(&mut self, text: &str) {
        self.buffers.insert(0, ScanBuffer::new(text));
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Discards the exhausted top buffer after an unput completes.
    pub fn pop_buffer(&mut self) {
        if self.buffers.len() > 1 {
            self.buffers.pop();
        }
    }

    pub fn push_state_def_form(&mut self) {
        self.def_value.clear();
        self.conditions.push(StartCondition::DefForm);
    }

    pub fn push_state_def_value(&mut self) {
        self.def_value.clear();
        self.conditions.push(StartCondition::DefValue);
    }

    pub fn push_state_def_arg(&mut self, paren_level: usize) {
        self.paren_level = paren_level;
        self.conditions.push(StartCondition::DefArg);
    }

    pub fn push_state_inc_filename(&mut self) {
        self.conditions.push(StartCondition::IncFilename);
    }

    /// Error recovery for the driver: drops a start condition the scanner
    /// will no longer terminate itself.
    pub fn pop_state(&mut self) {
        self.pop_condition();
    }

    pub fn take_def_value(&mut self) -> String {
        std::mem::take(&mut self.def_value)
    }

    pub fn append_def_value(&mut self, text: &str) {
        self.def_value.push_str(text);
    }

    pub fn paren_level(&self) -> usize {
        self.paren_level
    }

    pub fn set_paren_level(&mut self, level: usize) {
        self.paren_level = level;
    }

    /// Enter/exit level of the most recent `line directive.
    pub fn enter_exit(&self) -> usize {
        self.enter_exit
    }

    pub fn take_errors(&mut self) -> Vec<PreprocError> {
        std::mem::take(&mut self.pending_errors)
    }

    fn condition(&self) -> StartCondition {
        self.conditions.last().copied().unwrap_or(StartCondition::Initial)
    }

    fn pop_condition(&mut self) {
        if self.conditions.len() > 1 {
            self.conditions.pop();
        }
    }

}
