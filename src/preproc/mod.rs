// STD Dependencies -----------------------------------------------------------
use std::mem;
use std::path::Path;


// Modules --------------------------------------------------------------------
mod subst;


// Exports --------------------------------------------------------------------
pub use self::subst::{define_subst, trim_whitespace, DefRef};


// Internal Dependencies ------------------------------------------------------
use crate::error::PreprocError;
use crate::fileline::FileLine;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::traits::{KeepComments, PreprocHost};
use crate::{DEFINE_RECURSION_LEVEL_MAX, INCLUDE_DEPTH_MAX, SCAN_SLAB_SIZE};


// Parser States --------------------------------------------------------------
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ProcState {
    Top,
    DefNameUndef,
    DefNameDefine,
    DefNameIfdef,
    DefNameIfndef,
    DefNameElsif,
    DefForm,
    DefValue,
    DefParen,
    DefArg,
    IncName,
    ErrorName
}

impl ProcState {
    fn name(self) -> &'static str {
        match self {
            ProcState::Top => "TOP",
            ProcState::DefNameUndef => "DEFNAME_UNDEF",
            ProcState::DefNameDefine => "DEFNAME_DEFINE",
            ProcState::DefNameIfdef => "DEFNAME_IFDEF",
            ProcState::DefNameIfndef => "DEFNAME_IFNDEF",
            ProcState::DefNameElsif => "DEFNAME_ELSIF",
            ProcState::DefForm => "DEFFORM",
            ProcState::DefValue => "DEFVALUE",
            ProcState::DefParen => "DEFPAREN",
            ProcState::DefArg => "DEFARG",
            ProcState::IncName => "INCNAME",
            ProcState::ErrorName => "ERRORNAME"
        }
    }
}

/// One pending `ifdef / `ifndef. `ever_on` latches once any branch of the
/// chain has been taken, which is what suppresses later `elsif / `else arms.
#[derive(Debug, Clone, Copy)]
struct IfEntry {
    on: bool,
    ever_on: bool
}

impl IfEntry {
    fn new(on: bool, ever_on: bool) -> Self {
        Self {
            on,
            ever_on: ever_on || on
        }
    }
}


// Preprocessor Implementation -------------------------------------------------
/// The driver: pulls tokens from the scanner, interprets directives, expands
/// macro references and produces the output character stream one line or
/// chunk at a time. Owns both LIFOs of the machine: the scanner's buffer
/// stack (inside each `Lexer`) and the include stack of suspended lexers.
pub struct Preprocessor<H: PreprocHost> {
    host: H,
    lexer: Option<Lexer>,
    include_stack: Vec<Lexer>,
    states: Vec<ProcState>,
    off: usize,
    last_sym: String,
    formals: String,
    line_cmt: String,
    line_cmt_nl: bool,
    line_add: usize,
    raw_at_bol: bool,
    def_refs: Vec<DefRef>,
    ifdef_stack: Vec<IfEntry>,
    def_depth: usize,
    line_chars: String,
    fileline: FileLine,
    debug: u8
}

impl<H: PreprocHost> Preprocessor<H> {

    pub fn new(host: H) -> Self {
        Self {
            host,
            lexer: None,
            include_stack: Vec::new(),
            states: vec![ProcState::Top],
            off: 0,
            last_sym: String::new(),
            formals: String::new(),
            line_cmt: String::new(),
            line_cmt_nl: false,
            line_add: 0,
            raw_at_bol: true,
            def_refs: Vec::new(),
            ifdef_stack: Vec::new(),
            def_depth: 0,
            line_chars: String::new(),
            fileline: FileLine::new("", 0),
            debug: 0
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn debug(&mut self, level: u8) {
        self.debug = level;
    }

    pub fn is_eof(&self) -> bool {
        self.lexer.is_none()
    }

    pub fn fileline(&self) -> FileLine {
        self.fileline.clone()
    }

    /// Injects text into the output stream ahead of the next token.
    pub fn insert_unreadback(&mut self, text: &str) {
        self.line_cmt.push_str(text);
    }

    /// Opens a source file, suspending the currently active one when there
    /// is one. The same file may be opened twice; only the include depth is
    /// bounded, since guard macros commonly prevent real recursion.
    pub fn open_file<P: AsRef<Path>>(&mut self, filename: P, fileline: Option<FileLine>) {
        if let Some(fileline) = fileline {
            self.fileline = fileline;
        }
        let parent = self.lexer.as_ref().map(|lexer| lexer.fileline().path().to_path_buf());
        let (path, contents) = match self.host.resolve_include(parent.as_deref(), filename.as_ref()) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.error(format!("File not found: {}", err.path.display()));
                return;
            }
        };
        if let Some(active) = self.lexer.take() {
            if self.include_stack.len() > INCLUDE_DEPTH_MAX {
                self.error(format!("Recursive inclusion of file: {}", path.display()));
                self.lexer = Some(active);
                return;
            }
            self.include_stack.push(active);
        }
        let mut lexer = Lexer::new(self.fileline.create(path), self.host.pedantic());
        self.fileline = lexer.fileline().clone();
        // The scanner gets the contents in slabs, CRs and NULs stripped per
        // slab so they never reach the token rules
        let mut rest = contents.as_str();
        while !rest.is_empty() {
            let mut end = rest.len().min(SCAN_SLAB_SIZE);
            while !rest.is_char_boundary(end) {
                end += 1;
            }
            let (slab, tail) = rest.split_at(end);
            rest = tail;
            if slab.contains('\r') || slab.contains('\0') {
                let stripped: String = slab.chars().filter(|&c| c != '\r' && c != '\0').collect();
                lexer.scan_bytes_back(&stripped);

            } else {
                lexer.scan_bytes_back(slab);
            }
        }
        self.lexer = Some(lexer);
        self.add_line_comment(1);
    }

    /// Returns the next logical line, terminated by a newline. Empty at EOF.
    pub fn get_line(&mut self) -> String {
        self.get_parseline(true, 0)
    }

    /// Returns at least `approx_chunk` bytes of output, or the remainder.
    pub fn get_all(&mut self, approx_chunk: usize) -> String {
        self.get_parseline(false, approx_chunk)
    }

    fn error(&mut self, message: String) {
        self.host.report(PreprocError::new(self.fileline.clone(), message));
    }

    fn warning(&mut self, message: String) {
        self.host.report(PreprocError::warning(self.fileline.clone(), message));
    }

    fn fatal_src(&mut self, message: String) {
        self.host.report(PreprocError::fatal(self.fileline.clone(), message));
    }

    fn parsing_off(&mut self) {
        self.off += 1;
    }

    fn parsing_on(&mut self) {
        if self.off == 0 {
            self.fatal_src("Internal error: Conditional nesting underflow".to_string());

        } else {
            self.off -= 1;
        }
        if self.off == 0 {
            self.add_line_comment(0);
        }
    }

    fn state(&self) -> ProcState {
        self.states.last().copied().unwrap_or(ProcState::Top)
    }

    fn state_push(&mut self, state: ProcState) {
        self.states.push(state);
    }

    fn state_pop(&mut self) {
        self.states.pop();
        if self.states.is_empty() {
            self.fatal_src("Internal error: Pop of parser state with nothing on stack".to_string());
            self.states.push(ProcState::Top);
        }
    }

    fn state_change(&mut self, state: ProcState) {
        self.state_pop();
        self.state_push(state);
    }

    // Queued text must start in column 0; a newline is injected only when
    // the stream is mid-line, to avoid surplus blank lines
    fn insert_unreadback_at_bol(&mut self, text: &str) {
        if self.line_cmt.is_empty() {
            self.line_cmt_nl = true;

        } else if !self.line_cmt.ends_with('\n') {
            self.line_cmt.push('\n');
        }
        self.line_cmt.push_str(text);
    }

    fn add_line_comment(&mut self, enter_exit_level: usize) {
        if self.host.line_directives() {
            if let Some(lexer) = self.lexer.as_ref() {
                let directive = lexer.fileline().line_directive(enter_exit_level);
                self.insert_unreadback_at_bol(&directive);
            }
        }
    }

    fn unput_string(&mut self, text: &str) {
        // Scanned as a fresh buffer instead of pushed back character by
        // character; the EOF handler discards it once drained
        match self.lexer.as_mut() {
            None => self.fatal_src("Internal error: unput without an active input".to_string()),
            Some(lexer) => lexer.scan_bytes(text)
        }
    }

    fn drain_lexer_errors(&mut self) {
        let errors = match self.lexer.as_mut() {
            None => return,
            Some(lexer) => lexer.take_errors()
        };
        for error in errors {
            self.host.report(error);
        }
    }

    /// Scanner EOF is ambiguous: the end of an unput pushback resumes the
    /// next older buffer of the same lexer, the end of a file pops the
    /// include stack.
    fn eof(&mut self) {
        if self.lexer.as_ref().map_or(false, |lexer| lexer.buffer_count() > 1) {
            if let Some(lexer) = self.lexer.as_mut() {
                lexer.pop_buffer();
            }
            return;
        }
        self.lexer = None;
        if let Some(parent) = self.include_stack.pop() {
            if parent.buffer_count() == 0 {
                self.fatal_src("Internal error: No include buffer to return to".to_string());
            }
            self.fileline = parent.fileline().clone();
            self.lexer = Some(parent);
            self.add_line_comment(2);
        }
    }

    fn debug_token(&self, token: &Token, source: &str) {
        if self.debug > 0 {
            let text = token.text.replace('\n', "\\n").replace('\r', "\\r");
            eprintln!(
                "{}: {} {} {}({}) dr{}: {:<12}: {}",
                self.fileline.lineno(),
                source,
                if self.off != 0 { "of" } else { "on" },
                self.state().name(),
                self.states.len(),
                self.def_refs.len(),
                token.kind.name(),
                text
            );
        }
    }

    /// Raw pump: owed newlines first, then deferred line-comment text, then
    /// the scanner. Scanner EOF is resolved here and never escapes while a
    /// lexer is active.
    fn get_raw_token(&mut self) -> Token {
        loop {
            if self.line_add > 0 {
                self.line_add -= 1;
                self.raw_at_bol = true;
                let token = Token::new(TokenKind::White, "\n");
                self.debug_token(&token, "LNA");
                return token;
            }
            if !self.line_cmt.is_empty() {
                let mut text = mem::take(&mut self.line_cmt);
                if self.line_cmt_nl {
                    if !self.raw_at_bol {
                        text.insert(0, '\n');
                    }
                    self.line_cmt_nl = false;
                }
                self.raw_at_bol = text.ends_with('\n');
                if self.state() == ProcState::DefValue {
                    // Host-injected text lands in the body being collected
                    if let Some(lexer) = self.lexer.as_mut() {
                        lexer.append_def_value(&text);
                    }
                    continue;
                }
                let token = Token::new(TokenKind::Text, text);
                self.debug_token(&token, "LCM");
                return token;
            }
            let (fileline, token) = match self.lexer.as_mut() {
                None => return Token::eof(),
                Some(lexer) => {
                    let fileline = lexer.fileline().clone();
                    (fileline, lexer.next_token())
                }
            };
            self.fileline = fileline;
            self.drain_lexer_errors();
            self.debug_token(&token, "RAW");
            if token.is(TokenKind::Eof) {
                self.eof();
                continue;
            }
            if !token.text.is_empty() {
                self.raw_at_bol = token.text.ends_with('\n');
            }
            return token;
        }
    }

    /// User-visible pump: directives are interpreted here and never reach
    /// the caller; whitespace always passes through so every input newline
    /// is accounted for, even inside dead conditional branches.
    fn get_token(&mut self) -> Token {
        loop {
            if self.is_eof() {
                return Token::eof();
            }
            let token = self.get_raw_token();
            match token.kind {
                TokenKind::White => return token,
                TokenKind::Comment => {
                    if self.off == 0 {
                        match self.host.keep_comments() {
                            KeepComments::Keep => return token,
                            KeepComments::Sub | KeepComments::Exp => self.host.comment(&token.text),
                            KeepComments::Off => {}
                        }
                    }
                    // Elided comments still owe their newlines
                    self.line_add += token.text.matches('\n').count();
                    continue;
                },
                TokenKind::Line => {
                    let level = self.lexer.as_ref().map_or(0, |lexer| lexer.enter_exit());
                    self.add_line_comment(level);
                    continue;
                },
                _ => {}
            }
            let state = self.state();
            match state {
                ProcState::Top => {},
                ProcState::DefNameUndef
                | ProcState::DefNameDefine
                | ProcState::DefNameIfdef
                | ProcState::DefNameIfndef
                | ProcState::DefNameElsif => match token.kind {
                    TokenKind::Symbol => {
                        self.last_sym = token.text.clone();
                        match state {
                            ProcState::DefNameIfdef | ProcState::DefNameIfndef => {
                                let mut enable = self.host.def_exists(&self.last_sym);
                                if state == ProcState::DefNameIfndef {
                                    enable = !enable;
                                }
                                self.ifdef_stack.push(IfEntry::new(enable, false));
                                if !enable {
                                    self.parsing_off();
                                }
                                self.state_pop();
                            },
                            ProcState::DefNameElsif => {
                                match self.ifdef_stack.pop() {
                                    None => self.error("`elsif with no matching `if".to_string()),
                                    Some(last_if) => {
                                        // Close the previous branch, then
                                        // open this one only if no earlier
                                        // branch was ever taken
                                        if !last_if.on {
                                            self.parsing_on();
                                        }
                                        let enable = !last_if.ever_on && self.host.def_exists(&self.last_sym);
                                        self.ifdef_stack.push(IfEntry::new(enable, last_if.ever_on));
                                        if !enable {
                                            self.parsing_off();
                                        }
                                    }
                                }
                                self.state_pop();
                            },
                            ProcState::DefNameUndef => {
                                if self.off == 0 {
                                    self.host.undef(&self.last_sym);
                                }
                                self.state_pop();
                            },
                            ProcState::DefNameDefine => {
                                self.state_change(ProcState::DefForm);
                                if let Some(lexer) = self.lexer.as_mut() {
                                    lexer.push_state_def_form();
                                }
                            },
                            _ => {
                                self.fatal_src("Internal error: Bad define name state".to_string());
                                self.state_pop();
                            }
                        }
                        continue;
                    },
                    TokenKind::Text => {
                        // Stray text between the directive and its name
                        if self.off == 0 {
                            return token;
                        }
                        continue;
                    },
                    // A macro reference expands first; this state resumes
                    // once the replacement has been re-scanned
                    TokenKind::DefRef => {},
                    _ => {
                        self.error(format!("Expecting define name. Found: {}", token.kind.name()));
                        continue;
                    }
                },
                ProcState::DefForm => match token.kind {
                    TokenKind::DefForm => {
                        self.formals = self.lexer.as_mut().map(|lexer| lexer.take_def_value()).unwrap_or_default();
                        self.state_change(ProcState::DefValue);
                        if let Some(lexer) = self.lexer.as_mut() {
                            lexer.push_state_def_value();
                        }
                        continue;
                    },
                    TokenKind::Text => {
                        if self.off == 0 {
                            return token;
                        }
                        continue;
                    },
                    _ => {
                        self.error(format!("Expecting define formal arguments. Found: {}", token.kind.name()));
                        continue;
                    }
                },
                ProcState::DefValue => {
                    // Terminated by a return the scanner consumed; emit it
                    // here together with every newline the body swallowed
                    let mut newlines = String::from("\n");
                    if token.kind == TokenKind::DefValue {
                        let raw_formals = mem::take(&mut self.formals);
                        let raw_value = self.lexer.as_mut().map(|lexer| lexer.take_def_value()).unwrap_or_default();
                        let formals: String = raw_formals.chars().map(|c| if c == '\n' {
                            newlines.push('\n');
                            ' '

                        } else {
                            c
                        }).collect();
                        let value: String = raw_value.chars().map(|c| if c == '\n' {
                            newlines.push('\n');
                            ' '

                        } else {
                            c
                        }).collect();
                        if self.off == 0 {
                            let value = trim_whitespace(&value, true);
                            let name = mem::take(&mut self.last_sym);
                            if self.host.def_exists(&name) && self.host.def_value(&name) != value {
                                self.warning(format!("Redefining existing define: {}", name));
                            }
                            self.host.define(&name, &value, &formals);
                            self.last_sym = name;
                        }

                    } else {
                        self.fatal_src(format!("Bad define text, unexpected {}", token.kind.name()));
                    }
                    self.state_pop();
                    return Token::new(TokenKind::White, newlines);
                },
                ProcState::DefParen => {
                    if token.kind == TokenKind::Text && token.text == "(" {
                        self.state_change(ProcState::DefArg);
                        continue;
                    }
                    let name = match self.def_refs.last() {
                        Some(refr) => refr.name.clone(),
                        None => {
                            self.fatal_src("Internal error: DEFPAREN without active define reference".to_string());
                            String::new()
                        }
                    };
                    self.error(format!("Expecting ( to begin argument list for define reference `{}", name));
                    self.def_refs.pop();
                    self.state_pop();
                    // A DEFARG token already popped the scan condition itself
                    let pop_condition = token.kind != TokenKind::DefArg;
                    let level = self.def_refs.last().map_or(0, |outer| outer.paren_level);
                    if let Some(lexer) = self.lexer.as_mut() {
                        if pop_condition {
                            lexer.pop_state();
                        }
                        lexer.take_def_value();
                        lexer.set_paren_level(level);
                    }
                    continue;
                },
                ProcState::DefArg => {
                    if self.def_refs.is_empty() {
                        self.fatal_src("Internal error: DEFARG without active define reference".to_string());
                        self.state_pop();
                        continue;
                    }
                    // Text the scanner accumulated since the last token
                    // belongs to the argument being built
                    let pending = self.lexer.as_mut().map(|lexer| lexer.take_def_value()).unwrap_or_default();
                    if let Some(refr) = self.def_refs.last_mut() {
                        refr.next_arg.push_str(&pending);
                    }
                    if token.kind == TokenKind::DefArg && token.text == "," {
                        if let Some(refr) = self.def_refs.last_mut() {
                            let arg = mem::take(&mut refr.next_arg);
                            refr.args.push(arg);
                        }
                        self.state_change(ProcState::DefArg);
                        if let Some(lexer) = self.lexer.as_mut() {
                            lexer.push_state_def_arg(1);
                        }
                        continue;

                    } else if token.kind == TokenKind::DefArg && token.text == ")" {
                        let mut refr = match self.def_refs.pop() {
                            Some(refr) => refr,
                            None => continue
                        };
                        let arg = mem::take(&mut refr.next_arg);
                        refr.args.push(arg);
                        let value = self.host.def_value(&refr.name);
                        let mut errors = Vec::new();
                        let out = define_subst(&refr, &value, &mut errors);
                        for message in errors {
                            self.error(message);
                        }
                        let out = self.host.def_substitute(out);
                        if self.def_refs.is_empty() {
                            self.unput_string(&out);
                            self.state_pop();
                            if let Some(lexer) = self.lexer.as_mut() {
                                lexer.set_paren_level(0);
                            }

                        } else {
                            // Still under an enclosing reference: the result
                            // joins its pending argument, so a comma inside
                            // it can never split the outer argument list
                            let leftover = self.lexer.as_mut().map(|lexer| lexer.take_def_value()).unwrap_or_default();
                            let mut level = 0;
                            if let Some(outer) = self.def_refs.last_mut() {
                                outer.next_arg.push_str(&leftover);
                                outer.next_arg.push_str(&out);
                                level = outer.paren_level;
                            }
                            if let Some(lexer) = self.lexer.as_mut() {
                                lexer.set_paren_level(level);
                            }
                            self.state_pop();
                        }
                        continue;

                    } else if token.kind == TokenKind::DefRef {
                        // Expands first; the argument resumes afterwards

                    } else if matches!(token.kind, TokenKind::Symbol | TokenKind::String | TokenKind::Text | TokenKind::White) {
                        if let Some(refr) = self.def_refs.last_mut() {
                            refr.next_arg.push_str(&token.text);
                        }
                        continue;

                    } else {
                        self.error(format!("Expecting ) or , to end argument list for define reference. Found: {}", token.kind.name()));
                        self.state_pop();
                        continue;
                    }
                },
                ProcState::IncName => {
                    if token.kind == TokenKind::String {
                        self.state_pop();
                        // Drop the delimiters
                        let mut filename = token.text.clone();
                        filename.pop();
                        if !filename.is_empty() {
                            filename.remove(0);
                        }
                        self.last_sym = filename.clone();
                        self.open_file(&filename, None);
                        continue;

                    } else if token.kind == TokenKind::Text && token.text == "<" {
                        // `include <filename>
                        if let Some(lexer) = self.lexer.as_mut() {
                            lexer.push_state_inc_filename();
                        }
                        continue;

                    } else if token.kind == TokenKind::DefRef {
                        // Expands first

                    } else {
                        self.state_pop();
                        self.error(format!("Expecting include filename. Found: {}", token.kind.name()));
                        continue;
                    }
                },
                ProcState::ErrorName => {
                    if token.kind == TokenKind::String {
                        if self.off == 0 {
                            self.last_sym = token.text.clone();
                            let message = self.last_sym.clone();
                            self.error(message);
                        }

                    } else {
                        self.error(format!("Expecting `error string. Found: {}", token.kind.name()));
                    }
                    self.state_pop();
                    continue;
                }
            }
            // Top level directive handling
            match token.kind {
                TokenKind::Include => {
                    if self.off == 0 {
                        self.state_push(ProcState::IncName);
                    }
                    continue;
                },
                TokenKind::Undef => {
                    self.state_push(ProcState::DefNameUndef);
                    continue;
                },
                TokenKind::Define => {
                    self.state_push(ProcState::DefNameDefine);
                    continue;
                },
                TokenKind::Ifdef => {
                    self.state_push(ProcState::DefNameIfdef);
                    continue;
                },
                TokenKind::Ifndef => {
                    self.state_push(ProcState::DefNameIfndef);
                    continue;
                },
                TokenKind::Elsif => {
                    self.state_push(ProcState::DefNameElsif);
                    continue;
                },
                TokenKind::Else => {
                    match self.ifdef_stack.pop() {
                        None => self.error("`else with no matching `if".to_string()),
                        Some(last_if) => {
                            let enable = !last_if.ever_on;
                            self.ifdef_stack.push(IfEntry::new(enable, last_if.ever_on));
                            if !last_if.on {
                                self.parsing_on();
                            }
                            if !enable {
                                self.parsing_off();
                            }
                        }
                    }
                    continue;
                },
                TokenKind::Endif => {
                    match self.ifdef_stack.pop() {
                        None => self.error("`endif with no matching `if".to_string()),
                        Some(last_if) => if !last_if.on {
                            // Only re-enables output once every enclosing
                            // conditional wants it on
                            self.parsing_on();
                        }
                    }
                    continue;
                },
                TokenKind::DefRef => {
                    if self.off != 0 {
                        continue;
                    }
                    let name: String = token.text.chars().skip(1).collect();
                    self.def_depth += 1;
                    if self.def_depth > DEFINE_RECURSION_LEVEL_MAX {
                        self.error(format!("Recursive `define substitution: `{}", name));
                        continue;
                    }
                    let params = self.host.def_params(&name);
                    if params.is_empty() {
                        // Not a macro after all; the reference passes
                        // through as plain text
                        self.def_depth = 0;
                        return Token::new(TokenKind::Text, token.text);

                    } else if params == "0" {
                        let out = self.host.def_value(&name);
                        let out = self.host.def_substitute(out);
                        if self.def_refs.is_empty() {
                            self.unput_string(&out);

                        } else {
                            // Mid-argument substitution joins the enclosing
                            // reference's pending argument directly
                            let leftover = self.lexer.as_mut().map(|lexer| lexer.take_def_value()).unwrap_or_default();
                            if let Some(refr) = self.def_refs.last_mut() {
                                refr.next_arg.push_str(&leftover);
                                refr.next_arg.push_str(&out);
                            }
                        }
                        continue;

                    } else {
                        // The suspended paren depth belongs to the reference
                        // whose arguments are being collected, not the one
                        // starting now
                        let paren_level = self.lexer.as_ref().map_or(0, |lexer| lexer.paren_level());
                        if let Some(outer) = self.def_refs.last_mut() {
                            outer.paren_level = paren_level;
                        }
                        self.def_refs.push(DefRef::new(name, params));
                        self.state_push(ProcState::DefParen);
                        if let Some(lexer) = self.lexer.as_mut() {
                            lexer.push_state_def_arg(0);
                        }
                        continue;
                    }
                },
                TokenKind::Error => {
                    self.state_push(ProcState::ErrorName);
                    continue;
                },
                TokenKind::Undefineall => {
                    if self.off == 0 {
                        self.host.undefineall();
                    }
                    continue;
                },
                TokenKind::Eof => {
                    if !self.ifdef_stack.is_empty() {
                        self.error("`ifdef not terminated at EOF".to_string());
                        self.ifdef_stack.clear();
                    }
                    return token;
                },
                TokenKind::Symbol | TokenKind::String | TokenKind::Text => {
                    self.def_depth = 0;
                    if self.off == 0 {
                        return token;
                    }
                    continue;
                },
                _ => {
                    self.fatal_src(format!("Internal error: Unexpected token {}", token.kind.name()));
                    continue;
                }
            }
        }
    }

    fn get_parseline(&mut self, stop_at_eol: bool, approx_chunk: usize) -> String {
        if self.is_eof() && self.line_chars.is_empty() {
            return String::new();
        }
        loop {
            let mut got_eof = false;
            loop {
                let done = if stop_at_eol {
                    self.line_chars.contains('\n')

                } else {
                    approx_chunk != 0 && self.line_chars.len() >= approx_chunk
                };
                if done {
                    break;
                }
                let token = self.get_token();
                if self.debug > 0 {
                    let text = token.text.replace('\n', "\\n").replace('\r', "\\r");
                    eprintln!("{}: GETFETC: {:<12}: {}", self.fileline.lineno(), token.kind.name(), text);
                }
                if token.is(TokenKind::Eof) {
                    // Patch in the final newline the user forgot
                    if !self.line_chars.is_empty() && !self.line_chars.ends_with('\n') {
                        self.line_chars.push('\n');
                    }
                    got_eof = true;
                    break;
                }
                self.line_chars.push_str(&token.text);
            }
            let len = if stop_at_eol {
                match self.line_chars.find('\n') {
                    Some(pos) => pos + 1,
                    None => self.line_chars.len()
                }

            } else {
                self.line_chars.len()
            };
            let the_line: String = self.line_chars.drain(..len).collect();
            if !self.host.keep_whitespace() && !got_eof
                && the_line.chars().all(|c| c.is_ascii_whitespace()) {
                continue;
            }
            if self.debug > 0 {
                eprintln!("{}: GETLINE: {}", self.fileline.lineno(), the_line.replace('\n', "\\n"));
            }
            return the_line;
        }
    }

}
