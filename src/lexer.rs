//! Scanner splitting a parameter line into tokens.
//!
//! Tokens are separated by whitespace. Double quotes capture text verbatim,
//! spaces included. Braces delimit nested commands: the text between a pair of
//! braces is handed to a resolver and the resolver's answer takes its place.
//! Braces may nest; inner braces are resolved first and their result becomes
//! part of the enclosing brace text.

use crate::error::{CommandError, Result};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    /// Skipping whitespace before the first token.
    Start,
    ReadingWord,
    ReadingQuote,
    /// At least one brace is open; depth is the length of the brace stack.
    ReadingBrace,
}

struct LexingFSM<F> {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    /// Bare or quoted token being accumulated outside of braces.
    token: String,
    /// One partial buffer per open brace, innermost last.
    braces: Vec<String>,
    /// The previous character closed a brace or a quote. A `{` right after it
    /// is taken literally.
    after_closer: bool,
    max_depth: usize,
    resolve: F,
}

impl<F> LexingFSM<F>
where
    F: FnMut(&str) -> Result<String>,
{
    fn new(line: &str, max_depth: usize, resolve: F) -> Self {
        let mut input: Vec<char> = line.chars().collect();
        // Synthetic separator so the last bare token gets flushed.
        input.push(' ');

        LexingFSM {
            input,
            pos: 0,
            state: LexingState::Start,
            token: String::new(),
            braces: Vec::new(),
            after_closer: false,
            max_depth,
            resolve,
        }
    }

    fn make_tokens(&mut self) -> Result<Vec<String>> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out)?,
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingQuote => self.handle_quote(ch, &mut out),
                LexingState::ReadingBrace => self.handle_brace(ch, &mut out)?,
            }
        }

        // Unterminated quotes and braces are dropped, not auto-closed.
        match self.state {
            LexingState::ReadingQuote => {
                trace!(captured = %self.token, "dropping unterminated quote");
            }
            LexingState::ReadingBrace => {
                trace!(depth = self.braces.len(), "dropping unterminated brace");
            }
            _ => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<String>) -> Result<()> {
        if ch.is_whitespace() {
            return Ok(());
        }
        self.state = LexingState::ReadingWord;
        self.handle_word(ch, out)
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<()> {
        match ch {
            '{' if !self.after_closer => return self.open_brace(),
            '"' => self.state = LexingState::ReadingQuote,
            c if c.is_whitespace() => {
                if !self.token.is_empty() {
                    Self::commit(out, std::mem::take(&mut self.token));
                }
            }
            // Includes a `}` that closes nothing.
            c => self.token.push(c),
        }
        self.after_closer = false;
        Ok(())
    }

    fn handle_quote(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            '"' => {
                // Closing quote commits even an empty string.
                Self::commit(out, std::mem::take(&mut self.token));
                self.state = LexingState::ReadingWord;
                self.after_closer = true;
            }
            c => self.token.push(c),
        }
    }

    fn handle_brace(&mut self, ch: char, out: &mut Vec<String>) -> Result<()> {
        match ch {
            '{' if !self.after_closer => return self.open_brace(),
            '}' => return self.close_brace(out),
            c => {
                if let Some(top) = self.braces.last_mut() {
                    top.push(c);
                }
            }
        }
        self.after_closer = false;
        Ok(())
    }

    fn open_brace(&mut self) -> Result<()> {
        if self.max_depth != 0 && self.braces.len() >= self.max_depth {
            warn!(limit = self.max_depth, "nesting limit exceeded");
            return Err(CommandError::NestingLimitExceeded {
                limit: self.max_depth,
            });
        }
        self.braces.push(String::new());
        self.state = LexingState::ReadingBrace;
        self.after_closer = false;
        Ok(())
    }

    fn close_brace(&mut self, out: &mut Vec<String>) -> Result<()> {
        let inner = self.braces.pop().unwrap_or_default();
        let resolved = (self.resolve)(&inner)?;
        trace!(inner = %inner, resolved = %resolved, "substituted nested command");

        match self.braces.last_mut() {
            Some(parent) => parent.push_str(&resolved),
            None => {
                Self::commit(out, resolved);
                self.state = LexingState::ReadingWord;
            }
        }
        self.after_closer = true;
        Ok(())
    }

    fn commit(out: &mut Vec<String>, token: String) {
        trace!(token = %token, "token");
        out.push(token);
    }
}

/// Split `line` into tokens, resolving brace-delimited sub-commands.
///
/// `resolve` receives the text between a pair of braces (without the braces)
/// and returns the substitution. Siblings resolve left to right, and inner
/// braces resolve before the brace enclosing them. An error from `resolve`
/// aborts the scan.
///
/// Opening a brace while `max_depth` braces are already open fails with
/// [`CommandError::NestingLimitExceeded`]; a `max_depth` of 0 means unbounded.
pub fn split_into_tokens<F>(line: &str, max_depth: usize, resolve: F) -> Result<Vec<String>>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut lexer = LexingFSM::new(line, max_depth, resolve);
    lexer.make_tokens()
}
