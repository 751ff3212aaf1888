//! Grammar driver: the CIF state machine
//!
//! Pulls tokens from [`CifLexer`] one at a time and turns them into
//! [`ParserActions`] callbacks. Token payloads are copied into owned
//! storage before the next token is requested.

use super::report::ParseStatus;
use crate::lexical::{CifLexer, LexicalMetrics, ValueBuffer};
use crate::logging::{codes, Diagnostics};
use crate::model::Value;
use crate::tokens::Token;

/// Whether the driver should keep reading after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    /// `Stop` if either side asked to stop
    pub fn and(self, other: Flow) -> Flow {
        if self == Flow::Stop || other == Flow::Stop {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    pub fn is_stop(&self) -> bool {
        *self == Flow::Stop
    }
}

/// Callbacks invoked by the driver, in input order.
///
/// `process_loop_declaration` receives the first item name of a loop
/// header and `process_item_name_list` every later one. Values inside a
/// loop arrive through `process_value_list`; `process_loop_end` follows
/// the last of them.
pub trait ParserActions {
    fn diagnostics(&mut self) -> &mut Diagnostics;

    fn process_data_block_name(&mut self, name: &str, line: u32) -> Flow;
    fn process_loop(&mut self, line: u32) -> Flow;
    fn process_loop_declaration(&mut self, item: &str, line: u32) -> Flow;
    fn process_item_name_list(&mut self, item: &str, line: u32) -> Flow;
    fn process_value_list(&mut self, value: Value, line: u32) -> Flow;
    fn process_loop_end(&mut self, line: u32) -> Flow;
    fn process_item_value_pair(&mut self, item: &str, value: Value, line: u32) -> Flow;
    fn process_save_begin(&mut self, name: &str, line: u32) -> Flow;
    fn process_save_end(&mut self, line: u32) -> Flow;

    /// End of input or early stop; flush whatever is still open
    fn finish(&mut self, line: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Item name read, waiting for its value
    PendingItem { line: u32 },
    /// After `loop_`, `items` names read so far
    LoopHeader { items: usize, line: u32 },
    LoopBody,
    /// `loop_` with no item names; values are dropped
    SkipLoop,
}

/// Owns the state machine and the owned copies of token text
pub struct GrammarDriver {
    state: State,
    keyword_buf: String,
    text: ValueBuffer,
}

impl GrammarDriver {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            keyword_buf: String::new(),
            text: ValueBuffer::new(),
        }
    }

    /// Run a whole source through `actions`
    pub fn run<A: ParserActions>(
        mut self,
        source: &str,
        actions: &mut A,
    ) -> (ParseStatus, LexicalMetrics) {
        let mut lexer = CifLexer::new(source);
        let mut status = ParseStatus::Completed;

        let last_line = loop {
            let spanned = lexer.next_token();
            let line = spanned.line();
            let step = self.step(spanned.token, line, actions);

            for issue in lexer.take_issues() {
                let message = issue.to_string();
                actions
                    .diagnostics()
                    .warning(issue.error_code(), issue.line(), message);
            }

            match step {
                Step::Continue => {}
                Step::Stop => {
                    status = ParseStatus::Stopped;
                    break line;
                }
                Step::Eof { unterminated } => {
                    if unterminated {
                        status = ParseStatus::UnterminatedText;
                    }
                    break line;
                }
            }
        };

        actions.finish(last_line);
        (status, lexer.metrics().clone())
    }

    fn step<A: ParserActions>(&mut self, token: Token<'_>, line: u32, actions: &mut A) -> Step {
        let flow = match token {
            Token::Whitespace | Token::Comment(_) => Flow::Continue,

            Token::ItemValue(text) => self.deliver(Value::text(text), line, actions),
            Token::Unknown => self.deliver(Value::Unknown, line, actions),
            Token::Inapplicable => self.deliver(Value::Inapplicable, line, actions),

            Token::MultilineTextBegin(first) => {
                self.text.begin(first, line);
                Flow::Continue
            }
            Token::MultilineTextContinue(text) => {
                self.text.push_line(text);
                Flow::Continue
            }
            Token::MultilineTextEnd => {
                let value = self.text.finish();
                self.deliver(Value::Text(value), line, actions)
            }

            Token::ItemName(name) => self.item_name(name, line, actions),

            Token::DataBlockName(name) => {
                let flow = self.close_construct(line, actions);
                flow.and(actions.process_data_block_name(name, line))
            }
            Token::Loop => {
                let flow = self.close_construct(line, actions);
                self.state = State::LoopHeader { items: 0, line };
                flow.and(actions.process_loop(line))
            }
            Token::Stop => self.close_construct(line, actions),
            Token::Global => {
                let flow = self.close_construct(line, actions);
                actions.diagnostics().warning(
                    codes::lexical::UNSUPPORTED_KEYWORD,
                    line,
                    "global_ is not supported and was ignored",
                );
                flow
            }
            Token::SaveBegin(name) => {
                let flow = self.close_construct(line, actions);
                flow.and(actions.process_save_begin(name, line))
            }
            Token::SaveEnd => {
                let flow = self.close_construct(line, actions);
                flow.and(actions.process_save_end(line))
            }

            Token::Eof => return self.end_of_input(line, actions),
        };

        if flow.is_stop() {
            Step::Stop
        } else {
            Step::Continue
        }
    }

    fn end_of_input<A: ParserActions>(&mut self, line: u32, actions: &mut A) -> Step {
        let unterminated = self.text.is_open();
        if unterminated {
            actions.diagnostics().error(
                codes::lexical::UNTERMINATED_TEXT_FIELD,
                line,
                format!(
                    "string not finished (text field opened at line {})",
                    self.text.start_line()
                ),
            );
            let partial = self.text.finish();
            if self.deliver(Value::Text(partial), line, actions).is_stop() {
                return Step::Stop;
            }
        }
        if self.close_construct(line, actions).is_stop() {
            return Step::Stop;
        }
        Step::Eof { unterminated }
    }

    fn item_name<A: ParserActions>(&mut self, name: &str, line: u32, actions: &mut A) -> Flow {
        match self.state {
            State::LoopHeader { items, line: loop_line } => {
                self.state = State::LoopHeader {
                    items: items + 1,
                    line: loop_line,
                };
                if items == 0 {
                    actions.process_loop_declaration(name, line)
                } else {
                    actions.process_item_name_list(name, line)
                }
            }
            _ => {
                let flow = self.close_construct(line, actions);
                self.keyword_buf.clear();
                self.keyword_buf.push_str(name);
                self.state = State::PendingItem { line };
                flow
            }
        }
    }

    fn deliver<A: ParserActions>(&mut self, value: Value, line: u32, actions: &mut A) -> Flow {
        match self.state {
            State::PendingItem { .. } => {
                self.state = State::Idle;
                actions.process_item_value_pair(&self.keyword_buf, value, line)
            }
            State::LoopHeader { items: 0, .. } => {
                actions.diagnostics().warning(
                    codes::syntax::UNEXPECTED_VALUE,
                    line,
                    "loop_ has no item names, its values are ignored",
                );
                self.state = State::SkipLoop;
                Flow::Continue
            }
            State::LoopHeader { .. } | State::LoopBody => {
                self.state = State::LoopBody;
                actions.process_value_list(value, line)
            }
            State::SkipLoop => Flow::Continue,
            State::Idle => {
                actions.diagnostics().warning(
                    codes::syntax::UNEXPECTED_VALUE,
                    line,
                    format!("Value {} has no item name", value.quoted()),
                );
                Flow::Continue
            }
        }
    }

    /// Finish a pending item or an open loop before a new construct begins
    fn close_construct<A: ParserActions>(&mut self, line: u32, actions: &mut A) -> Flow {
        let state = std::mem::replace(&mut self.state, State::Idle);
        match state {
            State::Idle | State::SkipLoop => Flow::Continue,
            State::PendingItem { line: item_line } => {
                let message = format!("Item {} has no value", self.keyword_buf);
                actions
                    .diagnostics()
                    .warning(codes::syntax::MISSING_VALUE, item_line, message);
                Flow::Continue
            }
            State::LoopHeader { items: 0, line: loop_line } => {
                actions.diagnostics().warning(
                    codes::syntax::MISSING_VALUE,
                    loop_line,
                    "loop_ has no item names",
                );
                Flow::Continue
            }
            State::LoopHeader { items, .. } => {
                actions.diagnostics().warning(
                    codes::syntax::MISSING_VALUE,
                    line,
                    format!("loop_ declares {} item names but has no values", items),
                );
                actions.process_loop_end(line)
            }
            State::LoopBody => actions.process_loop_end(line),
        }
    }
}

impl Default for GrammarDriver {
    fn default() -> Self {
        Self::new()
    }
}

enum Step {
    Continue,
    Stop,
    Eof { unterminated: bool },
}
