//! Line command grammar.
//!
//! One command per line: a verb, then node ids and free text. Text may be
//! quoted with `"` or `'` and use backslash escapes; unquoted text runs to the
//! end of the line.

use lucent_common::{Key, NodeRef};
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "lucent.pest"]
pub struct CommandParser;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Pest error: {0}")]
    Pest(#[from] Box<pest::error::Error<Rule>>),
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("'{command}' is missing its {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("Unexpected input: {0}")]
    UnexpectedInput(String),
    #[error("Invalid node id: {0}")]
    InvalidNodeRef(String),
    #[error("{0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Goto(String),
    Click(NodeRef),
    Hover(NodeRef),
    Type(NodeRef, String),
    Select(NodeRef, String),
    Drag(NodeRef, NodeRef),
    Press(Key),
    Wait,
    Title,
    Url,
    Tree,
    Screenshot(String),
    Verify { statement: String, vision: bool },
}

const DEFAULT_SCREENSHOT: &str = "screenshot.png";

pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let line = CommandParser::parse(Rule::line, input)
        .map_err(Box::new)?
        .next()
        .ok_or(ParseError::Empty)?;
    let command = line
        .into_inner()
        .find(|pair| pair.as_rule() != Rule::EOI)
        .ok_or(ParseError::Empty)?;
    build(command)
}

fn build(pair: Pair<'_, Rule>) -> Result<Command, ParseError> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();

    if rule == Rule::unknown_cmd {
        let verb = inner.next().map(|p| p.as_str()).unwrap_or_default();
        return Err(ParseError::UnknownCommand(verb.to_ascii_lowercase()));
    }

    // Drop the keyword.
    inner.next();
    let mut args = Arguments {
        command: command_name(rule),
        pairs: inner,
    };

    let command = match rule {
        Rule::goto_cmd => Command::Goto(args.text("url")?),
        Rule::click_cmd => Command::Click(args.node("node id")?),
        Rule::hover_cmd => Command::Hover(args.node("node id")?),
        Rule::type_cmd => Command::Type(args.node("node id")?, args.text("text")?),
        Rule::select_cmd => Command::Select(args.node("node id")?, args.text("value")?),
        Rule::drag_cmd => Command::Drag(args.node("source id")?, args.node("target id")?),
        Rule::press_cmd => {
            let key = args.word("key")?;
            Command::Press(key.parse().map_err(ParseError::InvalidKey)?)
        }
        Rule::wait_cmd => Command::Wait,
        Rule::title_cmd => Command::Title,
        Rule::url_cmd => Command::Url,
        Rule::tree_cmd => Command::Tree,
        Rule::screenshot_cmd => Command::Screenshot(
            args.optional_text()
                .unwrap_or_else(|| DEFAULT_SCREENSHOT.to_string()),
        ),
        Rule::verify_cmd => Command::Verify {
            statement: args.text("statement")?,
            vision: false,
        },
        Rule::verify_vision_cmd => Command::Verify {
            statement: args.text("statement")?,
            vision: true,
        },
        other => return Err(ParseError::UnknownCommand(format!("{:?}", other))),
    };
    args.finish()?;
    Ok(command)
}

fn command_name(rule: Rule) -> &'static str {
    match rule {
        Rule::goto_cmd => "goto",
        Rule::click_cmd => "click",
        Rule::hover_cmd => "hover",
        Rule::type_cmd => "type",
        Rule::select_cmd => "select",
        Rule::drag_cmd => "drag",
        Rule::press_cmd => "press",
        Rule::wait_cmd => "wait",
        Rule::title_cmd => "title",
        Rule::url_cmd => "url",
        Rule::tree_cmd => "tree",
        Rule::screenshot_cmd => "screenshot",
        Rule::verify_vision_cmd => "verify-vision",
        _ => "verify",
    }
}

/// The arguments following a keyword, consumed in order.
struct Arguments<'i> {
    command: &'static str,
    pairs: Pairs<'i, Rule>,
}

impl<'i> Arguments<'i> {
    fn next(&mut self, argument: &'static str) -> Result<Pair<'i, Rule>, ParseError> {
        match self.pairs.next() {
            Some(pair) if pair.as_rule() == Rule::extra => {
                Err(ParseError::UnexpectedInput(pair.as_str().trim().to_string()))
            }
            Some(pair) => Ok(pair),
            None => Err(ParseError::MissingArgument {
                command: self.command,
                argument,
            }),
        }
    }

    fn word(&mut self, argument: &'static str) -> Result<&'i str, ParseError> {
        Ok(self.next(argument)?.as_str())
    }

    fn node(&mut self, argument: &'static str) -> Result<NodeRef, ParseError> {
        let word = self.word(argument)?;
        word.parse()
            .map_err(|_| ParseError::InvalidNodeRef(word.to_string()))
    }

    fn text(&mut self, argument: &'static str) -> Result<String, ParseError> {
        Ok(text_value(self.next(argument)?))
    }

    fn optional_text(&mut self) -> Option<String> {
        self.pairs.next().map(text_value)
    }

    fn finish(mut self) -> Result<(), ParseError> {
        match self.pairs.next() {
            Some(pair) => Err(ParseError::UnexpectedInput(pair.as_str().trim().to_string())),
            None => Ok(()),
        }
    }
}

fn text_value(pair: Pair<'_, Rule>) -> String {
    match pair.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted => inner
            .into_inner()
            .next()
            .map(|chars| unescape(chars.as_str()))
            .unwrap_or_default(),
        Some(inner) => inner.as_str().trim_end().to_string(),
        None => String::new(),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
