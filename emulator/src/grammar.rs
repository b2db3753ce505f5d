//! Parser for the emulator console.
//!
//! Each line is a keyword followed by at most one argument. Keywords and
//! arguments match case-insensitively; durations take an `ms`, `s` or `m`
//! suffix and default to milliseconds.

use std::time::Duration;

use winnow::ascii::{Caseless, alpha1, digit1, space0, space1};
use winnow::combinator::{alt, cut_err, delimited, eof, opt, preceded, terminated};
use winnow::error::{ContextError, ErrMode, ParseError, StrContext, StrContextValue};
use winnow::prelude::*;

/// Structured commands produced by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    InnerSwitch { open: bool },
    OuterSwitch { closed: bool },
    Sensor(SensorPlacement),
    Advance(Duration),
    Next,
    Status,
    History,
    Help(Option<&'a str>),
}

/// Where the outer door sits relative to its end-stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorPlacement {
    Open,
    Closed,
    Between,
    Both,
}

impl SensorPlacement {
    /// `(open, closed)` sensor levels.
    pub const fn levels(self) -> (bool, bool) {
        match self {
            SensorPlacement::Open => (true, false),
            SensorPlacement::Closed => (false, true),
            SensorPlacement::Between => (false, false),
            SensorPlacement::Both => (true, true),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Keyword {
    Inner,
    Outer,
    Sensor,
    Advance,
    Next,
    Status,
    History,
    Help,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("inner", Keyword::Inner),
    ("outer", Keyword::Outer),
    ("sensor", Keyword::Sensor),
    ("advance", Keyword::Advance),
    ("next", Keyword::Next),
    ("status", Keyword::Status),
    ("history", Keyword::History),
    ("help", Keyword::Help),
];

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map(|(_, keyword)| *keyword)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Unit {
    Millis,
    Seconds,
    Minutes,
}

impl Unit {
    fn duration(self, value: u64) -> Option<Duration> {
        match self {
            Unit::Millis => Some(Duration::from_millis(value)),
            Unit::Seconds => Some(Duration::from_secs(value)),
            Unit::Minutes => value.checked_mul(60).map(Duration::from_secs),
        }
    }
}

/// Parse a console command from the provided line.
pub fn parse(line: &str) -> Result<Command<'_>, ParseError<&str, ContextError>> {
    delimited(space0, command, end_of_command).parse(line)
}

fn command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    match keyword(input)? {
        Keyword::Inner => argument(switch_position("open", "close"))
            .map(|open| Command::InnerSwitch { open })
            .parse_next(input),
        Keyword::Outer => argument(switch_position("close", "open"))
            .map(|closed| Command::OuterSwitch { closed })
            .parse_next(input),
        Keyword::Sensor => argument(sensor_placement)
            .map(Command::Sensor)
            .parse_next(input),
        Keyword::Advance => argument(duration).map(Command::Advance).parse_next(input),
        Keyword::Next => Ok(Command::Next),
        Keyword::Status => Ok(Command::Status),
        Keyword::History => Ok(Command::History),
        Keyword::Help => opt(preceded(space1, alpha1))
            .map(Command::Help)
            .parse_next(input),
    }
}

fn keyword(input: &mut &str) -> ModalResult<Keyword> {
    alpha1
        .verify_map(Keyword::from_word)
        .context(StrContext::Label("command"))
        .context(StrContext::Expected(StrContextValue::Description(
            "inner, outer, sensor, advance, next, status, history or help",
        )))
        .parse_next(input)
}

/// A mandatory argument after the keyword.
fn argument<'a, O, P>(parser: P) -> impl Parser<&'a str, O, ErrMode<ContextError>>
where
    P: Parser<&'a str, O, ErrMode<ContextError>>,
{
    cut_err(preceded(space1, parser))
}

fn switch_position<'a>(
    asserted: &'static str,
    released: &'static str,
) -> impl Parser<&'a str, bool, ErrMode<ContextError>> {
    alt((
        Caseless(asserted).value(true),
        Caseless(released).value(false),
    ))
    .context(StrContext::Label("switch position"))
    .context(StrContext::Expected(StrContextValue::Description(
        "open or close",
    )))
}

fn sensor_placement(input: &mut &str) -> ModalResult<SensorPlacement> {
    alt((
        Caseless("open").value(SensorPlacement::Open),
        Caseless("closed").value(SensorPlacement::Closed),
        Caseless("none").value(SensorPlacement::Between),
        Caseless("both").value(SensorPlacement::Both),
    ))
    .context(StrContext::Label("sensor placement"))
    .context(StrContext::Expected(StrContextValue::Description(
        "open, closed, none or both",
    )))
    .parse_next(input)
}

fn duration(input: &mut &str) -> ModalResult<Duration> {
    (digit1.parse_to::<u64>(), opt(unit))
        .verify_map(|(value, unit)| unit.unwrap_or(Unit::Millis).duration(value))
        .context(StrContext::Label("duration"))
        .context(StrContext::Expected(StrContextValue::Description(
            "a count with an ms, s or m suffix",
        )))
        .parse_next(input)
}

fn unit(input: &mut &str) -> ModalResult<Unit> {
    alt((
        Caseless("ms").value(Unit::Millis),
        Caseless("min").value(Unit::Minutes),
        Caseless("s").value(Unit::Seconds),
        Caseless("m").value(Unit::Minutes),
    ))
    .parse_next(input)
}

fn end_of_command(input: &mut &str) -> ModalResult<()> {
    terminated(space0, eof)
        .void()
        .context(StrContext::Expected(StrContextValue::Description(
            "end of command",
        )))
        .parse_next(input)
}
