use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::ops::Add;
use std::path::{Path, PathBuf};
use std::time::Duration;

use closure_core::config::TimingConfig;
use closure_core::dispatch::{Dispatched, Dispatcher};
use closure_core::indicator::BlinkCounter;
use closure_core::io::{InputId, InputLevels, PinSampler, input_by_id};
use closure_core::motor::{ALL_MOTOR_LINES, MotorLine, MotorLines};
use closure_core::schedule::MonotonicInstant;

use crate::grammar::{self, Command};

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "inner",
        "inner <open|close>              - set the inner door switch",
    ),
    (
        "outer",
        "outer <open|close>              - set the outer door switch",
    ),
    (
        "sensor",
        "sensor <open|closed|none|both>  - place the outer door on its end-stops",
    ),
    (
        "advance",
        "advance <duration>              - run the clock forward (e.g. 500ms, 8s, 4m)",
    ),
    (
        "next",
        "next                            - run the clock to the next pending deadline",
    ),
    (
        "status",
        "status                          - display controller state and outputs",
    ),
    (
        "history",
        "history                         - list recent transitions",
    ),
    (
        "help",
        "help [topic]                    - show help for a command",
    ),
];

/// Power-on input levels: both doors resting open.
const BOOT_LEVELS: InputLevels = InputLevels::new(true, false, true, false);

/// Simulated monotonic clock in microseconds since power-on.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct SimInstant(u64);

impl SimInstant {
    pub fn as_millis(self) -> u64 {
        self.0 / 1_000
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(micros))
    }
}

impl MonotonicInstant for SimInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    /// Divides every controller duration.
    pub fast: u32,
    pub transcript: Option<PathBuf>,
}

/// Motor outputs shown by `status`.
#[derive(Default)]
struct EmulatedMotorLines {
    levels: [bool; 4],
}

impl EmulatedMotorLines {
    fn high(&self) -> Vec<MotorLine> {
        ALL_MOTOR_LINES
            .into_iter()
            .filter(|line| self.levels[line.as_index()])
            .collect()
    }
}

impl MotorLines for EmulatedMotorLines {
    fn assert(&mut self, line: MotorLine) {
        self.levels[line.as_index()] = true;
    }

    fn release(&mut self, line: MotorLine) {
        self.levels[line.as_index()] = false;
    }
}

/// Input pins as the operator left them.
struct EmulatedPins {
    levels: InputLevels,
}

impl PinSampler for EmulatedPins {
    fn pin_high(&mut self, id: InputId) -> bool {
        input_by_id(id).polarity.normalize(self.levels.get(id))
    }
}

type EmulatedDispatcher = Dispatcher<SimInstant, EmulatedMotorLines, BlinkCounter>;

pub struct Session {
    dispatcher: EmulatedDispatcher,
    pins: EmulatedPins,
    now: SimInstant,
    blink_tick: Duration,
    pending: Vec<Dispatched>,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        let timing = TimingConfig::DEFAULT.scaled_down(options.fast.max(1));
        let mut dispatcher = EmulatedDispatcher::new(
            EmulatedMotorLines::default(),
            BlinkCounter::new(),
            timing,
        )
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

        let transcript = match options.transcript {
            Some(path) => Some(TranscriptLogger::new(&path, options.fast.max(1))?),
            None => None,
        };

        let now = SimInstant::default();
        let pending = dispatcher.boot(now, BOOT_LEVELS).into_iter().collect();

        Ok(Self {
            dispatcher,
            pins: EmulatedPins {
                levels: BOOT_LEVELS,
            },
            now,
            blink_tick: timing.blink_tick(),
            pending,
            transcript,
        })
    }

    /// Lines describing the power-on transition.
    pub fn boot_report(&mut self) -> Vec<String> {
        let mut lines = vec![format!("boot: {}", describe_levels(self.pins.levels))];
        lines.extend(self.drain_transitions());
        lines
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let at = self.now.as_millis();
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.append_line(at, TranscriptRole::Host, trimmed)?;
        }

        let lines = match grammar::parse(trimmed) {
            Ok(command) => self.execute(command),
            Err(err) => {
                let mut lines = vec!["ERR syntax".to_string()];
                lines.extend(err.to_string().lines().map(|line| format!("  {line}")));
                lines
            }
        };

        self.record_output(&lines)?;
        Ok(lines)
    }

    fn execute(&mut self, command: Command<'_>) -> Vec<String> {
        match command {
            Command::InnerSwitch { open } => self.set_input(InputId::SwitchInnerOpen, open),
            Command::OuterSwitch { closed } => self.set_input(InputId::SwitchOuterClosed, closed),
            Command::Sensor(placement) => {
                let (open, closed) = placement.levels();
                self.pins.levels = self
                    .pins
                    .levels
                    .with(InputId::SensorOpen, open)
                    .with(InputId::SensorClosed, closed);
                self.pin_changed()
            }
            Command::Advance(duration) => {
                self.advance(duration);
                self.report_advance()
            }
            Command::Next => match self.dispatcher.next_wakeup() {
                Some(wakeup) => {
                    let wait = wakeup.saturating_duration_since(self.now);
                    self.advance(wait);
                    self.report_advance()
                }
                None => vec!["nothing scheduled".to_string()],
            },
            Command::Status => self.status_lines(),
            Command::History => self.history_lines(),
            Command::Help(topic) => handle_help(topic),
        }
    }

    fn set_input(&mut self, id: InputId, value: bool) -> Vec<String> {
        self.pins.levels = self.pins.levels.with(id, value);
        self.pin_changed()
    }

    /// Registers the edge and lets the debouncer settle.
    fn pin_changed(&mut self) -> Vec<String> {
        self.dispatcher.pin_changed(self.now);
        let settle = self.dispatcher.debouncer().settle();
        self.advance(settle);

        let mut lines = vec![format!("pins: {}", describe_levels(self.pins.levels))];
        lines.extend(self.drain_transitions());
        lines
    }

    /// Runs the clock forward, servicing every deadline on the way and
    /// ticking the indicator counter.
    fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        loop {
            let step_to = self
                .dispatcher
                .next_wakeup()
                .filter(|wakeup| *wakeup <= target)
                .unwrap_or(target)
                .max(self.now);
            self.tick_indicator(step_to);
            self.now = step_to;

            let pending = &mut self.pending;
            self.dispatcher
                .service(self.now, &mut self.pins, |dispatched| pending.push(*dispatched));

            if self.now >= target {
                break;
            }
        }
    }

    fn tick_indicator(&mut self, until: SimInstant) {
        let tick = u64::try_from(self.blink_tick.as_micros())
            .unwrap_or(u64::MAX)
            .max(1);
        let ticks = until.0 / tick - self.now.0 / tick;
        let counter = self.dispatcher.controller_mut().indicator_mut().timer_mut();
        counter.advance(u32::try_from(ticks).unwrap_or(u32::MAX));
    }

    fn report_advance(&mut self) -> Vec<String> {
        let mut lines = self.drain_transitions();
        lines.push(format!(
            "t={}ms {}",
            self.now.as_millis(),
            self.dispatcher.state().action
        ));
        lines
    }

    fn drain_transitions(&mut self) -> Vec<String> {
        let history = self.dispatcher.history();
        self.pending
            .drain(..)
            .map(|dispatched| {
                let at = history
                    .oldest_first()
                    .find(|record| record.id == dispatched.id)
                    .map_or(self.now.as_millis(), |record| record.at.as_millis());
                format!(
                    "[t={at}ms] {} -> {} ({}) next in {}",
                    dispatched.transition.from,
                    dispatched.transition.to,
                    dispatched.cause,
                    format_duration_short(dispatched.transition.rearm)
                )
            })
            .collect()
    }

    fn status_lines(&self) -> Vec<String> {
        let controller = self.dispatcher.controller();
        let state = controller.state();
        let lines_high = controller.motors().lines().high();
        let motors = if lines_high.is_empty() {
            "none".to_string()
        } else {
            lines_high
                .iter()
                .map(|line| format!("{}({})", line.name(), line.mcu_pin()))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let counter = controller.indicator().timer();
        let lamp = match (controller.indicator().is_enabled(), counter.lamp_lit()) {
            (false, _) => "steady",
            (true, true) => "blinking (lit)",
            (true, false) => "blinking (dark)",
        };
        let next = self.dispatcher.scheduler().action_deadline().map_or_else(
            || "none".to_string(),
            |deadline| format_duration_short(deadline.saturating_duration_since(self.now)),
        );

        vec![
            format!("t={}ms action={}", self.now.as_millis(), state.action),
            format!("inputs: {}", describe_levels(state.levels())),
            format!(
                "inner_done={} outer_done={}",
                state.inner_done,
                state.outer_done()
            ),
            format!("motors: {motors}"),
            format!("lamp: {lamp}"),
            format!("deadline in {next}"),
        ]
    }

    fn history_lines(&self) -> Vec<String> {
        let history = self.dispatcher.history();
        if history.is_empty() {
            return vec!["no transitions recorded".to_string()];
        }

        let mut lines = vec![format!(
            "transitions (showing {} of {})",
            history.len(),
            history.total()
        )];
        for record in history.oldest_first() {
            let gap = record
                .elapsed_since_previous
                .map_or_else(String::new, |gap| {
                    format!(" +{}", format_duration_short(gap))
                });
            lines.push(format!("  t={}ms {record}{gap}", record.at.as_millis()));
        }
        lines
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        let at = self.now.as_millis();
        if let Some(transcript) = self.transcript.as_mut() {
            for line in lines {
                transcript.append_line(at, TranscriptRole::Emulator, line)?;
            }
        }
        Ok(())
    }
}

fn handle_help(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) if !target.is_empty() => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        _ => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

struct TranscriptLogger {
    writer: BufWriter<fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path, fast: u32) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        writeln!(
            logger.writer,
            "# Closure Controller Emulator transcript (speed-up x{fast})"
        )?;
        logger.writer.flush()?;
        Ok(logger)
    }

    fn append_line(&mut self, at_ms: u64, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            at_ms,
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_levels(levels: InputLevels) -> String {
    let sensors = match (levels.sens_open, levels.sens_closed) {
        (true, true) => "both",
        (true, false) => "open",
        (false, true) => "closed",
        (false, false) => "none",
    };
    format!(
        "inner={} outer={} sensor={sensors}",
        if levels.sw_inner_open { "open" } else { "close" },
        if levels.sw_outer_closed { "close" } else { "open" },
    )
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
