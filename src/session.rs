use std::fmt;

use crate::bitarray::{BitArray, DEFAULT_WRAP_WIDTH};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    New(i64),
    Delete,
    Set(i64),
    Unset(i64),
    Get(i64),
    Size,
    Print,
}

impl Command {
    /// Parses one script line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str, line_number: usize) -> Result<Option<Command>> {
        let line = match line.split_once('#') {
            Some((code, _)) => code,
            None => line,
        };
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(parse_error(
                line_number,
                format!("unexpected argument '{}' to '{}'", extra, name),
            ));
        }

        let number = |argument: Option<&str>| -> Result<i64> {
            let argument = argument.ok_or_else(|| {
                parse_error(line_number, format!("'{}' expects a number", name))
            })?;
            argument.parse::<i64>().map_err(|_| {
                parse_error(line_number, format!("'{}' is not a number", argument))
            })
        };
        let bare = |command: Command| -> Result<Command> {
            match argument {
                Some(argument) => Err(parse_error(
                    line_number,
                    format!("unexpected argument '{}' to '{}'", argument, name),
                )),
                None => Ok(command),
            }
        };

        let command = match name {
            "new" => Command::New(number(argument)?),
            "delete" => bare(Command::Delete)?,
            "set" => Command::Set(number(argument)?),
            "unset" => Command::Unset(number(argument)?),
            "get" => Command::Get(number(argument)?),
            "size" => bare(Command::Size)?,
            "print" => bare(Command::Print)?,
            _ => {
                return Err(parse_error(
                    line_number,
                    format!("unknown command '{}'", name),
                ))
            }
        };
        Ok(Some(command))
    }
}

fn parse_error(line: usize, message: String) -> Error {
    Error::Parse { line, message }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New(size) => write!(f, "new {}", size),
            Self::Delete => write!(f, "delete"),
            Self::Set(index) => write!(f, "set {}", index),
            Self::Unset(index) => write!(f, "unset {}", index),
            Self::Get(index) => write!(f, "get {}", index),
            Self::Size => write!(f, "size"),
            Self::Print => write!(f, "print"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Nothing,
    Bit(u8),
    Size(usize),
    Rendering(String),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nothing => Ok(()),
            Self::Bit(bit) => write!(f, "{}", bit),
            Self::Size(size) => write!(f, "{}", size),
            Self::Rendering(rendering) => write!(f, "{}", rendering),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failures: Vec<(usize, Error)>,
}

impl ScriptSummary {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Holds at most one live bit array. An empty slot stands for an array that
/// was never created or has been deleted.
#[derive(Debug)]
pub struct Session {
    slot: Option<BitArray>,
    wrap_width: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_wrap_width(DEFAULT_WRAP_WIDTH)
    }

    pub fn with_wrap_width(wrap_width: usize) -> Self {
        Self {
            slot: None,
            wrap_width,
        }
    }

    pub fn array(&self) -> Result<&BitArray> {
        self.slot.as_ref().ok_or(Error::InvalidHandle)
    }

    fn array_mut(&mut self) -> Result<&mut BitArray> {
        self.slot.as_mut().ok_or(Error::InvalidHandle)
    }

    pub fn execute(&mut self, command: Command) -> Result<Output> {
        let result = self.apply(command);
        if let Err(error) = &result {
            log::debug!("'{}' rejected: {}", command, error);
        }
        result
    }

    fn apply(&mut self, command: Command) -> Result<Output> {
        match command {
            Command::New(size) => {
                let array = BitArray::with_signed_size(size)?;
                if let Some(previous) = self.slot.replace(array) {
                    previous.destroy();
                }
                Ok(Output::Nothing)
            }
            Command::Delete => {
                self.slot.take().ok_or(Error::InvalidHandle)?.destroy();
                Ok(Output::Nothing)
            }
            Command::Set(index) => {
                let array = self.array_mut()?;
                let position = array.checked_position(index)?;
                array.set_bit(position)?;
                Ok(Output::Nothing)
            }
            Command::Unset(index) => {
                let array = self.array_mut()?;
                let position = array.checked_position(index)?;
                array.unset_bit(position)?;
                Ok(Output::Nothing)
            }
            Command::Get(index) => {
                let array = self.array()?;
                let position = array.checked_position(index)?;
                Ok(Output::Bit(array.get_bit(position)?))
            }
            Command::Size => Ok(Output::Size(self.array()?.len())),
            Command::Print => {
                let rendering = self.array()?.render_wrapped(self.wrap_width).to_string();
                Ok(Output::Rendering(rendering))
            }
        }
    }

    /// Runs every command in `script`, handing each output to `emit`. Stops at
    /// the first failing line unless `keep_going` is set.
    pub fn run_script<F>(&mut self, script: &str, keep_going: bool, mut emit: F) -> ScriptSummary
    where
        F: FnMut(&Output),
    {
        let mut summary = ScriptSummary::default();

        for (index, line) in script.lines().enumerate() {
            let line_number = index + 1;
            let result = Command::parse(line, line_number).and_then(|command| match command {
                Some(command) => self.execute(command).map(Some),
                None => Ok(None),
            });

            match result {
                Ok(Some(output)) => {
                    summary.executed += 1;
                    emit(&output);
                }
                Ok(None) => {}
                Err(error) => {
                    match &error {
                        Error::Parse { .. } => log::warn!("{}", error),
                        _ => log::warn!("line {}: {}", line_number, error),
                    }
                    summary.failures.push((line_number, error));
                    if !keep_going {
                        break;
                    }
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, Output, Session};
    use crate::error::Error;

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("new 16", 1), Ok(Some(Command::New(16))));
        assert_eq!(Command::parse("  get -1  ", 1), Ok(Some(Command::Get(-1))));
        assert_eq!(Command::parse("print # show it", 1), Ok(Some(Command::Print)));
        assert_eq!(Command::parse("", 1), Ok(None));
        assert_eq!(Command::parse("# comment only", 1), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Command::parse("flip 3", 4),
            Err(Error::Parse { line: 4, .. })
        ));
        assert!(matches!(
            Command::parse("set", 2),
            Err(Error::Parse { line: 2, .. })
        ));
        assert!(matches!(
            Command::parse("set x", 1),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            Command::parse("size 3", 1),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            Command::parse("get 1 2", 1),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_empty_slot_is_invalid_handle() {
        let mut session = Session::new();
        for command in [
            Command::Delete,
            Command::Set(0),
            Command::Unset(0),
            Command::Get(0),
            Command::Size,
            Command::Print,
        ] {
            assert_eq!(session.execute(command), Err(Error::InvalidHandle));
        }
    }

    #[test]
    fn test_delete_then_use() {
        let mut session = Session::new();
        session.execute(Command::New(8)).unwrap();
        assert_eq!(session.execute(Command::Delete), Ok(Output::Nothing));
        assert_eq!(session.execute(Command::Delete), Err(Error::InvalidHandle));
        assert_eq!(session.execute(Command::Get(0)), Err(Error::InvalidHandle));
        assert!(session.array().is_err());
    }

    #[test]
    fn test_commands() {
        let mut session = Session::new();
        assert_eq!(session.execute(Command::New(0)), Err(Error::InvalidSize(0)));
        assert_eq!(session.execute(Command::New(-3)), Err(Error::InvalidSize(-3)));

        session.execute(Command::New(16)).unwrap();
        assert_eq!(session.execute(Command::Size), Ok(Output::Size(16)));
        session.execute(Command::Set(9)).unwrap();
        assert_eq!(session.execute(Command::Get(9)), Ok(Output::Bit(1)));
        assert_eq!(
            session.execute(Command::Set(-1)),
            Err(Error::IndexOutOfBounds { index: -1, size: 16 })
        );
        assert_eq!(
            session.execute(Command::Unset(16)),
            Err(Error::IndexOutOfBounds { index: 16, size: 16 })
        );
        session.execute(Command::Unset(9)).unwrap();
        assert_eq!(session.execute(Command::Get(9)), Ok(Output::Bit(0)));
    }

    #[test]
    fn test_failed_new_keeps_previous_array() {
        let mut session = Session::new();
        session.execute(Command::New(4)).unwrap();
        session.execute(Command::Set(3)).unwrap();
        assert!(session.execute(Command::New(0)).is_err());
        assert_eq!(session.execute(Command::Get(3)), Ok(Output::Bit(1)));

        session.execute(Command::New(4)).unwrap();
        assert_eq!(session.execute(Command::Get(3)), Ok(Output::Bit(0)));
    }

    #[test]
    fn test_print_uses_wrap_width() {
        let mut session = Session::with_wrap_width(4);
        session.execute(Command::New(6)).unwrap();
        session.execute(Command::Set(5)).unwrap();
        assert_eq!(
            session.execute(Command::Print),
            Ok(Output::Rendering("size: 6 bits\nbytes: 1\n0000\n01".to_string()))
        );
    }

    #[test]
    fn test_run_script_stops_at_first_failure() {
        let mut session = Session::new();
        let mut outputs = Vec::new();
        let summary = session.run_script("new 1\nset 0\nget 0\nset 1\nget 0\n", false, |output| {
            outputs.push(output.clone())
        });

        assert_eq!(summary.executed, 3);
        assert_eq!(
            summary.failures,
            vec![(4, Error::IndexOutOfBounds { index: 1, size: 1 })]
        );
        assert_eq!(outputs, vec![Output::Nothing, Output::Nothing, Output::Bit(1)]);
    }

    #[test]
    fn test_run_script_keep_going() {
        let mut session = Session::new();
        let summary = session.run_script("size\nnew 2\n\nbogus\nsize\n", true, |_| {});

        assert_eq!(summary.executed, 2);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0], (1, Error::InvalidHandle));
        assert!(matches!(summary.failures[1], (4, Error::Parse { line: 4, .. })));
        assert!(!summary.succeeded());
    }
}
