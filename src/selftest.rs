use std::fmt;

use crate::error::{Error, Result};
use crate::session::{Command, Output, Session};

/// First expectation of the scenario that did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub command: Command,
    pub expected: String,
    pub actual: Result<Output>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' expected {}, got {:?}",
            self.command, self.expected, self.actual
        )
    }
}

fn expect(
    session: &mut Session,
    command: Command,
    expected: Result<Output>,
) -> std::result::Result<(), Failure> {
    let actual = session.execute(command);
    if actual == expected {
        Ok(())
    } else {
        Err(Failure {
            command,
            expected: format!("{:?}", expected),
            actual,
        })
    }
}

// Print the array and check its bit string is `size` copies of `bit`
fn expect_rendering<F>(
    session: &mut Session,
    size: i64,
    bit: char,
    emit: &mut F,
) -> std::result::Result<(), Failure>
where
    F: FnMut(&str),
{
    let actual = session.execute(Command::Print);
    if let Ok(Output::Rendering(rendering)) = &actual {
        let bits: String = rendering.lines().skip(2).collect();
        if bits.len() as i64 == size && bits.chars().all(|c| c == bit) {
            emit(rendering.as_str());
            return Ok(());
        }
    }
    Err(Failure {
        command: Command::Print,
        expected: format!("{} bits all '{}'", size, bit),
        actual,
    })
}

/// Walks a fresh session through construction, deletion, printing, setting,
/// unsetting, sizing and reading an array of `size` bits, then checks that the
/// deleted handle is rejected. Renderings are passed to `emit`. `size` must
/// be at least one.
pub fn run<F>(size: u32, mut emit: F) -> std::result::Result<(), Failure>
where
    F: FnMut(&str),
{
    let size = i64::from(size);
    let length = size as usize;
    let mut session = Session::new();
    let out_of_bounds = |index: i64| -> Result<Output> {
        Err(Error::IndexOutOfBounds {
            index,
            size: length,
        })
    };

    log::info!("Testing: construction");
    expect(&mut session, Command::New(0), Err(Error::InvalidSize(0)))?;
    expect(&mut session, Command::New(-1), Err(Error::InvalidSize(-1)))?;
    expect(&mut session, Command::New(1), Ok(Output::Nothing))?;
    expect(&mut session, Command::Get(0), Ok(Output::Bit(0)))?;
    expect(&mut session, Command::Set(0), Ok(Output::Nothing))?;
    expect(&mut session, Command::Get(0), Ok(Output::Bit(1)))?;
    expect(
        &mut session,
        Command::Set(1),
        Err(Error::IndexOutOfBounds { index: 1, size: 1 }),
    )?;

    log::info!("Testing: deletion");
    expect(&mut session, Command::Delete, Ok(Output::Nothing))?;
    expect(&mut session, Command::Delete, Err(Error::InvalidHandle))?;

    log::info!("Testing: printing");
    expect(&mut session, Command::Print, Err(Error::InvalidHandle))?;
    expect(&mut session, Command::New(size), Ok(Output::Nothing))?;
    expect_rendering(&mut session, size, '0', &mut emit)?;

    log::info!("Testing: set");
    expect(&mut session, Command::Set(-1), out_of_bounds(-1))?;
    expect(&mut session, Command::Set(size), out_of_bounds(size))?;
    for index in 0..size {
        expect(&mut session, Command::Set(index), Ok(Output::Nothing))?;
    }
    expect_rendering(&mut session, size, '1', &mut emit)?;

    log::info!("Testing: unset");
    expect(&mut session, Command::Unset(-1), out_of_bounds(-1))?;
    expect(&mut session, Command::Unset(size), out_of_bounds(size))?;
    for index in 0..size {
        expect(&mut session, Command::Unset(index), Ok(Output::Nothing))?;
    }
    expect_rendering(&mut session, size, '0', &mut emit)?;

    log::info!("Testing: size");
    expect(&mut session, Command::Size, Ok(Output::Size(length)))?;

    log::info!("Testing: get");
    expect(&mut session, Command::Get(-1), out_of_bounds(-1))?;
    expect(&mut session, Command::Get(size), out_of_bounds(size))?;
    for index in 0..size {
        expect(&mut session, Command::Get(index), Ok(Output::Bit(0)))?;
    }

    expect(&mut session, Command::Delete, Ok(Output::Nothing))?;
    expect(&mut session, Command::Get(0), Err(Error::InvalidHandle))?;
    expect(&mut session, Command::Size, Err(Error::InvalidHandle))?;

    log::info!("All bit array checks passed");
    Ok(())
}
