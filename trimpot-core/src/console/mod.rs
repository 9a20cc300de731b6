//! Line console
//!
//! Resolves one operator line against the command and parameter tables
//! and runs the handler matching the number of arguments given.
//!
//! ```text
//! line ──► command ──► [blank] ──► terminator? ──► handler()
//!                                      │
//!                                      ▼
//!                                  parameter ──► handler(index)
//!                                      │
//!                                      ▼
//!                              [blank] literal ──► handler(index, value)
//! ```
//!
//! A handler returning `true` is acknowledged with `OK`. Lookup and
//! parse failures produce exactly one `!` diagnostic line.

pub mod commands;
pub mod handlers;
pub mod parse;

use core::fmt;

use trimpot_hal::EepromStorage;
use trimpot_protocol::{Diagnostic, Reply};

use crate::registry::Registry;
use crate::watch::WatchList;

pub use commands::COMMANDS;
pub use parse::{Cursor, MAX_LITERAL};

/// Everything a handler may touch while serving one line
pub struct Context<'c, 'a> {
    pub registry: &'c Registry<'a>,
    pub store: &'c mut dyn EepromStorage,
    pub watch: &'c mut WatchList,
    pub out: &'c mut dyn fmt::Write,
}

/// Handler for a bare command
pub type Handler0 = fn(&mut Context<'_, '_>) -> bool;
/// Handler taking a parameter index
pub type Handler1 = fn(&mut Context<'_, '_>, usize) -> bool;
/// Handler taking a parameter index and a value
pub type Handler2 = fn(&mut Context<'_, '_>, usize, i32) -> bool;

/// Whether a command modifies the addressed parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Read,
    /// Rejected on variables
    Write,
}

/// One operator verb
#[derive(Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub access: Access,
    pub on_none: Option<Handler0>,
    pub on_param: Option<Handler1>,
    pub on_value: Option<Handler2>,
    pub help: &'static str,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("access", &self.access)
            .field("on_none", &self.on_none.is_some())
            .field("on_param", &self.on_param.is_some())
            .field("on_value", &self.on_value.is_some())
            .finish()
    }
}

/// Reasons a line was rejected before reaching a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleError {
    CommandNotFound,
    ParameterNotFound,
    /// Write command aimed at a variable
    VariableNotWritable,
    /// Literal magnitude above [`MAX_LITERAL`]
    ValueOutOfRange,
    ValueRequired,
}

impl From<ConsoleError> for Diagnostic {
    fn from(err: ConsoleError) -> Self {
        match err {
            ConsoleError::CommandNotFound => Diagnostic::CommandNotFound,
            ConsoleError::ParameterNotFound => Diagnostic::ParameterNotFound,
            ConsoleError::VariableNotWritable => Diagnostic::VariableNotWritable,
            ConsoleError::ValueOutOfRange => Diagnostic::ValueNotInRange,
            ConsoleError::ValueRequired => Diagnostic::ValueRequired,
        }
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Diagnostic::from(*self), f)
    }
}

/// Resolve `line` and run its handler
///
/// Returns the handler's result, or `Ok(false)` when a value was parsed
/// for a command with no two-argument handler. Nothing is written to
/// `ctx.out` on error; the caller reports it.
pub fn dispatch(ctx: &mut Context<'_, '_>, line: &[u8]) -> Result<bool, ConsoleError> {
    let registry = ctx.registry;
    let mut cursor = Cursor::new(line);

    let command = registry
        .find_command(cursor.rest())
        .map(|index| registry.commands()[index])
        .ok_or(ConsoleError::CommandNotFound)?;
    cursor.advance(command.name.len());
    cursor.skip_blank();

    if cursor.at_terminator() {
        if let Some(handler) = command.on_none {
            return Ok(handler(ctx));
        }
        // No bare form: fall through, parameter lookup reports it
    }

    let index = registry
        .find_param(cursor.rest())
        .ok_or(ConsoleError::ParameterNotFound)?;
    let param = &registry.params()[index];

    if command.access == Access::Write && param.is_variable() {
        return Err(ConsoleError::VariableNotWritable);
    }

    if let Some(handler) = command.on_param {
        return Ok(handler(ctx, index));
    }

    cursor.advance(param.name.len());
    cursor.skip_blank();
    let value = parse::signed_literal(&mut cursor)?;

    Ok(match command.on_value {
        Some(handler) => handler(ctx, index, value),
        None => false,
    })
}

/// Console session: registry, persistent store and watch list
pub struct Console<'a, S: EepromStorage> {
    registry: &'a Registry<'a>,
    store: S,
    watch: WatchList,
}

impl<'a, S: EepromStorage> Console<'a, S> {
    pub fn new(registry: &'a Registry<'a>, store: S) -> Self {
        Self {
            registry,
            store,
            watch: WatchList::new(),
        }
    }

    /// Load every parameter from the store or its init value
    ///
    /// Returns the number of values changed.
    pub fn boot(&mut self) -> usize {
        self.registry.load_all(&mut self.store)
    }

    /// Serve one input line, terminator included
    ///
    /// Writes the handler output followed by `OK` on success, or one
    /// diagnostic line when the line was rejected. Output that does not
    /// fit `out` is truncated.
    pub fn handle_line<W: fmt::Write>(
        &mut self,
        line: &[u8],
        out: &mut W,
    ) -> Result<bool, ConsoleError> {
        let result = {
            let mut ctx = Context {
                registry: self.registry,
                store: &mut self.store,
                watch: &mut self.watch,
                out: &mut *out,
            };
            dispatch(&mut ctx, line)
        };

        let _ = match result {
            Ok(true) => Reply::Ack.write_to(out),
            Ok(false) => Ok(()),
            Err(err) => Reply::Diagnostic(err.into()).write_to(out),
        };
        result
    }

    /// Write the periodic watch line, if anything is watched
    pub fn report_watched<W: fmt::Write>(&self, out: &mut W) -> Result<bool, fmt::Error> {
        self.watch.report(self.registry, out)
    }

    pub fn registry(&self) -> &'a Registry<'a> {
        self.registry
    }

    pub fn watch(&self) -> &WatchList {
        &self.watch
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
