//! Reply lines sent from the controller to the operator
//!
//! Replies are encoded as text through [`core::fmt::Write`] so the same
//! code fills a `heapless::String` on the target and a host buffer in
//! tests. Every line ends with [`EOL`].

use core::fmt::{self, Write};

/// Line ending for every reply
pub const EOL: &str = "\r\n";

/// Diagnostics reported for a rejected input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Diagnostic {
    /// No command name matches the start of the line
    CommandNotFound,
    /// No parameter name matches after the command
    ParameterNotFound,
    /// A write command was aimed at a read-only variable
    VariableNotWritable,
    /// Value rejected by the parameter bounds
    OutOfRange { value: i32, min: i32, max: i32 },
    /// A command needing a value got none
    ValueRequired,
    /// The literal does not fit the accepted width
    ValueNotInRange,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::CommandNotFound => f.write_str("Command not found"),
            Diagnostic::ParameterNotFound => f.write_str("Parameter not found"),
            Diagnostic::VariableNotWritable => {
                f.write_str("This command cannot be used with a Variable")
            }
            Diagnostic::OutOfRange { value, min, max } => {
                write!(f, "Value {} out of range [min:{} max:{}]", value, min, max)
            }
            Diagnostic::ValueRequired => f.write_str("Value required"),
            Diagnostic::ValueNotInRange => f.write_str("Value not in range"),
        }
    }
}

/// One reply line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// `# name:<NAME> value:<INT> init:<INT> min:<INT> max:<INT>`
    Definition {
        name: &'a str,
        value: i32,
        init: i32,
        min: i32,
        max: i32,
    },
    /// `? <NAME>:<HELP>` with an optional `[min:<INT> max:<INT>]` suffix
    Help {
        name: &'a str,
        help: &'a str,
        range: Option<(i32, i32)>,
    },
    /// `? <TITLE>` opening a help section
    Heading(&'a str),
    /// `?` closing a help section
    SectionEnd,
    /// `OK`
    Ack,
    /// `! <TEXT>`
    Diagnostic(Diagnostic),
}

impl fmt::Display for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Definition {
                name,
                value,
                init,
                min,
                max,
            } => write!(
                f,
                "# name:{} value:{} init:{} min:{} max:{}",
                name, value, init, min, max
            ),
            Reply::Help { name, help, range } => {
                write!(f, "? {}:{}", name, help)?;
                if let Some((min, max)) = range {
                    write!(f, " [min:{} max:{}]", min, max)?;
                }
                Ok(())
            }
            Reply::Heading(title) => write!(f, "? {}", title),
            Reply::SectionEnd => f.write_str("?"),
            Reply::Ack => f.write_str("OK"),
            Reply::Diagnostic(diagnostic) => write!(f, "! {}", diagnostic),
        }
    }
}

impl Reply<'_> {
    /// Write this reply as one terminated line
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        write!(out, "{}{}", self, EOL)
    }
}

impl From<Diagnostic> for Reply<'_> {
    fn from(diagnostic: Diagnostic) -> Self {
        Reply::Diagnostic(diagnostic)
    }
}

/// One `<NAME>:<INT>` pair of a watch report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchEntry<'a> {
    pub name: &'a str,
    pub value: i32,
}

impl fmt::Display for WatchEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.value)
    }
}

/// Write a watch report line of space-separated entries
///
/// Writes nothing at all for an empty iterator and returns `Ok(false)`;
/// returns `Ok(true)` once a line was written.
pub fn write_watch_line<'a, W, I>(out: &mut W, entries: I) -> Result<bool, fmt::Error>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = WatchEntry<'a>>,
{
    let mut written = false;
    for entry in entries {
        if written {
            out.write_char(' ')?;
        }
        write!(out, "{}", entry)?;
        written = true;
    }
    if written {
        out.write_str(EOL)?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn render(reply: Reply<'_>) -> String<96> {
        let mut out = String::new();
        reply.write_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_definition_line() {
        let line = render(Reply::Definition {
            name: "CTRL_MOD",
            value: 1,
            init: 1,
            min: 1,
            max: 3,
        });
        assert_eq!(line.as_str(), "# name:CTRL_MOD value:1 init:1 min:1 max:3\r\n");
    }

    #[test]
    fn test_help_line_with_and_without_range() {
        let param = render(Reply::Help {
            name: "I_MOT_MAX",
            help: "Max phase current A",
            range: Some((1, 40)),
        });
        assert_eq!(param.as_str(), "? I_MOT_MAX:Max phase current A [min:1 max:40]\r\n");

        let variable = render(Reply::Help {
            name: "SPD_AVG",
            help: "Motor Measured Avg RPM",
            range: None,
        });
        assert_eq!(variable.as_str(), "? SPD_AVG:Motor Measured Avg RPM\r\n");
    }

    #[test]
    fn test_diagnostic_lines() {
        assert_eq!(
            render(Diagnostic::CommandNotFound.into()).as_str(),
            "! Command not found\r\n"
        );
        assert_eq!(
            render(Diagnostic::VariableNotWritable.into()).as_str(),
            "! This command cannot be used with a Variable\r\n"
        );
        assert_eq!(
            render(
                Diagnostic::OutOfRange {
                    value: 999,
                    min: 1,
                    max: 40
                }
                .into()
            )
            .as_str(),
            "! Value 999 out of range [min:1 max:40]\r\n"
        );
        assert_eq!(
            render(Diagnostic::ValueNotInRange.into()).as_str(),
            "! Value not in range\r\n"
        );
    }

    #[test]
    fn test_section_lines() {
        assert_eq!(render(Reply::Heading("Commands")).as_str(), "? Commands\r\n");
        assert_eq!(render(Reply::SectionEnd).as_str(), "?\r\n");
        assert_eq!(render(Reply::Ack).as_str(), "OK\r\n");
    }

    #[test]
    fn test_watch_line() {
        let mut out: String<64> = String::new();
        let entries = [
            WatchEntry { name: "SPD_AVG", value: 120 },
            WatchEntry { name: "BATV", value: -3 },
        ];
        assert_eq!(write_watch_line(&mut out, entries), Ok(true));
        assert_eq!(out.as_str(), "SPD_AVG:120 BATV:-3\r\n");
    }

    #[test]
    fn test_empty_watch_line_writes_nothing() {
        let mut out: String<8> = String::new();
        assert_eq!(write_watch_line(&mut out, []), Ok(false));
        assert!(out.is_empty());
    }
}
