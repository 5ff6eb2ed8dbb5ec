//! `#pragma nodebook <mode>` directive on the first source line

/// Directive prefix
pub const PRAGMA_PREFIX: &str = "#pragma nodebook";

/// Mode token that opts a run out of the lineage protocol
pub const MODE_OFF: &str = "off";

/// Parsed mode argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Run verbatim outside the graph
    Off,
    /// Any other argument; carries no meaning
    Other(String),
}

/// A directive found on the first line of a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Requested mode
    pub mode: Mode,
}

impl Directive {
    /// Parse the first line of `source`.
    ///
    /// The prefix must be followed by a single whitespace separator (or end
    /// of line); the rest of the line, right-trimmed, is the mode.
    #[must_use]
    pub fn parse(source: &str) -> Option<Self> {
        let first_line = source.lines().next()?;
        let rest = first_line.strip_prefix(PRAGMA_PREFIX)?;

        let mut chars = rest.chars();
        let argument = match chars.next() {
            None => "",
            Some(sep) if sep.is_whitespace() => chars.as_str(),
            Some(_) => return None,
        };
        let argument = argument.trim_end();

        let mode = if argument == MODE_OFF {
            Mode::Off
        } else {
            Mode::Other(argument.to_string())
        };
        Some(Self { mode })
    }

    /// Whether `source` opts out of lineage rewriting
    #[must_use]
    pub fn opts_out(source: &str) -> bool {
        matches!(Self::parse(source), Some(Self { mode: Mode::Off }))
    }
}
