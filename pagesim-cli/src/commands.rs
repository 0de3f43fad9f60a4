use core::fmt;

/// One line of a driver script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Load(u16),
    Store(u16, u8),
    DumpMemory,
    DumpSwap,
    DumpTable,
}

#[derive(Debug, Clone)]
pub enum CommandError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    ExtraArguments(String),
    InvalidNumber(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(s) => write!(f, "unknown command \"{s}\""),
            Self::MissingArgument(s) => write!(f, "missing argument <{s}>"),
            Self::ExtraArguments(s) => write!(f, "unexpected trailing arguments \"{s}\""),
            Self::InvalidNumber(s) => write!(f, "\"{s}\" is not a number or quoted character"),
        }
    }
}

/// Parses one script line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let name = tokens.next().unwrap_or("");

    let command = match name {
        "load" => Command::Load(parse_address(tokens.next())?),
        "store" => {
            let address = parse_address(tokens.next())?;
            let value = parse_byte(tokens.next().ok_or(CommandError::MissingArgument("value"))?)?;
            Command::Store(address, value)
        }
        "memory" => Command::DumpMemory,
        "swap" => Command::DumpSwap,
        "table" => Command::DumpTable,
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };

    let rest: Vec<&str> = tokens.collect();
    if !rest.is_empty() {
        return Err(CommandError::ExtraArguments(rest.join(" ")));
    }

    Ok(Some(command))
}

fn parse_address(token: Option<&str>) -> Result<u16, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument("address"))?;
    token
        .parse()
        .map_err(|_| CommandError::InvalidNumber(token.to_string()))
}

/// A byte value, written either as a decimal number or as a quoted
/// character like `'A'`.
fn parse_byte(token: &str) -> Result<u8, CommandError> {
    let chars: Vec<char> = token.chars().collect();

    if chars.len() == 3 && chars[0] == '\'' && chars[2] == '\'' && chars[1].is_ascii() {
        return Ok(chars[1] as u8);
    }

    token
        .parse()
        .map_err(|_| CommandError::InvalidNumber(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_load_and_store() {
        assert_eq!(parse("load 1024").unwrap(), Some(Command::Load(1024)));
        assert_eq!(
            parse("store 1024 65").unwrap(),
            Some(Command::Store(1024, 65))
        );
        assert_eq!(
            parse("store 3072 'A'").unwrap(),
            Some(Command::Store(3072, b'A'))
        );
    }

    #[test]
    fn parses_dump_commands() {
        assert_eq!(parse("memory").unwrap(), Some(Command::DumpMemory));
        assert_eq!(parse("swap").unwrap(), Some(Command::DumpSwap));
        assert_eq!(parse("table").unwrap(), Some(Command::DumpTable));
    }

    #[test]
    fn skips_blanks_and_comments() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("# a comment").unwrap(), None);
        assert_eq!(
            parse("load 12 # trailing comment").unwrap(),
            Some(Command::Load(12))
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse("frobnicate"),
            Err(CommandError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse("load"),
            Err(CommandError::MissingArgument("address"))
        ));
        assert!(matches!(
            parse("store 10"),
            Err(CommandError::MissingArgument("value"))
        ));
        assert!(matches!(
            parse("load ten"),
            Err(CommandError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse("store 10 300"),
            Err(CommandError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse("load 1 2"),
            Err(CommandError::ExtraArguments(_))
        ));
    }
}
