//! Classification of one prompt line into a [`ParsedCommand`].

/// A classified operator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// Blank line: press enter on the device.
    Empty,
    Quit,
    PowerOn,
    PowerOff,
    DisableDevOptions,
    ListDevices,
    /// Set the Termux user password.
    SetPassword(String),
    /// Install a file or a name looked up under the search root.
    Install(String),
    Push(String),
    Pull(String),
    /// Typed on the device, followed by enter.
    RawText(String),
}

const LITERALS: [(&str, ParsedCommand); 5] = [
    (".quit", ParsedCommand::Quit),
    (".on_screen", ParsedCommand::PowerOn),
    (".off_screen", ParsedCommand::PowerOff),
    (".dev-off", ParsedCommand::DisableDevOptions),
    (".get-devices", ParsedCommand::ListDevices),
];

const PREFIXES: [(&str, fn(String) -> ParsedCommand); 4] = [
    (".termux-passwd ", ParsedCommand::SetPassword),
    (".install ", ParsedCommand::Install),
    (".push ", ParsedCommand::Push),
    (".pull ", ParsedCommand::Pull),
];

impl ParsedCommand {
    /// Classify `line` in a single pass.
    ///
    /// Literals must match the whole line; a prefix command with nothing
    /// after its prefix falls through to [`RawText`](Self::RawText).
    pub fn classify(line: &str) -> Self {
        if line.is_empty() {
            return Self::Empty;
        }
        if let Some((_, command)) = LITERALS.iter().find(|(literal, _)| *literal == line) {
            return command.clone();
        }
        PREFIXES
            .iter()
            .find_map(|(prefix, build)| {
                let argument = line.strip_prefix(prefix)?;
                (!argument.trim().is_empty()).then(|| build(argument.to_owned()))
            })
            .unwrap_or_else(|| Self::RawText(line.to_owned()))
    }
}
