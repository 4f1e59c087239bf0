use serde::Deserialize;

/// Which field wins when a hook sets both `inline` and `command`.
///
/// - `Inline` (default): the shell script runs, `command` is ignored.
/// - `Command`: the external command runs, `inline` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandPrecedence {
    #[default]
    Inline,
    Command,
}
