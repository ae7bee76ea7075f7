//! Turning the text captured before a prompt into command output lines

use super::config::EchoMode;

/// Clean one line of terminal output.
///
/// Trailing carriage returns belong to the line ending. Leading ones are left
/// over by the line discipline or by a shell's bracketed-paste toggle once the
/// escape sequence around them is stripped. Carriage returns inside the line
/// are output and are kept.
pub(crate) fn clean_line(line: &str) -> &str {
    line.trim_end_matches('\r').trim_start_matches('\r')
}

/// Remove the echo of `command` from the start of `raw`.
///
/// Line editors redraw a command that is wider than the terminal: after the
/// last column they write `" \r"` (or a line break on terminals without
/// automatic margins) and continue on the next row. Those bytes are skipped
/// while the command is matched. Returns the text after the echoed line, or
/// `None` if `raw` does not start with the echo.
pub(crate) fn strip_echo<'a>(raw: &'a str, command: &str) -> Option<&'a str> {
    let command = command.trim_end();
    if command.is_empty() {
        return None;
    }

    let mut rest = raw.trim_start_matches('\r');
    for (i, expected) in command.chars().enumerate() {
        if i > 0 {
            rest = skip_wrap(rest);
        }
        rest = rest.strip_prefix(expected)?;
    }

    let rest = rest.trim_start_matches([' ', '\r']);
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('\n')
    }
}

fn skip_wrap(mut text: &str) -> &str {
    loop {
        if let Some(rest) = text.strip_prefix(" \r") {
            text = rest;
        } else if let Some(rest) = text.strip_prefix(['\r', '\n']) {
            text = rest;
        } else {
            return text;
        }
    }
}

/// Split the output of `command` into lines.
///
/// `raw` is everything the shell printed between submitting `command` and
/// the next prompt. The echoed command is removed according to `echo`, then
/// the empty line produced by the newline right before the prompt.
///
/// With [`EchoMode::Detect`] and no echo found, an empty first line is the
/// line break a line editor writes when it accepts input with terminal echo
/// off, and is dropped as well.
pub(crate) fn command_lines(raw: &str, command: &str, echo: EchoMode) -> Vec<String> {
    let (body, echo_removed) = match echo {
        EchoMode::Silent => (raw, false),
        EchoMode::Detect | EchoMode::Echoed => match strip_echo(raw, command) {
            Some(rest) => (rest, true),
            None => (raw, false),
        },
    };

    let mut lines: Vec<&str> = body.split('\n').map(clean_line).collect();

    if lines.last() == Some(&"") {
        lines.pop();
    }

    let drop_first = !echo_removed
        && match echo {
            EchoMode::Echoed => true,
            EchoMode::Silent => false,
            EchoMode::Detect => lines.first() == Some(&""),
        };
    if drop_first && !lines.is_empty() {
        lines.remove(0);
    }

    lines.into_iter().map(str::to_string).collect()
}

/// Build a shell assignment of `sentinel` to `variable`.
///
/// Every character is quoted on its own, so the terminal's echo of the
/// assignment never contains the sentinel as one contiguous string and
/// cannot be mistaken for the first prompt.
pub(crate) fn prompt_assignment(variable: &str, sentinel: &str) -> String {
    let mut assignment = String::with_capacity(variable.len() + 1 + sentinel.len() * 3);
    assignment.push_str(variable);
    assignment.push('=');
    for c in sentinel.chars() {
        if c == '\'' {
            assignment.push_str("\"'\"");
        } else {
            assignment.push('\'');
            assignment.push(c);
            assignment.push('\'');
        }
    }
    assignment
}
