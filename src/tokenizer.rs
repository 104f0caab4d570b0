//! Command tokenizer (C2): splits a command string into argv honoring
//! single/double quotes and backslash escapes, the way a POSIX shell would
//! for the purposes of whitelist/path-argument inspection. This is not a
//! full shell grammar — it exists so C5/C6 can extract a base command and
//! its path arguments from a string the caller never actually executes
//! through a shell.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Splits `command` into tokens per the quoting rules in spec §4.2.
pub fn tokenize(command: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut have_current = false;
    let mut quote = Quote::None;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Quote::None => match c {
                ' ' | '\t' | '\n' => {
                    if have_current {
                        tokens.push(std::mem::take(&mut current));
                        have_current = false;
                    }
                }
                '\'' => {
                    quote = Quote::Single;
                    have_current = true;
                }
                '"' => {
                    quote = Quote::Double;
                    have_current = true;
                }
                '\\' => {
                    if let Some(&next) = chars.peek() {
                        current.push(next);
                        chars.next();
                    }
                    have_current = true;
                }
                _ => {
                    current.push(c);
                    have_current = true;
                }
            },
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(c);
                }
            }
            Quote::Double => match c {
                '"' => {
                    quote = Quote::None;
                }
                '\\' => match chars.peek() {
                    Some('"') | Some('\\') | Some('$') | Some('`') => {
                        current.push(chars.next().unwrap());
                    }
                    _ => current.push('\\'),
                },
                _ => current.push(c),
            },
        }
    }

    if have_current {
        tokens.push(current);
    }

    tokens
}

/// First token of the tokenized command, or empty if there is none.
pub fn base_command(command: &str) -> String {
    tokenize(command).into_iter().next().unwrap_or_default()
}

/// An argument is a path argument if it does not start with `-` and it
/// starts with `/`, contains `/`, or starts with `.` (catches hidden files
/// such as `.env` that carry no path separator).
pub fn is_path_argument(arg: &str) -> bool {
    if arg.starts_with('-') {
        return false;
    }
    arg.starts_with('/') || arg.contains('/') || arg.starts_with('.')
}

/// Extracts the path-looking arguments (per `is_path_argument`) from a
/// tokenized command, skipping the base command itself.
pub fn path_arguments(command: &str) -> Vec<String> {
    let tokens = tokenize(command);
    tokens
        .into_iter()
        .skip(1)
        .filter(|t| is_path_argument(t))
        .collect()
}

/// Rebuilds a canonical command string from tokens, single-quoting any
/// token that contains whitespace or a shell metacharacter. Used by the
/// round-trip testable property in spec §8 (S5 law).
pub fn rebuild(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| {
            let needs_quoting = t.is_empty()
                || t.chars().any(|c| {
                    c.is_whitespace() || "|><;&`$*?[]{}()'\"\\".contains(c)
                });
            if needs_quoting {
                format!("'{}'", t.replace('\'', "'\\''"))
            } else {
                t.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
