//! Escaping for the emitted ninja text.
//!
//! Three layers exist: ninja's own `$`-escapes, shell quoting for values
//! that reach a command line verbatim, and both stacked for values that
//! pass through ninja into a shell. Shell escaping here is the emitted
//! wire format (posix-style quoting with forward slashes), not host-shell
//! quoting.

/// How a string is escaped on its way into the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeMode {
    /// Emit verbatim.
    None,
    /// Escape `$`, space, and newline per ninja syntax.
    Ninja,
    /// Quote and escape shell metacharacters.
    Shell,
    /// Shell-escape, then ninja-escape the result.
    NinjaShell,
}

#[derive(Clone, Copy, Debug)]
pub struct EscapeOptions {
    pub mode: EscapeMode,
    /// Skip the surrounding quotes in shell modes; the caller supplies its
    /// own. Interior metacharacters are still escaped.
    pub inhibit_quoting: bool,
}

impl EscapeOptions {
    #[must_use]
    pub fn new(mode: EscapeMode) -> Self {
        Self {
            mode,
            inhibit_quoting: false,
        }
    }

    #[must_use]
    pub fn with_inhibit_quoting(mode: EscapeMode) -> Self {
        Self {
            mode,
            inhibit_quoting: true,
        }
    }
}

/// Append `input` to `out` escaped per `options`.
pub fn escape_to(out: &mut String, input: &str, options: EscapeOptions) {
    match options.mode {
        EscapeMode::None => out.push_str(input),
        EscapeMode::Ninja => ninja_escape_to(out, input),
        EscapeMode::Shell => shell_escape_to(out, input, options.inhibit_quoting),
        EscapeMode::NinjaShell => {
            let mut shell = String::with_capacity(input.len());
            shell_escape_to(&mut shell, input, options.inhibit_quoting);
            ninja_escape_to(out, &shell);
        }
    }
}

/// `escape_to` into a fresh string.
#[must_use]
pub fn escape(input: &str, options: EscapeOptions) -> String {
    let mut out = String::with_capacity(input.len());
    escape_to(&mut out, input, options);
    out
}

fn ninja_escape_to(out: &mut String, input: &str) {
    for c in input.chars() {
        match c {
            '$' => out.push_str("$$"),
            ' ' => out.push_str("$ "),
            '\n' => out.push_str("$\n"),
            other => out.push(other),
        }
    }
}

fn shell_escape_to(out: &mut String, input: &str, inhibit_quoting: bool) {
    let needs_quoting = input.contains([' ', '"', '$', '\\']);
    if !needs_quoting {
        out.push_str(input);
        return;
    }
    if !inhibit_quoting {
        out.push('"');
    }
    for c in input.chars() {
        if matches!(c, '"' | '$' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    if !inhibit_quoting {
        out.push('"');
    }
}
