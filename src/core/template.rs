//! Positional template formatting
//!
//! Templates use `{N}` placeholders referring to the N-th argument, with `{{`
//! and `}}` as literal braces. The same placeholder may appear more than once.

use crate::error::{EasyLogError, Result};
use std::fmt::{Display, Write};

/// Encoded percent sign some callers use to smuggle `%` through templates
pub const PERCENTAGE_ASCII: &str = "&#37";

/// Substitute `args` into `template`.
///
/// Fails with [`EasyLogError::MalformedFormat`] on an unbalanced brace, a
/// non-numeric placeholder or an index without a matching argument.
pub fn format_template(template: &str, args: &[&dyn Display]) -> Result<String> {
    let malformed = || EasyLogError::malformed_format(template, positional_args(args));
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut index = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) => index.push(d),
                        None => return Err(malformed()),
                    }
                }
                let index: usize = index.trim().parse().map_err(|_| malformed())?;
                let arg = args.get(index).ok_or_else(malformed)?;
                write!(out, "{}", arg).map_err(|_| malformed())?;
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(malformed()),
            c => out.push(c),
        }
    }
    Ok(out)
}

/// Format without failing: a malformed template yields a diagnostic listing
/// the raw template and every argument with its position.
pub fn try_format(template: &str, args: &[&dyn Display]) -> String {
    match format_template(template, args) {
        Ok(formatted) => formatted.replace(PERCENTAGE_ASCII, "%"),
        Err(_) => malformed_description(template, args),
    }
}

/// `MalFormatted: format='{template}', args=[[0]a,[1]b]`
pub fn malformed_description(template: &str, args: &[&dyn Display]) -> String {
    format!("MalFormatted: format='{}', args=[{}]", template, positional_args(args))
}

/// Every argument prefixed with its position: `[0]a,[1]b`
pub fn positional_args(args: &[&dyn Display]) -> String {
    args.iter()
        .enumerate()
        .map(|(i, arg)| format!("[{}]{}", i, arg))
        .collect::<Vec<_>>()
        .join(",")
}
