//! `#/<n1>;<n2>;...` on the first line of a template is the art's own palette.

use crate::error::{FetchError, Result};

const PREFIX: &str = "#/";

/// A template split into its body and the colors its directive asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate<'a> {
    pub body: &'a str,
    pub directive: Option<Vec<u8>>,
}

/// Splits off the directive line (and its newline) if the template has one.
///
/// A segment that isn't a color code is a broken template and is reported
/// as an error, even if the caller ends up ignoring the directive colors.
pub fn parse_directive(raw: &str) -> Result<ParsedTemplate<'_>> {
    if !raw.starts_with(PREFIX) {
        return Ok(ParsedTemplate {
            body: raw,
            directive: None,
        });
    }

    let (first_line, body) = match raw.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (raw, ""),
    };
    let list = first_line[PREFIX.len()..].trim_end_matches('\r');

    let colors = list
        .split(';')
        .map(|segment| {
            segment.parse::<u8>().map_err(|source| FetchError::Directive {
                segment: segment.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedTemplate {
        body,
        directive: Some(colors),
    })
}
