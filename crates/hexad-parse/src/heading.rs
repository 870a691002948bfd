//! Compound schema headings: `Name1,Type1[:Fill1],...,NameN,TypeN[:FillN]`.
//!
//! A heading is split on commas; `\,` is a literal comma that belongs to
//! the current name or fill value. Splitting is a small state machine so
//! the escaping rule can be tested on its own.

use hexad_common::{Field, Schema};

use crate::typespec::parse_type_spec;
use crate::types::SchemaError;

const DELIMITER: char = ',';
const ESCAPE: char = '\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// At the start of a token, nothing buffered yet.
    SegmentStart,
    /// Inside a token.
    InSegment,
    /// Just consumed a backslash.
    InEscape,
}

/// Split `text` on unescaped commas, unescaping `\,` in every token.
/// A backslash not followed by a comma is kept as is.
///
/// Empty tokens (leading, trailing or doubled commas) are rejected.
pub fn split_escaped(text: &str) -> Result<Vec<String>, SchemaError> {
    if text.is_empty() {
        return Err(SchemaError::EmptyHeading);
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::SegmentStart;

    for c in text.chars() {
        state = match (state, c) {
            (ScanState::InEscape, DELIMITER) => {
                current.push(DELIMITER);
                ScanState::InSegment
            }
            (ScanState::InEscape, ESCAPE) => {
                current.push(ESCAPE);
                ScanState::InEscape
            }
            (ScanState::InEscape, other) => {
                current.push(ESCAPE);
                current.push(other);
                ScanState::InSegment
            }
            (ScanState::SegmentStart, DELIMITER) => {
                return Err(SchemaError::EmptyToken {
                    index: tokens.len(),
                });
            }
            (ScanState::InSegment, DELIMITER) => {
                tokens.push(std::mem::take(&mut current));
                ScanState::SegmentStart
            }
            (_, ESCAPE) => ScanState::InEscape,
            (_, other) => {
                current.push(other);
                ScanState::InSegment
            }
        };
    }

    match state {
        ScanState::SegmentStart => Err(SchemaError::EmptyToken {
            index: tokens.len(),
        }),
        ScanState::InEscape => {
            current.push(ESCAPE);
            tokens.push(current);
            Ok(tokens)
        }
        ScanState::InSegment => {
            tokens.push(current);
            Ok(tokens)
        }
    }
}

/// Escape commas so that [`split_escaped`] returns `text` unchanged.
///
/// `text` must not end with a backslash; [`Schema::new`] refuses such names
/// and fills.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == DELIMITER {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Parse a heading into an ordered schema.
pub fn parse_schema(heading: &str) -> Result<Schema, SchemaError> {
    let tokens = split_escaped(heading)?;
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(SchemaError::MalformedHeading {
            count: tokens.len(),
        });
    }

    let mut fields = Vec::with_capacity(tokens.len() / 2);
    for pair in tokens.chunks_exact(2) {
        let name = &pair[0];
        if fields.iter().any(|f: &Field| &f.name == name) {
            return Err(SchemaError::DuplicateField(name.clone()));
        }
        let descriptor = parse_type_spec(&pair[1])?;
        fields.push(Field {
            name: name.clone(),
            dtype: descriptor.dtype,
            fill: descriptor.fill,
        });
    }

    Ok(Schema::new(fields)?)
}

/// Render a schema back into heading text accepted by [`parse_schema`].
pub fn render_schema(schema: &Schema) -> String {
    let mut parts = Vec::with_capacity(schema.len() * 2);
    for field in schema.fields() {
        parts.push(escape(&field.name));
        let mut spec = field.dtype.to_string();
        if let Some(fill) = &field.fill {
            spec.push(':');
            spec.push_str(&escape(fill));
        }
        parts.push(spec);
    }
    parts.join(",")
}
