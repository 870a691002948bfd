//! `KEY,VALUE,...` creation property lists for arrays and tables.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dims::parse_chunk_spec;
use crate::types::PropertyError;
use crate::typespec::{TypeDescriptor, parse_type_spec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Datatype,
    ChunkSize,
    Deflate,
    FillValue,
    Fletcher32,
    Shuffle,
}

impl PropertyKey {
    pub const ALL: [PropertyKey; 6] = [
        PropertyKey::Datatype,
        PropertyKey::ChunkSize,
        PropertyKey::Deflate,
        PropertyKey::FillValue,
        PropertyKey::Fletcher32,
        PropertyKey::Shuffle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PropertyKey::Datatype => "DATATYPE",
            PropertyKey::ChunkSize => "CHUNKSIZE",
            PropertyKey::Deflate => "DEFLATE",
            PropertyKey::FillValue => "FILLVALUE",
            PropertyKey::Fletcher32 => "FLETCHER32",
            PropertyKey::Shuffle => "SHUFFLE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|k| k.name() == upper)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed result of a property list. Absent keys stay `None`/`false`; the
/// caller applies its own defaults (element type, table compression).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationProperties {
    pub dtype: Option<TypeDescriptor>,
    pub chunks: Option<Vec<u64>>,
    pub deflate: Option<u8>,
    pub fill: Option<String>,
    pub fletcher32: bool,
    pub shuffle: bool,
}

impl CreationProperties {
    /// Fill literal for the new object: an explicit `FILLVALUE` wins over
    /// one attached to `DATATYPE`.
    pub fn effective_fill(&self) -> Option<&str> {
        self.fill
            .as_deref()
            .or_else(|| self.dtype.as_ref().and_then(|d| d.fill.as_deref()))
    }
}

/// Parse a property list. Blank input yields the defaults.
pub fn parse_properties(text: &str) -> Result<CreationProperties, PropertyError> {
    let mut props = CreationProperties::default();
    if text.trim().is_empty() {
        return Ok(props);
    }

    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    if tokens.len() % 2 != 0 {
        return Err(PropertyError::OddTokens(tokens.len()));
    }

    let mut seen = Vec::with_capacity(tokens.len() / 2);
    for pair in tokens.chunks_exact(2) {
        let (raw_key, value) = (pair[0], pair[1]);
        let key = PropertyKey::from_name(raw_key)
            .ok_or_else(|| PropertyError::UnknownKey(raw_key.to_string()))?;
        if seen.contains(&key) {
            return Err(PropertyError::DuplicateKey(key.name().to_string()));
        }
        seen.push(key);

        match key {
            PropertyKey::Datatype => {
                props.dtype = Some(parse_type_spec(value).map_err(PropertyError::Datatype)?);
            }
            PropertyKey::ChunkSize => {
                let chunks = if value.starts_with('[') {
                    parse_chunk_spec(value)
                } else {
                    parse_chunk_spec(&format!("[{value}]"))
                };
                props.chunks = Some(chunks.map_err(PropertyError::Chunk)?);
            }
            PropertyKey::Deflate => {
                let level = value
                    .parse::<u8>()
                    .ok()
                    .filter(|l| *l <= 9)
                    .ok_or_else(|| PropertyError::Deflate(value.to_string()))?;
                props.deflate = Some(level);
            }
            PropertyKey::FillValue => props.fill = Some(value.to_string()),
            PropertyKey::Fletcher32 => props.fletcher32 = parse_flag(key, value)?,
            PropertyKey::Shuffle => props.shuffle = parse_flag(key, value)?,
        }
    }

    Ok(props)
}

fn parse_flag(key: PropertyKey, value: &str) -> Result<bool, PropertyError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(PropertyError::Boolean {
            key: key.name().to_string(),
            value: value.to_string(),
        })
    }
}
