use crate::crypto::hash::is_valid_hash;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io::{self, Write};

/// Unit of audit evidence for one successful wipe.
///
/// `signature` covers the canonical encoding of the other three fields,
/// produced before the signature existed. Records are created once and
/// never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipeRecord {
    pub file_name: String,
    pub file_hash: String,
    pub deleted_at: String,
    pub signature: String,
}

/// The signed part of a record. Field order here is the canonical order.
#[derive(Serialize)]
struct SignedFields<'a> {
    file_name: &'a str,
    file_hash: &'a str,
    deleted_at: &'a str,
}

/// Canonical bytes for `{file_name, file_hash, deleted_at}`: pretty JSON,
/// four-space indent, `\n` line breaks, no trailing newline.
pub fn canonical_bytes(file_name: &str, file_hash: &str, deleted_at: &str) -> Vec<u8> {
    // Serializing three string fields into a Vec cannot fail
    to_indented_json(&SignedFields {
        file_name,
        file_hash,
        deleted_at,
    })
    .unwrap_or_default()
}

/// Pretty JSON with four-space indentation and every character outside
/// printable ASCII escaped, the layout used for every file this crate writes.
pub fn to_indented_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = AsciiPrettyFormatter {
        inner: PrettyFormatter::with_indent(b"    "),
    };
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// `PrettyFormatter` whose strings carry only printable ASCII. Anything else
/// becomes lowercase `\uXXXX`, as a UTF-16 surrogate pair above the BMP.
struct AsciiPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    // Quotes, backslashes and C0 controls never reach here; serde_json
    // escapes those itself.
    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = index + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Audit timestamp: UTC, microsecond precision, trailing `Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl WipeRecord {
    /// The exact bytes the signature was computed over
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(&self.file_name, &self.file_hash, &self.deleted_at)
    }

    pub fn deleted_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.deleted_at)
    }

    /// Syntax check applied before a record is appended to the ledger
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_hash(&self.file_hash) {
            return Err(format!("file_hash {:?} is not a SHA-256 hex digest", self.file_hash));
        }
        if self.deleted_at_utc().is_none() {
            return Err(format!("deleted_at {:?} is not an ISO-8601 timestamp", self.deleted_at));
        }
        Ok(())
    }
}
