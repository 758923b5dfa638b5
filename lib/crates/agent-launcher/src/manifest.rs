//! Jar manifest codec.
//!
//! Reads and writes the standard `META-INF/MANIFEST.MF` text format: a main
//! attribute section followed by named sections, `Name: value` headers,
//! 72-byte lines with single-space continuation lines, and blank lines
//! between sections. Output always uses CRLF; input accepts CRLF, LF and CR.

use thiserror::Error;

/// Location of the manifest inside a bundle.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Version attribute, always written first in the main section.
pub const MANIFEST_VERSION: &str = "Manifest-Version";

/// Header that opens a named section.
const SECTION_NAME: &str = "Name";

/// Maximum line length in bytes, excluding the line break.
const MAX_LINE_BYTES: usize = 72;

/// Maximum attribute name length accepted by the format.
const MAX_NAME_LEN: usize = 70;

/// Errors raised while parsing manifest text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest line {line}: invalid header field")]
    InvalidHeader { line: usize },

    #[error("manifest line {line}: invalid attribute name '{name}'")]
    InvalidName { line: usize, name: String },

    #[error("manifest line {line}: continuation line without a preceding header")]
    OrphanContinuation { line: usize },

    #[error("manifest line {line}: section does not start with a Name attribute")]
    MissingSectionName { line: usize },

    #[error("manifest line {line}: attribute value is not valid UTF-8")]
    InvalidUtf8 { line: usize },
}

/// Ordered attribute list with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attribute value, ignoring ASCII case of the name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    /// Set an attribute, returning the previous value.
    ///
    /// An existing attribute keeps its position and original name spelling.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.entries.remove(i).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// A parsed manifest: main attributes plus ordered named sections.
///
/// Section names are case-sensitive, attribute names are not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Attributes,
    sections: Vec<(String, Attributes)>,
}

impl Manifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn main(&self) -> &Attributes {
        &self.main
    }

    pub fn main_mut(&mut self) -> &mut Attributes {
        &mut self.main
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Attributes> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, attrs)| attrs)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Attributes> {
        self.sections
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, attrs)| attrs)
    }

    /// Insert or replace a named section, returning the replaced one.
    ///
    /// A replaced section keeps its position.
    pub fn insert_section(&mut self, name: impl Into<String>, attrs: Attributes) -> Option<Attributes> {
        let name = name.into();
        match self.section_mut(&name) {
            Some(existing) => Some(std::mem::replace(existing, attrs)),
            None => {
                self.sections.push((name, attrs));
                None
            }
        }
    }

    /// Iterate named sections in order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.sections.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Parse manifest text.
    ///
    /// Repeated sections with the same name are merged, later values win.
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let lines = split_lines(bytes);
        let mut cursor = 0;
        let mut manifest = Manifest::new();

        for (name, value) in read_headers(&lines, &mut cursor)? {
            manifest.main.set(name, value);
        }

        loop {
            while cursor < lines.len() && lines[cursor].is_empty() {
                cursor += 1;
            }
            if cursor >= lines.len() {
                break;
            }
            let first_line = cursor + 1;
            let mut headers = read_headers(&lines, &mut cursor)?.into_iter();
            let section_name = match headers.next() {
                Some((name, value)) if name.eq_ignore_ascii_case(SECTION_NAME) => value,
                _ => return Err(ManifestError::MissingSectionName { line: first_line }),
            };
            if manifest.section(&section_name).is_none() {
                manifest.insert_section(section_name.clone(), Attributes::new());
            }
            if let Some(section) = manifest.section_mut(&section_name) {
                for (name, value) in headers {
                    section.set(name, value);
                }
            }
        }

        Ok(manifest)
    }

    /// Serialize to manifest text with CRLF line breaks.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        let version = self.main.position(MANIFEST_VERSION);
        if let Some(i) = version {
            let (name, value) = &self.main.entries[i];
            write_header(&mut out, name, value);
        }
        for (i, (name, value)) in self.main.entries.iter().enumerate() {
            if Some(i) != version {
                write_header(&mut out, name, value);
            }
        }
        out.extend_from_slice(b"\r\n");

        for (section, attrs) in &self.sections {
            write_header(&mut out, SECTION_NAME, section);
            for (name, value) in attrs.iter() {
                write_header(&mut out, name, value);
            }
            out.extend_from_slice(b"\r\n");
        }

        out
    }
}

/// Returns `true` if `name` is a legal attribute name: 1 to 70 characters of
/// ASCII letters, digits, `-` or `_`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Split on CRLF, LF or CR. A trailing line without a terminator is kept.
fn split_lines(bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&bytes[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&bytes[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&bytes[start..]);
    }
    lines
}

/// Read headers from `lines[*cursor..]` up to the next blank line or the end,
/// joining continuation lines. Leaves `cursor` on the blank line.
fn read_headers(lines: &[&[u8]], cursor: &mut usize) -> Result<Vec<(String, String)>, ManifestError> {
    let mut headers = Vec::new();
    let mut current: Option<(String, Vec<u8>, usize)> = None;

    while *cursor < lines.len() && !lines[*cursor].is_empty() {
        let line = lines[*cursor];
        let line_no = *cursor + 1;
        *cursor += 1;

        if line[0] == b' ' {
            match current.as_mut() {
                Some((_, value, _)) => value.extend_from_slice(&line[1..]),
                None => return Err(ManifestError::OrphanContinuation { line: line_no }),
            }
            continue;
        }

        if let Some(header) = current.take() {
            headers.push(finish_header(header)?);
        }

        let sep = line
            .windows(2)
            .position(|w| w == b": ")
            .ok_or(ManifestError::InvalidHeader { line: line_no })?;
        let name = std::str::from_utf8(&line[..sep])
            .map_err(|_| ManifestError::InvalidHeader { line: line_no })?;
        if !is_valid_name(name) {
            return Err(ManifestError::InvalidName {
                line: line_no,
                name: name.to_string(),
            });
        }
        current = Some((name.to_string(), line[sep + 2..].to_vec(), line_no));
    }

    if let Some(header) = current.take() {
        headers.push(finish_header(header)?);
    }
    Ok(headers)
}

fn finish_header((name, value, line): (String, Vec<u8>, usize)) -> Result<(String, String), ManifestError> {
    let value = String::from_utf8(value).map_err(|_| ManifestError::InvalidUtf8 { line })?;
    Ok((name, value))
}

/// Write one header, wrapping at 72 bytes. Wrapping works on bytes, so a
/// multi-byte character may straddle a continuation; readers join bytes
/// before decoding.
fn write_header(out: &mut Vec<u8>, name: &str, value: &str) {
    let line = format!("{name}: {value}");
    let bytes = line.as_bytes();
    let mut pos = bytes.len().min(MAX_LINE_BYTES);
    out.extend_from_slice(&bytes[..pos]);
    while pos < bytes.len() {
        let end = (pos + MAX_LINE_BYTES - 1).min(bytes.len());
        out.extend_from_slice(b"\r\n ");
        out.extend_from_slice(&bytes[pos..end]);
        pos = end;
    }
    out.extend_from_slice(b"\r\n");
}
