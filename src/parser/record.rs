use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::SourceDataError;
use crate::schema::{Column, ColumnType, TableSchema};

/// Field delimiter of the seed files
pub const DELIMITER: char = ',';

/// NULL marker in COPY text format
const NULL_MARKER: &str = "\\N";

/// End-of-data marker in COPY text format
const END_MARKER: &str = "\\.";

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A validated row ready for COPY
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRow {
    /// 1-based line in the seed file
    pub line: usize,
    /// One entry per table column, `None` is NULL
    pub fields: Vec<Option<String>>,
}

impl SeedRow {
    /// Encode as one line of COPY text format
    pub fn to_copy_line(&self) -> String {
        let mut out = String::new();
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                out.push(DELIMITER);
            }
            match field {
                None => out.push_str(NULL_MARKER),
                Some(value) => escape_into(value, &mut out),
            }
        }
        out.push('\n');
        out
    }
}

/// All rows read from one seed file
#[derive(Debug)]
pub struct SeedTable {
    pub table: &'static TableSchema,
    pub path: PathBuf,
    pub rows: Vec<SeedRow>,
}

impl SeedTable {
    /// The rows as a COPY text payload
    pub fn copy_payload(&self) -> Vec<u8> {
        self.rows
            .iter()
            .map(SeedRow::to_copy_line)
            .collect::<String>()
            .into_bytes()
    }
}

/// Read and validate the seed file for a table
pub fn read_seed_file(
    schema: &'static TableSchema,
    seed_dir: &Path,
) -> Result<SeedTable, SourceDataError> {
    let path = seed_dir.join(schema.seed_file);

    let file = File::open(&path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            SourceDataError::Missing {
                path: path.clone(),
                source,
            }
        } else {
            SourceDataError::Read {
                path: path.clone(),
                source,
            }
        }
    })?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SourceDataError::Read {
            path: path.clone(),
            source,
        })?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line == END_MARKER {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        rows.push(parse_record(line, idx + 1, schema, &path)?);
    }

    Ok(SeedTable {
        table: schema,
        path,
        rows,
    })
}

/// Parse one seed line into a row for the given table schema
pub fn parse_record(
    line: &str,
    line_no: usize,
    schema: &TableSchema,
    path: &Path,
) -> Result<SeedRow, SourceDataError> {
    let fields = split_fields(line).map_err(|reason| SourceDataError::InvalidValue {
        path: path.to_path_buf(),
        line: line_no,
        column: "-",
        value: line.to_string(),
        reason,
    })?;

    if fields.len() != schema.columns.len() {
        return Err(SourceDataError::FieldCount {
            path: path.to_path_buf(),
            line: line_no,
            expected: schema.columns.len(),
            found: fields.len(),
        });
    }

    for (col, field) in schema.columns.iter().zip(&fields) {
        match field {
            None if !col.nullable => {
                return Err(SourceDataError::NullInRequired {
                    path: path.to_path_buf(),
                    line: line_no,
                    column: col.name,
                });
            }
            None => {}
            Some(value) => {
                validate_value(col, value).map_err(|reason| SourceDataError::InvalidValue {
                    path: path.to_path_buf(),
                    line: line_no,
                    column: col.name,
                    value: value.clone(),
                    reason,
                })?;
            }
        }
    }

    Ok(SeedRow {
        line: line_no,
        fields,
    })
}

/// Split a COPY text line on unescaped delimiters and decode each field
pub fn split_fields(line: &str) -> Result<Vec<Option<String>>, String> {
    let mut raw_fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let next = chars
                    .next()
                    .ok_or_else(|| "line ends with a lone backslash".to_string())?;
                current.push('\\');
                current.push(next);
            }
            DELIMITER => raw_fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    raw_fields.push(current);

    raw_fields
        .into_iter()
        .map(|raw| {
            if raw == NULL_MARKER {
                Ok(None)
            } else {
                unescape(&raw).map(Some)
            }
        })
        .collect()
}

/// Decode COPY text escapes: `\b \f \n \r \t \v`, octal `\ooo`, hex `\xhh`.
/// Any other escaped character stands for itself.
fn unescape(raw: &str) -> Result<String, String> {
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        // split_fields guarantees a following char
        let Some(next) = chars.next() else { break };
        let byte = match next {
            'b' => 0x08,
            'f' => 0x0c,
            'n' => b'\n',
            'r' => b'\r',
            't' => b'\t',
            'v' => 0x0b,
            '0'..='7' => {
                let mut value = digit_value(next, 8);
                for _ in 0..2 {
                    match chars.peek().copied().filter(|d| d.is_digit(8)) {
                        Some(d) => {
                            value = value * 8 + digit_value(d, 8);
                            chars.next();
                        }
                        None => break,
                    }
                }
                // \400 and above wrap to one byte like the server does
                (value & 0xff) as u8
            }
            'x' if chars.peek().is_some_and(|d| d.is_ascii_hexdigit()) => {
                let mut value = 0;
                for _ in 0..2 {
                    match chars.peek().copied().filter(|d| d.is_ascii_hexdigit()) {
                        Some(d) => {
                            value = value * 16 + digit_value(d, 16);
                            chars.next();
                        }
                        None => break,
                    }
                }
                value as u8
            }
            other => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
                continue;
            }
        };
        if byte == 0 {
            return Err("escape decodes to a NUL byte".to_string());
        }
        out.push(byte);
    }

    String::from_utf8(out).map_err(|_| "escapes decode to invalid UTF-8".to_string())
}

fn digit_value(c: char, radix: u32) -> u32 {
    c.to_digit(radix).unwrap_or(0)
}

fn escape_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            DELIMITER => {
                out.push('\\');
                out.push(DELIMITER);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            _ => out.push(c),
        }
    }
}

/// Check a non-null value against the column type
pub fn validate_value(col: &Column, value: &str) -> Result<(), String> {
    let trimmed = value.trim();

    match col.col_type {
        ColumnType::Integer => trimmed
            .parse::<i32>()
            .map(|_| ())
            .map_err(|e| format!("not a 32-bit integer ({})", e)),
        ColumnType::SmallInt => trimmed
            .parse::<i16>()
            .map(|_| ())
            .map_err(|e| format!("not a 16-bit integer ({})", e)),
        ColumnType::Decimal | ColumnType::Real => trimmed
            .parse::<f64>()
            .map(|_| ())
            .map_err(|_| "not a number".to_string()),
        ColumnType::Varchar(max) => {
            let len = value.chars().count();
            if len > usize::from(max) {
                Err(format!("{} characters, limit is {}", len, max))
            } else {
                Ok(())
            }
        }
        ColumnType::Text => Ok(()),
        ColumnType::Timestamp => {
            let parsed = TIMESTAMP_FORMATS
                .iter()
                .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok())
                || NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok();
            if parsed {
                Ok(())
            } else {
                Err("expected YYYY-MM-DD HH:MM:SS".to_string())
            }
        }
    }
}
