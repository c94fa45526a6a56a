//! VOTable response decoding.
//!
//! Only the first `TABLE` of a document is read, and only its `TABLEDATA`
//! serialization. Anything the decoder cannot read becomes
//! [`DecodeResult::Empty`] rather than an error: at the wire level a cone
//! with no matches and a broken response can look the same, so the caller
//! gets an empty table that still carries the URL and raw body.
//!
//! The body is read in the encoding named by its XML declaration. UTF-8
//! (the default) and US-ASCII are read as is and ISO-8859-1 byte for byte;
//! any other declared encoding is refused, and the raw body kept in the
//! table metadata is then a lossy UTF-8 rendering.

use crate::domain::ports::RawResponse;
use crate::domain::table::{Column, DataType, Table, TableMeta, Value};
use crate::utils::error::{ConeError, Result};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::bytes::Regex;
use std::collections::HashSet;

static XML_ENCODING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
        .expect("xml encoding pattern is valid")
});

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    Parsed(Table),
    Empty {
        reason: String,
        raw_body: String,
        url: String,
    },
}

impl DecodeResult {
    pub fn is_parsed(&self) -> bool {
        matches!(self, DecodeResult::Parsed(_))
    }

    /// Why decoding failed, if it did.
    pub fn reason(&self) -> Option<&str> {
        match self {
            DecodeResult::Parsed(_) => None,
            DecodeResult::Empty { reason, .. } => Some(reason),
        }
    }

    /// Default path: both outcomes become a table, an unreadable response
    /// being a table with no columns and no rows.
    pub fn into_table(self) -> Table {
        match self {
            DecodeResult::Parsed(table) => table,
            DecodeResult::Empty { raw_body, url, .. } => Table::empty(TableMeta::single(url, raw_body)),
        }
    }
}

pub fn decode_votable(response: &RawResponse) -> DecodeResult {
    let (raw_body, parsed) = match body_text(&response.body) {
        Ok(text) => {
            let parsed = parse_votable(&text);
            (text, parsed)
        }
        Err(e) => (response.body_text(), Err(e)),
    };

    match parsed {
        Ok(mut table) => {
            table.meta = TableMeta::single(response.url.clone(), raw_body);
            DecodeResult::Parsed(table)
        }
        Err(e) => {
            tracing::warn!("⚠️ Could not decode VOTable from {}: {}", response.url, e);
            DecodeResult::Empty {
                reason: e.to_string(),
                raw_body,
                url: response.url.clone(),
            }
        }
    }
}

/// Body as text, honouring the encoding named in the XML declaration.
fn body_text(body: &[u8]) -> Result<String> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    let declared = XML_ENCODING_REGEX
        .captures(body)
        .map(|caps| String::from_utf8_lossy(&caps[1]).to_ascii_lowercase());

    match declared.as_deref() {
        None | Some("utf-8" | "utf8" | "us-ascii" | "ascii") => {
            Ok(String::from_utf8_lossy(body).into_owned())
        }
        Some("iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1") => {
            Ok(body.iter().map(|&b| char::from(b)).collect())
        }
        Some(other) => Err(decode_error(format!(
            "character encoding '{}' is not supported",
            other
        ))),
    }
}

/// Parses a VOTable document into a table with empty metadata.
pub fn parse_votable(xml: &str) -> Result<Table> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut builder = TableBuilder::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                builder.depth += 1;
                builder.start(e, false)?;
            }
            Ok(Event::Empty(ref e)) => {
                builder.start(e, true)?;
                builder.end(e.local_name().as_ref())?;
            }
            Ok(Event::End(ref e)) => {
                builder.depth = builder.depth.saturating_sub(1);
                builder.end(e.local_name().as_ref())?;
            }
            Ok(Event::Text(ref t)) => {
                let text = t.unescape().map_err(|e| decode_error(e.to_string()))?;
                builder.text(&text)?;
            }
            Ok(Event::CData(ref c)) => {
                let text = String::from_utf8_lossy(c).into_owned();
                builder.text(&text)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(decode_error(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

fn decode_error(message: impl Into<String>) -> ConeError {
    ConeError::Decode {
        message: message.into(),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum TableState {
    #[default]
    NotSeen,
    Inside,
    Done,
}

#[derive(Debug)]
struct FieldDef {
    column: Column,
    null: Option<String>,
}

#[derive(Debug, Default)]
struct TableBuilder {
    seen_root: bool,
    depth: usize,
    state: TableState,
    fields: Vec<FieldDef>,
    in_field: bool,
    rows: Vec<Vec<Value>>,
    current_row: Option<Vec<Value>>,
    current_cell: Option<String>,
    service_error: Option<String>,
    in_status_info: bool,
}

impl TableBuilder {
    fn start(&mut self, element: &BytesStart, is_empty: bool) -> Result<()> {
        let name = element.local_name();
        let name = name.as_ref();

        if !self.seen_root {
            if name != b"VOTABLE" {
                return Err(decode_error(format!(
                    "document root is <{}>, not <VOTABLE>",
                    String::from_utf8_lossy(name)
                )));
            }
            self.seen_root = true;
            return Ok(());
        }

        match name {
            b"INFO" => {
                let info_name = attribute(element, b"name")?;
                let value = attribute(element, b"value")?;
                if info_name.as_deref() == Some("QUERY_STATUS") && value.as_deref() == Some("ERROR") {
                    self.service_error = Some(String::new());
                    self.in_status_info = !is_empty;
                }
            }
            b"PARAM" => {
                if attribute(element, b"name")?.as_deref() == Some("Error") {
                    self.service_error = Some(attribute(element, b"value")?.unwrap_or_default());
                }
            }
            b"TABLE" if self.state == TableState::NotSeen => self.state = TableState::Inside,
            b"FIELD" if self.state == TableState::Inside => {
                let field_name = match attribute(element, b"name")? {
                    Some(n) => n,
                    None => attribute(element, b"ID")?
                        .unwrap_or_else(|| format!("col{}", self.fields.len() + 1)),
                };
                let votable_type = attribute(element, b"datatype")?.unwrap_or_else(|| "char".to_string());
                let arraysize = attribute(element, b"arraysize")?;

                let mut datatype = DataType::from_votable(&votable_type);
                // 數值陣列以原始字串保留
                if datatype != DataType::Text && arraysize.as_deref().is_some_and(|s| s != "1") {
                    datatype = DataType::Text;
                }

                let mut column = Column::new(field_name, datatype);
                column.unit = attribute(element, b"unit")?;
                column.ucd = attribute(element, b"ucd")?;
                self.fields.push(FieldDef { column, null: None });
                self.in_field = !is_empty;
            }
            b"VALUES" if self.in_field => {
                if let Some(field) = self.fields.last_mut() {
                    field.null = attribute(element, b"null")?;
                }
            }
            b"BINARY" | b"BINARY2" | b"FITS" if self.state == TableState::Inside => {
                return Err(decode_error(format!(
                    "{} serialization is not supported",
                    String::from_utf8_lossy(name)
                )));
            }
            b"TR" if self.state == TableState::Inside => {
                self.current_row = Some(Vec::with_capacity(self.fields.len()));
            }
            b"TD" if self.state == TableState::Inside => {
                if self.current_row.is_none() {
                    return Err(decode_error("<TD> outside of a <TR>"));
                }
                self.current_cell = Some(String::new());
            }
            _ => {}
        }

        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"INFO" => self.in_status_info = false,
            b"FIELD" => self.in_field = false,
            b"TABLE" if self.state == TableState::Inside => self.state = TableState::Done,
            b"TD" if self.state == TableState::Inside => {
                let raw = self.current_cell.take().unwrap_or_default();
                let width = self.current_row.as_ref().map_or(0, Vec::len);
                let field = self.fields.get(width).ok_or_else(|| {
                    decode_error(format!(
                        "row {} has more cells than the {} declared fields",
                        self.rows.len() + 1,
                        self.fields.len()
                    ))
                })?;
                let value = convert_cell(&raw, field)?;
                if let Some(row) = self.current_row.as_mut() {
                    row.push(value);
                }
            }
            b"TR" if self.state == TableState::Inside => {
                if let Some(mut row) = self.current_row.take() {
                    row.resize(self.fields.len(), Value::Null);
                    self.rows.push(row);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if let Some(cell) = self.current_cell.as_mut() {
            cell.push_str(text);
        } else if self.in_status_info {
            if let Some(message) = self.service_error.as_mut() {
                message.push_str(text);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Table> {
        if !self.seen_root {
            return Err(decode_error("response contains no <VOTABLE> element"));
        }
        if self.depth != 0 {
            return Err(decode_error("document ended before all elements were closed"));
        }
        if let Some(message) = self.service_error {
            let message = message.trim();
            return Err(decode_error(if message.is_empty() {
                "service reported QUERY_STATUS=ERROR".to_string()
            } else {
                format!("service reported an error: {}", message)
            }));
        }
        if self.state == TableState::NotSeen {
            return Err(decode_error("VOTable contains no <TABLE>"));
        }

        let mut columns: Vec<Column> = self.fields.into_iter().map(|f| f.column).collect();
        unique_column_names(&mut columns);
        Ok(Table::new(columns, self.rows))
    }
}

/// Renames repeated FIELD names to `name_2`, `name_3`, ... in document
/// order, skipping suffixes another FIELD already uses.
fn unique_column_names(columns: &mut [Column]) {
    let declared: HashSet<String> = columns.iter().map(|c| c.name.clone()).collect();
    let mut taken: HashSet<String> = HashSet::new();
    for column in columns.iter_mut() {
        if taken.contains(&column.name) {
            let mut n = 2;
            let mut candidate = format!("{}_{}", column.name, n);
            while taken.contains(&candidate) || declared.contains(&candidate) {
                n += 1;
                candidate = format!("{}_{}", column.name, n);
            }
            column.name = candidate;
        }
        taken.insert(column.name.clone());
    }
}

fn attribute(element: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| decode_error(e.to_string()))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| decode_error(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn convert_cell(raw: &str, field: &FieldDef) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || field.null.as_deref() == Some(trimmed) {
        return Ok(Value::Null);
    }

    let invalid = || {
        decode_error(format!(
            "'{}' is not a valid {:?} value for field {}",
            trimmed, field.column.datatype, field.column.name
        ))
    };

    match field.column.datatype {
        DataType::Text => Ok(Value::Text(raw.to_string())),
        DataType::Boolean => match trimmed {
            "T" | "t" | "1" | "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
            "F" | "f" | "0" | "false" | "FALSE" | "False" => Ok(Value::Bool(false)),
            "?" => Ok(Value::Null),
            _ => Err(invalid()),
        },
        DataType::Integer => {
            let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
                Some(hex) => i64::from_str_radix(hex, 16),
                None => trimmed.parse::<i64>(),
            };
            parsed.map(Value::Int).map_err(|_| invalid())
        }
        DataType::Float => trimmed.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
    }
}
