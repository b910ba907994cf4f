//! Delimited text parsing.
//!
//! Parses header-led delimited text into rows of typed cells. The parser never
//! fails: malformed input degrades to best-effort row extraction and callers
//! decide whether zero rows is an error.

use screener_core::config::ParserConfig;
use screener_core::Cell;
use std::sync::Arc;
use tracing::{debug, warn};

const BOM: char = '\u{feff}';

/// One parsed row, cells aligned with the table's named headers.
///
/// Each cell keeps the trimmed text it was parsed from, so identifiers that
/// look numeric (e.g. "0700") survive unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    headers: Arc<[String]>,
    cells: Vec<Cell>,
    texts: Vec<String>,
}

impl Row {
    /// Build a row from raw field text; missing trailing fields are empty,
    /// extra fields are dropped.
    pub fn from_texts(headers: Arc<[String]>, mut texts: Vec<String>) -> Self {
        texts.resize(headers.len(), String::new());
        let cells = texts.iter().map(|t| Cell::parse(t)).collect();
        Self {
            headers,
            cells,
            texts,
        }
    }

    /// Build a row from name/value pairs in order.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Cell)>,
        K: Into<String>,
    {
        let mut headers = Vec::new();
        let mut cells = Vec::new();
        let mut texts = Vec::new();
        for (name, cell) in pairs {
            headers.push(name.into());
            texts.push(cell_text(&cell));
            cells.push(cell);
        }
        Self {
            headers: headers.into(),
            cells,
            texts,
        }
    }

    /// Build a row from a JSON object's scalar members.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut headers = Vec::with_capacity(object.len());
        let mut cells = Vec::with_capacity(object.len());
        let mut texts = Vec::with_capacity(object.len());
        for (name, value) in object {
            headers.push(name.clone());
            cells.push(Cell::from_json(value));
            texts.push(json_text(value));
        }
        Self {
            headers: headers.into(),
            cells,
            texts,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell under `name`. `None` if the column is absent, `Some(Null)` if present but empty.
    ///
    /// With duplicate header names the first occurrence wins.
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.position(name).map(|i| &self.cells[i])
    }

    /// Trimmed source text under `name`; empty if present but blank.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.texts[i].as_str())
    }

    /// Cells in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.headers.iter().map(String::as_str).zip(self.cells.iter())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => v.to_string(),
        Cell::Text(t) => t.trim().to_string(),
        Cell::Null => String::new(),
    }
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            String::new()
        }
    }
}

/// Parsed delimited text.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Arc<[String]>,
    rows: Vec<Row>,
}

impl Table {
    fn empty() -> Self {
        Self {
            headers: Arc::from(Vec::new()),
            rows: Vec::new(),
        }
    }

    /// Named headers in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Header-led delimited text parser.
#[derive(Debug, Clone)]
pub struct TableParser {
    delimiter: u8,
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new(',')
    }
}

impl TableParser {
    /// Create a parser for the given field delimiter. Non-ASCII delimiters fall back to ','.
    pub fn new(delimiter: char) -> Self {
        let delimiter = u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .unwrap_or_else(|| {
                warn!(delimiter = %delimiter, "non-ASCII delimiter, using ','");
                b','
            });
        Self { delimiter }
    }

    /// Create a parser from configuration.
    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(config.delimiter)
    }

    /// Parse text into a table.
    ///
    /// Quotes only open a quoted field at the start of a field; elsewhere they
    /// are literal. Blank and all-empty records are skipped.
    pub fn parse(&self, text: &str) -> Table {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        let mut records = reader
            .records()
            .map_while(|record| match record {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(error = %e, "stopping at unreadable record");
                    None
                }
            })
            .filter(|record| !record.iter().all(|f| f.trim().is_empty()));

        let Some(header_record) = records.next() else {
            return Table::empty();
        };

        // Unnamed header cells are not columns.
        let columns: Vec<usize> = header_record
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.trim().is_empty())
            .map(|(i, _)| i)
            .collect();
        let headers: Arc<[String]> = columns
            .iter()
            .filter_map(|&i| header_record.get(i))
            .map(|h| h.trim().to_string())
            .collect();

        let rows: Vec<Row> = records
            .map(|record| {
                let texts = columns
                    .iter()
                    .map(|&i| record.get(i).map(str::trim).unwrap_or_default().to_string())
                    .collect();
                Row::from_texts(headers.clone(), texts)
            })
            .collect();

        debug!(columns = headers.len(), rows = rows.len(), "parsed delimited text");

        Table { headers, rows }
    }
}

/// Parse text with the default comma delimiter.
pub fn parse_table(text: &str) -> Table {
    TableParser::default().parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(field: &str) -> String {
        if field.contains(&[',', '"', '\n'][..]) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    #[test]
    fn test_basic_parse() {
        let table = parse_table("symbol,trades,score\nABC,30,2.1\nXYZ,5,n/a\n");
        assert_eq!(table.headers(), &["symbol", "trades", "score"]);
        assert_eq!(table.len(), 2);

        let row = &table.rows()[0];
        assert_eq!(row.get("symbol"), Some(&Cell::Text("ABC".into())));
        assert_eq!(row.get("trades"), Some(&Cell::Number(30.0)));
        assert_eq!(table.rows()[1].get("score"), Some(&Cell::Text("n/a".into())));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_bom_and_crlf() {
        let table = parse_table("\u{feff}a,b\r\n1,2\r\n3,4\r\n");
        assert_eq!(table.headers(), &["a", "b"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get("b"), Some(&Cell::Number(4.0)));
    }

    #[test]
    fn test_quoted_fields() {
        let table = parse_table("name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n");
        let row = &table.rows()[0];
        assert_eq!(row.get("name"), Some(&Cell::Text("Smith, J".into())));
        assert_eq!(row.get("note"), Some(&Cell::Text("said \"hi\"".into())));
    }

    #[test]
    fn test_quote_inside_field_is_literal() {
        let table = parse_table("symbol,note\nAB\"C,5\" screen\nDEF,x\nGHI,y\n");
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].get("symbol"), Some(&Cell::Text("AB\"C".into())));
        assert_eq!(table.rows()[0].get("note"), Some(&Cell::Text("5\" screen".into())));
        assert_eq!(table.rows()[2].get("symbol"), Some(&Cell::Text("GHI".into())));
    }

    #[test]
    fn test_raw_text_kept_for_numeric_fields() {
        let table = parse_table("universe,symbol,buy\nhk, 0700 ,1e2\n");
        let row = &table.rows()[0];
        assert_eq!(row.get("symbol"), Some(&Cell::Number(700.0)));
        assert_eq!(row.raw("symbol"), Some("0700"));
        assert_eq!(row.raw("buy"), Some("1e2"));
        assert_eq!(row.raw("missing"), None);
    }

    #[test]
    fn test_unterminated_quote_closes_at_eof() {
        let table = parse_table("a,b\n1,\"open field");
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("b"), Some(&Cell::Text("open field".into())));
    }

    #[test]
    fn test_blank_and_empty_rows_dropped() {
        let table = parse_table("a,b\n\n1,2\n , \n,\n3,\n\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get("a"), Some(&Cell::Number(3.0)));
        assert_eq!(table.rows()[1].get("b"), Some(&Cell::Null));
    }

    #[test]
    fn test_short_and_long_rows() {
        let table = parse_table("a,b,c\n1\n1,2,3,4,5\n");
        let short = &table.rows()[0];
        assert_eq!(short.get("b"), Some(&Cell::Null));
        assert_eq!(short.get("c"), Some(&Cell::Null));
        let long = &table.rows()[1];
        assert_eq!(long.len(), 3);
        assert_eq!(long.get("c"), Some(&Cell::Number(3.0)));
    }

    #[test]
    fn test_unnamed_header_column_ignored() {
        let table = parse_table("a,,c\n1,2,3\n");
        assert_eq!(table.headers(), &["a", "c"]);
        let pairs: Vec<_> = table.rows()[0].iter().collect();
        assert_eq!(pairs, vec![("a", &Cell::Number(1.0)), ("c", &Cell::Number(3.0))]);
    }

    #[test]
    fn test_duplicate_header_first_wins() {
        let table = parse_table("a,a\n1,2\n");
        assert_eq!(table.rows()[0].get("a"), Some(&Cell::Number(1.0)));
    }

    #[test]
    fn test_custom_delimiter() {
        let table = TableParser::new(';').parse("symbol;score\nABC;1,5\n");
        assert_eq!(table.rows()[0].get("score"), Some(&Cell::Text("1,5".into())));
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        assert!(parse_table("").is_empty());
        assert!(parse_table("\n\n").headers().is_empty());
        assert!(parse_table("only,header\n").is_empty());
    }

    #[test]
    fn test_round_trip_with_embedded_delimiters_and_quotes() {
        let headers = ["symbol", "note", "score"];
        let rows = vec![
            vec!["ABC", "plain", "1.5"],
            vec!["D,E", "has \"quotes\"", "-2"],
            vec!["F", "multi\nline", "3e2"],
            vec!["G", "", "0.125"],
        ];

        let mut text = headers.join(",");
        text.push('\n');
        for row in &rows {
            let line: Vec<String> = row.iter().map(|f| quote(f)).collect();
            text.push_str(&line.join(","));
            text.push('\n');
        }

        let table = parse_table(&text);
        assert_eq!(table.len(), rows.len());
        for (parsed, original) in table.rows().iter().zip(&rows) {
            for (name, raw) in headers.iter().zip(original) {
                assert_eq!(parsed.get(name), Some(&Cell::parse(raw)), "column {name}");
            }
        }
    }

    #[test]
    fn test_row_from_json_object() {
        let value: serde_json::Value =
            serde_json::json!({"symbol": "ABC", "buy": 100, "note": null, "nested": {"x": 1}});
        let row = Row::from_json_object(value.as_object().unwrap());
        assert_eq!(row.get("buy"), Some(&Cell::Number(100.0)));
        assert_eq!(row.get("note"), Some(&Cell::Null));
        assert_eq!(row.get("nested"), Some(&Cell::Null));
        assert_eq!(row.raw("buy"), Some("100"));
        assert_eq!(row.raw("note"), Some(""));
    }

    #[test]
    fn test_short_row_pads_raw_text() {
        let table = parse_table("a,b\n1\n");
        assert_eq!(table.rows()[0].raw("b"), Some(""));
        assert_eq!(table.rows()[0].get("b"), Some(&Cell::Null));
    }
}
