//! CSV/TSV parser with delimiter detection.

use std::io::{BufRead, BufReader};

use crate::error::{FormularyError, Result};
use crate::table::Table;

use super::infer::{dedupe_headers, typed_column};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited text into typed tables.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse bytes into a table, returning the delimiter that was used.
    pub fn parse_bytes(&self, source_name: &str, bytes: &[u8]) -> Result<(Table, u8)> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes)
                .ok_or_else(|| FormularyError::load(source_name, "No lines to analyze"))?,
        };

        let table = self.read_table(source_name, bytes, delimiter)?;
        Ok((table, delimiter))
    }

    fn read_table(&self, source_name: &str, bytes: &[u8], delimiter: u8) -> Result<Table> {
        let csv_error = |e: csv::Error| FormularyError::load(source_name, e.to_string());

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();

        let headers: Vec<String> = if self.config.has_header {
            match records.next() {
                Some(record) => record
                    .map_err(csv_error)?
                    .iter()
                    .map(|s| s.trim().to_string())
                    .collect(),
                None => return Err(FormularyError::load(source_name, "No header row found")),
            }
        } else {
            Vec::new()
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (row_idx, result) in records.enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            let record = result.map_err(csv_error)?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        // Without a header, width comes from the first data row
        let headers = if self.config.has_header {
            headers
        } else {
            let width = rows.first().map_or(0, Vec::len);
            (0..width).map(|i| format!("column_{}", i + 1)).collect()
        };

        if headers.is_empty() {
            return Err(FormularyError::load(source_name, "No columns found"));
        }

        let headers = dedupe_headers(headers);
        let expected_cols = headers.len();

        for row in &mut rows {
            // Pad short rows, truncate long ones
            row.resize(expected_cols, String::new());
        }

        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<String> = rows.iter().map(|r| r[idx].clone()).collect();
                typed_column(name, &cells)
            })
            .collect();

        Table::from_columns(columns).map_err(|e| FormularyError::load(source_name, e.to_string()))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Short format label for a delimiter.
pub(crate) fn delimiter_format(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

/// Pick the delimiter that splits the first lines most consistently.
fn detect_delimiter(bytes: &[u8]) -> Option<u8> {
    let sample: Vec<String> = BufReader::new(bytes)
        .lines()
        .take(10)
        .map_while(|line| line.ok())
        .filter(|line| !line.trim().is_empty())
        .collect();

    if sample.is_empty() {
        return None;
    }

    // Ties go to the earlier candidate.
    let best = DELIMITERS
        .iter()
        .map(|&delimiter| (delimiter, delimiter_score(&sample, delimiter)))
        .filter(|&(_, score)| score > 0)
        .fold(None, |best: Option<(u8, usize)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        });

    Some(best.map_or(b',', |(delimiter, _)| delimiter))
}

/// Rank a delimiter by how many fields it splits the header into, rewarding
/// lines that agree on that count. Tabs win exact ties against other
/// consistent delimiters.
fn delimiter_score(sample: &[String], delimiter: u8) -> usize {
    let counts: Vec<usize> = sample
        .iter()
        .map(|line| unquoted_occurrences(line, delimiter as char))
        .collect();

    let header = counts[0];
    if header == 0 {
        return 0;
    }

    if counts.iter().all(|&count| count == header) {
        let tab_bonus = if delimiter == b'\t' { 100 } else { 0 };
        return header * 1000 + tab_bonus;
    }

    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    let spread = counts
        .iter()
        .map(|&count| (count as f64 - mean).powi(2))
        .sum::<f64>()
        / n;

    if spread < 1.0 { header * 100 } else { header }
}

/// Occurrences of `needle` outside double quotes.
fn unquoted_occurrences(line: &str, needle: char) -> usize {
    line.chars()
        .scan(false, |quoted, ch| {
            if ch == '"' {
                *quoted = !*quoted;
            }
            Some(!*quoted && ch == needle)
        })
        .filter(|&hit| hit)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnType, Value};

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted() {
        let data = b"name;note\n\"a,b\";x\n\"c,d\";y";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_parse_csv_types() {
        let parser = Parser::new();
        let data = b"Product,Price,Quantity,In_Stock\nLaptop,999.5,2,True\nMouse,20,10,False";
        let (table, delimiter) = parser.parse_bytes("inv.csv", data).unwrap();

        assert_eq!(delimiter, b',');
        assert_eq!(
            table.column_names(),
            vec!["Product", "Price", "Quantity", "In_Stock"]
        );
        assert_eq!(table.row_count(), 2);
        let price = table.column("Price").unwrap();
        assert_eq!(price.column_type(), ColumnType::Float);
        assert_eq!(
            table.column("Quantity").unwrap().column_type(),
            ColumnType::Integer
        );
        assert_eq!(table.get(1, "In_Stock"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let parser = Parser::new();
        let (table, _) = parser
            .parse_bytes("short.csv", b"a,b,c\n1,2\n3,4,5")
            .unwrap();
        assert_eq!(table.get(0, "c"), Some(&Value::Null));
        assert_eq!(table.get(1, "c"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_parse_header_only() {
        let parser = Parser::new();
        let (table, _) = parser.parse_bytes("empty.csv", b"a,b\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_empty_input_fails() {
        let parser = Parser::new();
        let err = parser.parse_bytes("nothing.csv", b"").unwrap_err();
        assert!(matches!(err, FormularyError::Load { .. }));
    }

    #[test]
    fn test_parse_without_header() {
        let parser = Parser::with_config(ParserConfig {
            has_header: false,
            ..Default::default()
        });
        let (table, _) = parser.parse_bytes("raw.csv", b"1,x\n2,y").unwrap();
        assert_eq!(table.column_names(), vec!["column_1", "column_2"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(1),
            ..Default::default()
        });
        let (table, _) = parser.parse_bytes("m.csv", b"a\n1\n2\n3").unwrap();
        assert_eq!(table.row_count(), 1);
    }
}
