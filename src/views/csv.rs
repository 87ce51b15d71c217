//! CSV templates and bulk-upload parsing.
//!
//! Quoting follows RFC 4180: fields containing a comma, quote or line break
//! are wrapped in double quotes, with embedded quotes doubled.

use libreforms_common::{FormDefinition, FormSchema, ValueKind};

/// Separator for multiple values of a list field inside one CSV cell.
pub const LIST_SEPARATOR: char = ';';

/// Header row of field names, plus a row of defaults unless suppressed.
pub fn template(form: &FormDefinition) -> String {
    let header: Vec<String> = form.fields().iter().map(|f| f.name.clone()).collect();
    let mut out = write_row(&header);
    if !form.options().suppress_default_values {
        let defaults: Vec<String> = form
            .fields()
            .iter()
            .map(|f| f.default_value().unwrap_or_default().to_string())
            .collect();
        out.push_str(&write_row(&defaults));
    }
    out
}

fn write_row(cells: &[String]) -> String {
    let mut line = cells
        .iter()
        .map(|cell| quote(cell))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// One parsed CSV record and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub cells: Vec<String>,
}

/// Split CSV text into records. A leading byte-order mark and blank lines
/// are skipped.
pub fn parse(input: &str) -> Result<Vec<Record>, String> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut records = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted_field = false;
    let mut closed_quote = false;
    let mut chars = input.chars().peekable();
    let mut line = 1usize;
    let mut start = 1usize;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    closed_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            ',' => {
                cells.push(std::mem::take(&mut field));
                quoted_field = false;
                closed_quote = false;
            }
            '\r' => {}
            '\n' => {
                end_record(&mut records, &mut cells, &mut field, quoted_field, start);
                quoted_field = false;
                closed_quote = false;
                line += 1;
                start = line;
            }
            _ if closed_quote => {
                return Err(format!("unexpected text after closing quote on line {}", line));
            }
            '"' if field.is_empty() && !quoted_field => {
                in_quotes = true;
                quoted_field = true;
            }
            '"' => return Err(format!("unexpected quote on line {}", line)),
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(format!("unterminated quoted field on line {}", line));
    }
    end_record(&mut records, &mut cells, &mut field, quoted_field, start);
    Ok(records)
}

fn end_record(
    records: &mut Vec<Record>,
    cells: &mut Vec<String>,
    field: &mut String,
    quoted_field: bool,
    line: usize,
) {
    if cells.is_empty() && field.is_empty() && !quoted_field {
        return;
    }
    cells.push(std::mem::take(field));
    records.push(Record {
        line,
        cells: std::mem::take(cells),
    });
}

/// A data row turned into form pairs, tagged with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: usize,
    pub pairs: Vec<(String, String)>,
}

/// Turn CSV records (first record = header) into form pairs, one [`Row`]
/// per record. List fields are split on [`LIST_SEPARATOR`].
pub fn records_to_pairs(schema: &FormSchema, records: &[Record]) -> Result<Vec<Row>, String> {
    let (header, rows) = records
        .split_first()
        .ok_or_else(|| "upload is empty".to_string())?;
    if rows.is_empty() {
        return Err("upload has a header row but no data rows".to_string());
    }

    let mut out = Vec::with_capacity(rows.len());
    for record in rows {
        if record.cells.len() != header.cells.len() {
            return Err(format!(
                "row on line {} has {} cells, header has {}",
                record.line,
                record.cells.len(),
                header.cells.len()
            ));
        }
        let mut pairs = Vec::new();
        for (name, cell) in header.cells.iter().zip(&record.cells) {
            let is_list = schema
                .rule(name)
                .is_some_and(|rule| rule.kind == ValueKind::List);
            if is_list {
                pairs.extend(
                    cell.split(LIST_SEPARATOR)
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(|item| (name.clone(), item.to_string())),
                );
            } else {
                pairs.push((name.clone(), cell.clone()));
            }
        }
        out.push(Row {
            line: record.line,
            pairs,
        });
    }
    Ok(out)
}
