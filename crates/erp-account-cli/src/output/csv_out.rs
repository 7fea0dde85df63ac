use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{format_scalar, ROW_FIELDS};

/// Write output as CSV to stdout.
///
/// Outputs carrying rows (records, lines) are written one row per line;
/// anything else as a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    if let Err(e) = write_all(&mut wtr, value) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_all<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    write_csv(wtr, value)?;
    wtr.flush()?;
    Ok(())
}

fn write_csv<W: Write>(wtr: &mut csv::Writer<W>, value: &Value) -> csv::Result<()> {
    match value {
        Value::Object(map) => {
            let body = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            match rows_of(body) {
                Some(rows) => write_rows(wtr, rows),
                None => write_fields(wtr, body),
            }
        }
        Value::Array(rows) => write_rows(wtr, rows),
        _ => wtr.write_record([format_scalar(value)]),
    }
}

fn rows_of(map: &Map<String, Value>) -> Option<&[Value]> {
    ROW_FIELDS
        .iter()
        .find_map(|f| map.get(*f).and_then(Value::as_array))
        .map(Vec::as_slice)
}

fn write_fields<W: Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_scalar(val)])?;
    }
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([format_scalar(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}
