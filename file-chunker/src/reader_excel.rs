use std::path::Path;

use calamine::{DataType, Reader};

use crate::ExtractError;

/// Spreadsheet reader (XLSX / XLS / ODS, auto-detected by calamine).
///
/// Reads the first sheet only. The first row is a header and is skipped; the
/// remaining cells are emitted column by column, top to bottom, trimmed, with
/// empty cells left out.
pub fn read_excel_segments(path: &Path) -> Result<Vec<String>, ExtractError> {
    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| ExtractError::read(path, e))?;

    let names: Vec<String> = workbook.sheet_names();
    let Some(first) = names.first() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(first)
        .map_err(|e| ExtractError::read(path, format!("failed to read sheet `{first}`: {e}")))?;

    let rows: Vec<&[DataType]> = range.rows().collect();
    let mut out = Vec::new();
    for col in 0..range.width() {
        for row in rows.iter().skip(1) {
            let Some(cell) = row.get(col) else { continue };
            let value = cell_to_string(cell);
            let value = value.trim();
            if !value.is_empty() {
                out.push(value.to_string());
            }
        }
    }
    Ok(out)
}

fn cell_to_string(c: &DataType) -> String {
    match c {
        DataType::Empty => String::new(),
        DataType::String(s) => s.replace("\r\n", "\n"),
        DataType::Float(f) => {
            if f.fract() == 0.0 { format!("{}", *f as i64) } else { f.to_string() }
        }
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => if *b { "True".into() } else { "False".into() },
        DataType::Error(e) => format!("#ERR:{:?}", e),
        // Dates, durations and any future variants
        other => format!("{}", other),
    }
}
