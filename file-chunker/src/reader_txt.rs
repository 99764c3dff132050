use std::fs;
use std::path::Path;

use crate::ExtractError;

/// Read a text file and return its non-blank lines, trimmed, in order.
pub fn read_txt_segments(path: &Path) -> Result<Vec<String>, ExtractError> {
    read_txt_segments_with_encoding(path, None)
}

/// Same as [`read_txt_segments`] with an explicit source encoding.
/// Supported encodings: "utf-8" (default), "shift_jis" (aliases: "sjis", "cp932", "windows-31j"),
/// "windows-1252", "utf-16le", "utf-16be". Unknown values fall back to UTF-8 (lossy).
pub fn read_txt_segments_with_encoding(
    path: &Path,
    encoding: Option<&str>,
) -> Result<Vec<String>, ExtractError> {
    let bytes = fs::read(path).map_err(|e| ExtractError::read(path, e))?;
    let text = decode(&bytes, encoding);
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn decode(bytes: &[u8], encoding: Option<&str>) -> String {
    let lower = encoding.unwrap_or("").to_ascii_lowercase();
    match lower.as_str() {
        "shift_jis" | "sjis" | "cp932" | "windows-31j" => {
            let (cow, _enc_used, _had_errors) = encoding_rs::SHIFT_JIS.decode(bytes);
            cow.into_owned()
        }
        "windows-1252" | "cp1252" => {
            let (cow, _enc_used, _had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            cow.into_owned()
        }
        "utf-16le" | "utf16le" => {
            let (cow, _had_errors) = encoding_rs::UTF_16LE.decode_with_bom_removal(bytes);
            cow.into_owned()
        }
        "utf-16be" | "utf16be" => {
            let (cow, _had_errors) = encoding_rs::UTF_16BE.decode_with_bom_removal(bytes);
            cow.into_owned()
        }
        _ => {
            let (cow, _had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
            cow.into_owned()
        }
    }
}
