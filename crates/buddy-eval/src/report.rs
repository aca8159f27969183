//! CSV output of an evaluation run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;

use crate::error::EvalResult;
use crate::harness::EvalRecord;

pub const CSV_HEADER: [&str; 8] = [
    "User Question",
    "Triggered",
    "Location",
    "Time Phrase",
    "Start Hour",
    "End Hour",
    "Forecast Response",
    "Summary",
];

/// Byte order mark so spreadsheet tools read the file as UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Shown when a prompt produced no forecast text.
const NOT_AVAILABLE: &str = "N/A";

fn one_line(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', " | ")
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write records as CSV to any writer.
pub fn write_records<W: Write>(writer: W, records: &[EvalRecord]) -> EvalResult<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.prompt.clone(),
            record.triggered.to_string(),
            optional(record.location.as_deref()),
            optional(record.time_phrase.as_deref()),
            optional(record.start_hour),
            optional(record.end_hour),
            record
                .response
                .as_deref()
                .map_or_else(|| NOT_AVAILABLE.to_string(), one_line),
            optional(record.summary.as_deref()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records to `path`, optionally prefixed with a UTF-8 BOM for Excel.
pub fn write_csv(path: &Path, records: &[EvalRecord], excel_bom: bool) -> EvalResult<()> {
    let mut file = BufWriter::new(File::create(path)?);
    if excel_bom {
        file.write_all(UTF8_BOM)?;
    }
    write_records(&mut file, records)?;
    file.flush()?;

    tracing::info!("Wrote {} evaluation rows to {:?}", records.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(response: Option<&str>) -> EvalRecord {
        EvalRecord {
            prompt: "Will it rain in Toronto?".into(),
            expected_location: Some("Toronto".into()),
            triggered: true,
            location: Some("Toronto".into()),
            time_phrase: None,
            start_hour: Some(0),
            end_hour: Some(2),
            response: response.map(String::from),
            summary: None,
            forecast_ok: response.is_some(),
        }
    }

    #[test]
    fn header_and_flattened_reply() {
        let mut out = Vec::new();
        write_records(
            &mut out,
            &[record(Some("In Toronto it\u{2019}ll rain.\nBring an umbrella."))],
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("User Question,Triggered,Location,Time Phrase,Start Hour,End Hour,Forecast Response,Summary")
        );
        assert_eq!(
            lines.next(),
            Some("Will it rain in Toronto?,true,Toronto,,0,2,In Toronto it\u{2019}ll rain. | Bring an umbrella.,")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn missing_response_is_marked() {
        let mut out = Vec::new();
        write_records(&mut out, &[record(None)]).unwrap();
        assert!(String::from_utf8(out).unwrap().contains(",N/A,"));
    }

    #[test]
    fn bom_is_optional() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("plain.csv");
        write_csv(&plain, &[record(None)], false).unwrap();
        assert!(std::fs::read(&plain).unwrap().starts_with(b"User Question"));

        let excel = dir.path().join("excel.csv");
        write_csv(&excel, &[record(None)], true).unwrap();
        let bytes = std::fs::read(&excel).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert!(bytes[UTF8_BOM.len()..].starts_with(b"User Question"));
    }
}
