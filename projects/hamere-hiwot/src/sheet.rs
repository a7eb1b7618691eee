/*!
Best-effort tabular import/export.

Imports are header-keyed CSV: the first row names the columns, every later
row becomes a map from column name to trimmed cell. Records the reader
cannot make sense of are skipped and counted rather than failing the whole
upload.
*/
use std::collections::HashMap;
use std::io::Read;

pub type Row = HashMap<String, String>;

#[derive(Debug, Default)]
pub struct SheetRows {
    pub rows: Vec<Row>,
    pub skipped: usize,
}

pub fn read_rows<R: Read>(r: R) -> Result<SheetRows, String> {
    tracing::trace!("sheet::read_rows(...) called.");

    let mut csv_reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(r);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| format!("Unable to read header row: {}", e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err("Header row is empty".to_string());
    }

    let mut out = SheetRows::default();
    for (n, res) in csv_reader.records().enumerate() {
        match res {
            Ok(record) => {
                let row: Row = headers
                    .iter()
                    .zip(record.iter())
                    .filter(|(_, v)| !v.is_empty())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect();
                out.rows.push(row);
            }
            Err(e) => {
                match e.position() {
                    Some(p) => tracing::debug!("skipping line {}: {}", p.line(), e),
                    None => tracing::debug!("skipping record {}: {}", n, e),
                }
                out.skipped += 1;
            }
        }
    }

    Ok(out)
}

pub fn write_csv<I>(headers: &[&str], rows: I) -> Result<String, String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(headers)
        .map_err(|e| format!("Error writing CSV header: {}", e))?;
    for row in rows {
        w.write_record(&row)
            .map_err(|e| format!("Error writing CSV row: {}", e))?;
    }
    let bytes = w
        .into_inner()
        .map_err(|e| format!("Error flushing CSV: {}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("CSV output is not UTF-8: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows_keys_by_header() {
        let data = "name,age,grade\n Abebe , 12 ,salsay\n# a comment\nKebede,9,\n";
        let sheet = read_rows(data.as_bytes()).unwrap();
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0]["name"], "Abebe");
        assert_eq!(sheet.rows[0]["age"], "12");
        assert!(!sheet.rows[1].contains_key("grade"), "empty cells are dropped");
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let data = "name,age,grade\nOnly Name\n";
        let sheet = read_rows(data.as_bytes()).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].len(), 1);
    }

    #[test]
    fn test_write_csv_quotes_when_needed() {
        let out = write_csv(
            &["ID", "Description"],
            vec![vec!["1".to_string(), "Offering, \"weekly\"".to_string()]],
        )
        .unwrap();
        assert_eq!(out, "ID,Description\n1,\"Offering, \"\"weekly\"\"\"\n");
    }
}
