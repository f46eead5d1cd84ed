use std::io::Write;
use std::path::Path;

use serde::Serialize;

/// Write records to a file as JSON lines, one record per line.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)?;
    for record in records {
        serde_json::to_writer(&mut file, record)?;
        file.write_all(b"\n")?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::UrlResult;

    #[test]
    fn writes_one_record_per_line() {
        let dir = std::env::temp_dir().join("uncloak-output-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("results.jsonl");

        let records = vec![
            UrlResult {
                url: "http://h/a".to_string(),
                status: 200,
                size: 10,
            },
            UrlResult {
                url: "http://h/b".to_string(),
                status: 403,
                size: 0,
            },
        ];
        write_jsonl(&path, &records).unwrap();

        let data = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = data.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"status\":200"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
