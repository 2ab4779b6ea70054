use crate::error::LoadError;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Streaming CSV source. The first record is the header; every later record
/// is a data row, yielded lazily in file order. The source is single-pass:
/// once consumed it must be reopened. Row width is deliberately NOT checked
/// against the header here; that contract belongs to the loader, which
/// decides how much prior work survives a malformed row.
pub struct CsvSource {
    header: Vec<String>,
    records: StringRecordsIntoIter<File>,
}

impl CsvSource {
    /// Open `path` and read its header row.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|_| LoadError::SourceNotFound(path.display().to_string()))?;
        // flexible so ragged rows reach the loader instead of failing the parse
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut first = StringRecord::new();
        if !reader.read_record(&mut first)? {
            return Err(LoadError::SourceEmpty);
        }
        let header: Vec<String> = first.iter().map(str::to_string).collect();
        info!(path = %path.display(), columns = header.len(), "opened CSV source");

        Ok(Self {
            header,
            records: reader.into_records(),
        })
    }

    /// Column names from the first record. Immutable for the source's life.
    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl Iterator for CsvSource {
    type Item = Result<Vec<String>, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|rec| {
            rec.map(|r| r.iter().map(str::to_string).collect())
                .map_err(LoadError::from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_is_source_not_found() {
        assert!(matches!(
            CsvSource::open("no/such/file.csv"),
            Err(LoadError::SourceNotFound(_))
        ));
    }

    #[test]
    fn empty_file_is_source_empty() -> Result<()> {
        let file = NamedTempFile::new()?;
        assert!(matches!(
            CsvSource::open(file.path()),
            Err(LoadError::SourceEmpty)
        ));
        Ok(())
    }

    #[test]
    fn yields_header_then_rows_in_order() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "policyID,statecode")?;
        writeln!(file, "1,FL")?;
        writeln!(file, "2,GA")?;

        let mut source = CsvSource::open(file.path())?;
        assert_eq!(source.header(), ["policyID", "statecode"]);
        assert_eq!(source.next().unwrap()?, vec!["1", "FL"]);
        assert_eq!(source.next().unwrap()?, vec!["2", "GA"]);
        assert!(source.next().is_none());
        Ok(())
    }

    #[test]
    fn ragged_rows_pass_through_unchecked() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "a,b")?;
        writeln!(file, "1")?;
        writeln!(file, "1,2,3")?;

        let source = CsvSource::open(file.path())?;
        let rows: Vec<Vec<String>> = source.collect::<Result<_, _>>()?;
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].len(), 3);
        Ok(())
    }
}
