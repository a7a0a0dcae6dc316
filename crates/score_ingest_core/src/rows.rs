use csv::{Reader, ReaderBuilder, StringRecord, Trim};

use crate::columns::{resolve_columns, ColumnAliases, ColumnMap};
use crate::error::IngestError;

/// Raw field values of one data row, positioned by [`ColumnMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub id: String,
    pub name: String,
    pub percentage: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    /// 1-based data row index, header excluded.
    pub row: usize,
    pub fields: Result<RawRow, String>,
}

/// Streams data rows out of an uploaded CSV file.
///
/// Opening the reader validates the encoding and the header row; those are the
/// only failures that abort a run. Problems with individual rows are yielded as
/// `Err` fields so the caller can record them and move on. Rows whose fields
/// are all blank (trailing `,,,` lines from spreadsheet exports) are skipped
/// and do not consume a row index.
pub struct RowReader<'a> {
    reader: Reader<&'a [u8]>,
    columns: ColumnMap,
    record: StringRecord,
    rows_read: usize,
    finished: bool,
}

impl<'a> RowReader<'a> {
    pub fn open(contents: &'a [u8], aliases: &ColumnAliases) -> Result<Self, IngestError> {
        std::str::from_utf8(contents)
            .map_err(|error| IngestError::malformed(format!("file is not valid UTF-8: {error}")))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(contents);
        let headers = reader
            .headers()
            .map_err(|error| IngestError::malformed(format!("unreadable header row: {error}")))?
            .clone();
        let columns = resolve_columns(&headers, aliases)?;

        Ok(Self {
            reader,
            columns,
            record: StringRecord::new(),
            rows_read: 0,
            finished: false,
        })
    }

    fn field(&self, index: usize) -> String {
        self.record.get(index).unwrap_or("").to_string()
    }

    fn raw_row(&self) -> RawRow {
        RawRow {
            id: self.field(self.columns.id),
            name: self.field(self.columns.name),
            percentage: self.field(self.columns.percentage),
            email: self.field(self.columns.email),
        }
    }
}

impl Iterator for RowReader<'_> {
    type Item = DecodedRow;

    fn next(&mut self) -> Option<DecodedRow> {
        while !self.finished {
            match self.reader.read_record(&mut self.record) {
                Ok(false) => self.finished = true,
                Ok(true) => {
                    if self.record.iter().all(str::is_empty) {
                        continue;
                    }
                    self.rows_read += 1;
                    return Some(DecodedRow {
                        row: self.rows_read,
                        fields: Ok(self.raw_row()),
                    });
                }
                Err(error) => {
                    if error.is_io_error() {
                        self.finished = true;
                    }
                    self.rows_read += 1;
                    return Some(DecodedRow {
                        row: self.rows_read,
                        fields: Err(format!("unreadable row: {error}")),
                    });
                }
            }
        }
        None
    }
}
