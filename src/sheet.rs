//! Spreadsheet snapshot writer
//!
//! The snapshot lives in the first sheet of an `.xlsx` workbook and is fully
//! replaced on every write. Other sheets in an existing workbook are kept.

use crate::{constants::SHEET_HEADERS, error::PersistenceError, types::AssetRecord};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Writes listing batches to a workbook on disk
#[derive(Debug, Clone)]
pub struct SheetWriter {
    path: PathBuf,
}

impl SheetWriter {
    /// Creates a writer targeting `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the target path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the snapshot with `records`
    ///
    /// A missing file is created. An existing file that cannot be read as a
    /// workbook is left untouched and reported as [`PersistenceError::Corrupt`].
    /// The file is synced to disk before this returns.
    pub fn write_snapshot(&self, records: &[AssetRecord]) -> Result<(), PersistenceError> {
        let mut book = self.open_or_create()?;

        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| PersistenceError::MissingSheet {
                path: self.path.clone(),
            })?;

        clear_sheet(sheet);
        fill_sheet(sheet, records);

        umya_spreadsheet::writer::xlsx::write(&book, &self.path)
            .map_err(|e| PersistenceError::write(&self.path, e))?;

        File::open(&self.path)
            .and_then(|file| file.sync_all())
            .map_err(|e| PersistenceError::io(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            rows = records.len(),
            "Snapshot written"
        );

        Ok(())
    }

    fn open_or_create(&self) -> Result<Spreadsheet, PersistenceError> {
        match fs::metadata(&self.path) {
            Ok(_) => umya_spreadsheet::reader::xlsx::read(&self.path)
                .map_err(|e| PersistenceError::corrupt(&self.path, e)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Creating new snapshot workbook");
                Ok(umya_spreadsheet::new_file())
            }
            Err(e) => Err(PersistenceError::io(&self.path, e)),
        }
    }
}

/// Deletes every populated row
fn clear_sheet(sheet: &mut Worksheet) {
    let rows = sheet.get_highest_row();
    if rows > 0 {
        sheet.remove_row(&1, &rows);
    }
}

/// Writes the header row followed by one row per record, in batch order
fn fill_sheet(sheet: &mut Worksheet, records: &[AssetRecord]) {
    for (col, header) in (1u32..).zip(SHEET_HEADERS) {
        sheet.get_cell_mut((col, 1)).set_value(header);
    }

    for (row, record) in (2u32..).zip(records) {
        sheet.get_cell_mut((1, row)).set_value(record.name.as_str());
        sheet.get_cell_mut((2, row)).set_value(record.symbol.as_str());
        sheet
            .get_cell_mut((3, row))
            .set_value_number(record.price_usd);
        sheet
            .get_cell_mut((4, row))
            .set_value_number(record.market_cap_usd);
        sheet
            .get_cell_mut((5, row))
            .set_value_number(record.volume_24h_usd);
        sheet
            .get_cell_mut((6, row))
            .set_value_number(record.percent_change_24h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn batch(n: usize) -> Vec<AssetRecord> {
        (0..n)
            .map(|i| {
                let i = i as f64;
                AssetRecord::new(
                    format!("Coin {i}"),
                    format!("C{i}"),
                    100.0 + i * 0.25,
                    1_000_000.0 - i * 1000.0,
                    5_000.5 + i,
                    -3.5 + i,
                )
            })
            .collect()
    }

    /// Reads the first sheet back as strings, one Vec per row
    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let book = umya_spreadsheet::reader::xlsx::read(path).unwrap();
        let sheet = book.get_sheet(&0).unwrap();
        (1..=sheet.get_highest_row())
            .map(|row| (1..=6u32).map(|col| sheet.get_value((col, row))).collect())
            .collect()
    }

    fn assert_rows_match(rows: &[Vec<String>], records: &[AssetRecord]) {
        assert_eq!(rows.len(), records.len() + 1);
        assert_eq!(rows[0], SHEET_HEADERS.map(String::from).to_vec());

        for (row, record) in rows[1..].iter().zip(records) {
            assert_eq!(row[0], record.name);
            assert_eq!(row[1], record.symbol);
            let numbers: Vec<f64> = row[2..].iter().map(|v| v.parse().unwrap()).collect();
            let expected = [
                record.price_usd,
                record.market_cap_usd,
                record.volume_24h_usd,
                record.percent_change_24h,
            ];
            for (got, want) in numbers.iter().zip(expected) {
                assert!((got - want).abs() < 1e-6, "{got} != {want}");
            }
        }
    }

    #[test]
    fn test_round_trip_fresh_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.xlsx");
        let writer = SheetWriter::new(&path);
        let records = batch(7);

        writer.write_snapshot(&records).unwrap();

        assert!(path.exists());
        assert_rows_match(&read_rows(&path), &records);
    }

    #[test]
    fn test_rewrite_leaves_no_stale_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.xlsx");
        let writer = SheetWriter::new(&path);

        writer.write_snapshot(&batch(10)).unwrap();
        assert_eq!(read_rows(&path).len(), 11);

        let smaller: Vec<AssetRecord> = batch(3)
            .into_iter()
            .map(|mut r| {
                r.name = format!("{} v2", r.name);
                r
            })
            .collect();
        writer.write_snapshot(&smaller).unwrap();

        let rows = read_rows(&path);
        assert_rows_match(&rows, &smaller);
        assert!(rows.iter().all(|row| !row[0].starts_with("Coin 9")));
    }

    #[test]
    fn test_empty_batch_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.xlsx");

        SheetWriter::new(&path).write_snapshot(&[]).unwrap();

        assert_rows_match(&read_rows(&path), &[]);
    }

    #[test]
    fn test_corrupt_file_is_fatal_and_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.xlsx");
        fs::write(&path, b"definitely not a workbook").unwrap();

        let err = SheetWriter::new(&path).write_snapshot(&batch(2)).unwrap_err();

        assert!(matches!(err, PersistenceError::Corrupt { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"definitely not a workbook");
    }

    #[test]
    fn test_other_sheets_are_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.xlsx");

        let mut book = umya_spreadsheet::new_file();
        book.get_sheet_mut(&0)
            .unwrap()
            .get_cell_mut((1, 1))
            .set_value("old header");
        book.new_sheet("Notes")
            .unwrap()
            .get_cell_mut((1, 1))
            .set_value("keep me");
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        SheetWriter::new(&path).write_snapshot(&batch(2)).unwrap();

        assert_rows_match(&read_rows(&path), &batch(2));
        let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        assert_eq!(book.get_sheet(&1).unwrap().get_value((1, 1)), "keep me");
    }
}
