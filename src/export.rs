//! Review artifacts: screening spreadsheet, BibTeX and PRISMA flow counts.

mod bibtex;
mod csv;
mod prisma;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::Result;

pub use self::csv::{CsvRow, write_csv, write_csv_file};
pub use bibtex::{to_bibtex, write_bibtex_file};
pub use prisma::{PrismaReport, ScreeningCounts, write_prisma_json_file};

/// Creates `path` for writing, creating missing parent directories first.
pub(crate) fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_output_makes_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.txt");
        create_output(&path).unwrap();
        assert!(path.exists());
    }
}
