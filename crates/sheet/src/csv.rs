use crate::book::Book;
use crate::error::Result;
use crate::sheet::Sheet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// CSV reader/writer options
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Whether to trim whitespace around every cell when reading
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            quote: b'"',
            trim: false,
        }
    }
}

impl CsvOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    /// Set whether cells are trimmed on read
    #[must_use]
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}

impl Sheet {
    /// Load a sheet from a CSV file. The first record is the header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_csv_with_options(path, CsvOptions::default())
    }

    /// Load a sheet from a CSV file with custom options
    pub fn from_csv_with_options<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut sheet = Self::from_csv_reader(reader, options)?;
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            sheet.set_name(stem);
        }
        Ok(sheet)
    }

    /// Load a sheet from a CSV string
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes(), CsvOptions::default())
    }

    /// Load a sheet from a reader
    pub fn from_csv_reader<R: Read>(reader: R, options: CsvOptions) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false) // We handle headers ourselves
            .flexible(true)
            .from_reader(reader);

        let mut data: Vec<Vec<String>> = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let row = record
                .iter()
                .map(|field| {
                    if options.trim {
                        field.trim().to_string()
                    } else {
                        field.to_string()
                    }
                })
                .collect();
            data.push(row);
        }

        Ok(Sheet::from_data(data))
    }

    /// Save the sheet to a CSV file
    pub fn save_as_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_as_csv_with_options(path, CsvOptions::default())
    }

    /// Save the sheet to a CSV file with custom options
    pub fn save_as_csv_with_options<P: AsRef<Path>>(
        &self,
        path: P,
        options: CsvOptions,
    ) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        self.write_csv(writer, options)
    }

    /// Write the header row and data rows to a writer as CSV
    pub fn write_csv<W: Write>(&self, writer: W, options: CsvOptions) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .from_writer(writer);

        if !self.headers().is_empty() {
            csv_writer.write_record(self.headers())?;
        }
        for row in self.rows() {
            csv_writer.write_record(row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Convert the sheet to a CSV string
    #[must_use]
    pub fn to_csv_string(&self) -> String {
        let mut buffer = Vec::new();
        // Ignore errors for string conversion
        let _ = self.write_csv(&mut buffer, CsvOptions::default());
        String::from_utf8_lossy(&buffer).to_string()
    }
}

impl Book {
    /// Load a book from a directory of CSV files.
    /// Each file becomes a sheet named after its file stem, in file name order.
    pub fn from_csv_dir<P: AsRef<Path>>(id: &str, path: P) -> Result<Self> {
        let mut book = Book::new(id);
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if let Some(ext) = file_path.extension() {
                if ext == "csv" || ext == "tsv" {
                    paths.push(file_path);
                }
            }
        }
        paths.sort();

        for file_path in paths {
            let options = if file_path.extension().is_some_and(|ext| ext == "tsv") {
                CsvOptions::tsv()
            } else {
                CsvOptions::default()
            };
            let sheet = Sheet::from_csv_with_options(&file_path, options)?;
            let sheet_name = sheet.name().to_string();
            book.add_sheet(&sheet_name, sheet)?;
        }

        Ok(book)
    }

    /// Save all sheets to a directory as CSV files
    pub fn save_as_csv_dir<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::create_dir_all(path.as_ref())?;

        for sheet in self.sheets() {
            let file_path = path.as_ref().join(format!("{}.csv", sheet.name()));
            sheet.save_as_csv(&file_path)?;
        }

        Ok(())
    }
}
