//! Вывод одного и того же текста в консоль и в файл

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{MatmulError, Result};

/// Пара получателей: консольный поток и файл результатов
pub struct DualSink<W: Write> {
    console: W,
    file: BufWriter<File>,
    path: PathBuf,
}

impl<W: Write> DualSink<W> {
    /// Открывает файл до начала замеров
    pub fn create(path: &Path, console: W) -> Result<Self> {
        let file = File::create(path).map_err(|source| MatmulError::OutputUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            console,
            file: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Пишет текст в оба получателя и сбрасывает буферы
    pub fn emit(&mut self, text: &str) -> Result<()> {
        self.write_both(text).map_err(|source| MatmulError::OutputUnavailable {
            path: self.path.clone(),
            source,
        })
    }

    fn write_both(&mut self, text: &str) -> io::Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.flush()?;
        self.console.write_all(text.as_bytes())?;
        self.console.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_both_destinations_get_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut console = Vec::new();

        let mut sink = DualSink::create(&path, &mut console).unwrap();
        sink.emit("a,").unwrap();
        sink.emit("b\n").unwrap();
        drop(sink);

        assert_eq!(console, b"a,b\n");
        assert_eq!(fs::read(&path).unwrap(), console);
    }

    #[test]
    fn test_missing_directory_is_output_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let result = DualSink::create(&path, io::sink());
        assert!(matches!(result, Err(MatmulError::OutputUnavailable { path: p, .. }) if p == path));
    }
}
