//! Single-writer CSV result logs.

use crate::error::{Result, SrmpError};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Header of the learner result files.
pub const RESULT_HEADER: &str = "alternatives_file,comparisons_file,k,elapsed_time,iterations,fitness";

/// One learner outcome: `alternatives_file,comparisons_file,k,elapsed_time,[iterations],fitness`.
///
/// `iterations` is left empty for learners that do not iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub alternatives_file: String,
    pub comparisons_file: String,
    pub k: usize,
    pub elapsed: Duration,
    pub iterations: Option<usize>,
    pub fitness: f64,
}

impl ResultRow {
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.alternatives_file,
            self.comparisons_file,
            self.k,
            self.elapsed.as_secs_f64(),
            self.iterations.map(|n| n.to_string()).unwrap_or_default(),
            self.fitness
        )
    }
}

/// Appends CSV lines to one file from any number of threads.
///
/// Lines travel through a channel to a dedicated thread, the only one
/// touching the file.
pub struct ResultWriter {
    path: PathBuf,
    sender: Option<Sender<String>>,
    handle: Option<JoinHandle<std::io::Result<usize>>>,
}

impl ResultWriter {
    /// Opens `path` for appending; writes `header` if the file is new or empty.
    pub fn open(path: impl AsRef<Path>, header: Option<&str>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let fresh = file.metadata()?.len() == 0;
        let mut out = BufWriter::new(file);
        if let (true, Some(header)) = (fresh, header) {
            writeln!(out, "{header}")?;
            out.flush()?;
        }
        let (sender, receiver) = mpsc::channel::<String>();
        let handle = thread::spawn(move || drain(out, receiver));
        Ok(Self {
            path,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Handle for producers; rows sent after [`ResultWriter::finish`] are lost.
    pub fn sender(&self) -> ResultSender {
        ResultSender {
            inner: self.sender.clone(),
        }
    }

    pub fn write_line(&self, line: impl Into<String>) -> Result<()> {
        self.sender().send_line(line)
    }

    /// Flushes pending lines and returns how many were written.
    pub fn finish(mut self) -> Result<usize> {
        self.close()
    }

    fn close(&mut self) -> Result<usize> {
        self.sender.take();
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SrmpError::Io(std::io::Error::other("result writer panicked")))?
                .map_err(SrmpError::Io),
            None => Ok(0),
        }
    }
}

impl Drop for ResultWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Cloneable producer side of a [`ResultWriter`].
#[derive(Debug, Clone)]
pub struct ResultSender {
    inner: Option<Sender<String>>,
}

impl ResultSender {
    pub fn send_line(&self, line: impl Into<String>) -> Result<()> {
        let closed = || SrmpError::Io(std::io::Error::other("result writer closed"));
        self.inner
            .as_ref()
            .ok_or_else(closed)?
            .send(line.into())
            .map_err(|_| closed())
    }

    pub fn send_row(&self, row: &ResultRow) -> Result<()> {
        self.send_line(row.to_csv_line())
    }
}

fn drain(mut out: BufWriter<File>, lines: mpsc::Receiver<String>) -> std::io::Result<usize> {
    let mut written = 0;
    for line in lines {
        writeln!(out, "{line}")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn row(fitness: f64, iterations: Option<usize>) -> ResultRow {
        ResultRow {
            alternatives_file: "A.csv".into(),
            comparisons_file: "D.csv".into(),
            k: 2,
            elapsed: Duration::from_millis(1500),
            iterations,
            fitness,
        }
    }

    #[test]
    fn test_row_format() {
        assert_eq!(row(0.75, Some(10)).to_csv_line(), "A.csv,D.csv,2,1.5,10,0.75");
        assert_eq!(row(1.0, None).to_csv_line(), "A.csv,D.csv,2,1.5,,1");
    }

    #[test]
    fn test_concurrent_producers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let writer = ResultWriter::open(&path, Some(RESULT_HEADER)).unwrap();
        let producers: Vec<_> = (0..4)
            .map(|i| {
                let sender = writer.sender();
                thread::spawn(move || {
                    for j in 0..25 {
                        sender.send_line(format!("{i},{j}")).unwrap();
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 100);
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], RESULT_HEADER);
        assert_eq!(lines.len(), 101);
    }

    #[test]
    fn test_appends_without_repeating_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        for _ in 0..2 {
            let writer = ResultWriter::open(&path, Some(RESULT_HEADER)).unwrap();
            writer.sender().send_row(&row(0.5, None)).unwrap();
            writer.finish().unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| *l == RESULT_HEADER).count(), 1);
        assert_eq!(text.lines().count(), 3);
    }
}
