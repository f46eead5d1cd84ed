use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::iter::Fuse;
use std::path::Path;

const BUILTIN: &str = include_str!("../data/wordlist.txt");

/// Lazy, finite source of candidate words. Exhaustion is final: once the
/// underlying reader runs dry, every further call keeps yielding `None`.
pub struct Wordlist {
    lines: Fuse<io::Lines<BufReader<Box<dyn Read + Send + Sync>>>>,
}

impl Wordlist {
    /// Words from a newline-delimited file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::from_reader(File::open(path)?))
    }

    /// Words from any reader, one per line.
    pub fn from_reader(reader: impl Read + Send + Sync + 'static) -> Self {
        let boxed: Box<dyn Read + Send + Sync> = Box::new(reader);
        Self {
            lines: BufReader::new(boxed).lines().fuse(),
        }
    }

    /// The embedded default list, used when no wordlist is supplied.
    pub fn builtin() -> Self {
        Self::from_reader(Cursor::new(BUILTIN))
    }
}

impl Iterator for Wordlist {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self.lines.next()? {
            Ok(line) => Some(line),
            Err(err) => {
                tracing::debug!("wordlist read error, stopping: {err}");
                None
            }
        }
    }
}
