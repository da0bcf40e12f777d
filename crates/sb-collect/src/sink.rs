//! Sink contract: where collected entries go.

use std::collections::BTreeMap;
use std::io::Read;

use crate::collector::CollectedEntry;
use crate::error::SinkError;

/// Receiver of collected entries, typically a bundle writer.
///
/// `add` must consume `content` (up to `entry.max_file_size` bytes) before
/// returning: the caller releases the directory guard once the pass ends,
/// after which the file may be pruned.
pub trait Sink {
    fn add(&mut self, entry: &CollectedEntry, content: &mut dyn Read) -> Result<(), SinkError>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn add(&mut self, entry: &CollectedEntry, content: &mut dyn Read) -> Result<(), SinkError> {
        (**self).add(entry, content)
    }
}

/// In-memory sink keyed by archive name.
///
/// Content past the entry's size cap is dropped.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Content as UTF-8 (lossy), for assertions and listings.
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Archive names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<u8>> {
        self.entries
    }
}

impl Sink for MemorySink {
    fn add(&mut self, entry: &CollectedEntry, content: &mut dyn Read) -> Result<(), SinkError> {
        if self.entries.contains_key(&entry.archive_name) {
            return Err(SinkError::Duplicate(entry.archive_name.clone()));
        }
        let mut data = Vec::new();
        Read::take(content, entry.max_file_size).read_to_end(&mut data)?;
        self.entries.insert(entry.archive_name.clone(), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(name: &str, cap: u64) -> CollectedEntry {
        CollectedEntry {
            archive_name: name.to_string(),
            relative_path: name.to_string(),
            path: PathBuf::from(name),
            max_file_size: cap,
        }
    }

    #[test]
    fn test_memory_sink_truncates_to_cap() {
        let mut sink = MemorySink::new();
        sink.add(&entry("a", 3), &mut &b"abcdef"[..]).unwrap();
        assert_eq!(sink.get("a"), Some(&b"abc"[..]));
    }

    #[test]
    fn test_memory_sink_rejects_duplicates() {
        let mut sink = MemorySink::new();
        sink.add(&entry("a", 10), &mut &b"x"[..]).unwrap();
        let err = sink.add(&entry("a", 10), &mut &b"y"[..]).unwrap_err();
        assert!(matches!(err, SinkError::Duplicate(name) if name == "a"));
        assert_eq!(sink.get_string("a").as_deref(), Some("x"));
    }

    #[test]
    fn test_memory_sink_names_sorted() {
        let mut sink = MemorySink::new();
        sink.add(&entry("z", 10), &mut &b""[..]).unwrap();
        sink.add(&entry("a", 10), &mut &b""[..]).unwrap();
        assert_eq!(sink.names(), vec!["a", "z"]);
        assert_eq!(sink.len(), 2);
    }
}
