// In-memory collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::downloader::{ProgressListener, WorkItem};
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::http::Transport;
use crate::core::launch::Relauncher;

/// Serves canned bodies by URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct MemoryTransport {
    bodies: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    /// Make `url` fail with a 503 even if a body is registered.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| requested.as_str() == url)
            .count()
    }
}

impl Transport for MemoryTransport {
    fn get(&self, url: &str, progress: &mut dyn FnMut(u64)) -> UpdaterResult<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());

        if self.failing.contains(url) {
            return Err(UpdaterError::DownloadFailed {
                url: url.to_string(),
                status: 503,
            });
        }

        match self.bodies.get(url) {
            Some(body) => {
                progress(body.len() as u64);
                Ok(body.clone())
            }
            None => Err(UpdaterError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Batch(Vec<String>),
    Begin(String),
    Progress(String, u64),
    End(String),
    Done,
}

/// Records every listener callback in arrival order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn ended(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::End(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn begun(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::Begin(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressListener for RecordingListener {
    fn update_files(&self, items: &[WorkItem]) {
        self.push(ProgressEvent::Batch(
            items.iter().map(|item| item.name.clone()).collect(),
        ));
    }

    fn begin_file(&self, item: &WorkItem) {
        self.push(ProgressEvent::Begin(item.name.clone()));
    }

    fn file_progress(&self, item: &WorkItem, bytes: u64) {
        self.push(ProgressEvent::Progress(item.name.clone(), bytes));
    }

    fn end_file(&self, item: &WorkItem) {
        self.push(ProgressEvent::End(item.name.clone()));
    }

    fn done_update(&self) {
        self.push(ProgressEvent::Done);
    }
}

/// Remembers relaunch requests instead of spawning processes.
#[derive(Default)]
pub struct RecordingRelauncher {
    launched: Mutex<Vec<PathBuf>>,
}

impl RecordingRelauncher {
    pub fn launched(&self) -> Vec<PathBuf> {
        self.launched.lock().unwrap().clone()
    }
}

impl Relauncher for RecordingRelauncher {
    fn relaunch(&self, binary: &Path) -> UpdaterResult<()> {
        self.launched.lock().unwrap().push(binary.to_path_buf());
        Ok(())
    }
}

pub fn sha1_of(bytes: &[u8]) -> String {
    crate::core::integrity::sha1_hex(bytes)
}

/// In-memory zip archive holding `entries` as stored (uncompressed) files.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, body) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
