//! Progress sink that records every report

use optup_update::download::{DownloadProgress, ProgressSink};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub started: Mutex<Option<(String, u64)>>,
    pub positions: Mutex<Vec<u64>>,
    pub fractions: Mutex<Vec<f64>>,
    pub finished: Mutex<bool>,
}

impl RecordingProgress {
    pub fn positions(&self) -> Vec<u64> {
        self.positions.lock().unwrap().clone()
    }

    pub fn last_fraction(&self) -> Option<f64> {
        self.fractions.lock().unwrap().last().copied()
    }
}

impl ProgressSink for RecordingProgress {
    fn start(&self, label: &str, total_bytes: u64) {
        *self.started.lock().unwrap() = Some((label.to_string(), total_bytes));
    }

    fn advance(&self, progress: &DownloadProgress) {
        self.positions.lock().unwrap().push(progress.downloaded_bytes);
        self.fractions.lock().unwrap().push(progress.fraction());
    }

    fn finish(&self, _progress: &DownloadProgress) {
        *self.finished.lock().unwrap() = true;
    }
}
