//! Time-windowed playback cursors.
//!
//! Both playback consumers poll on a timer and ask "what is newly due, given
//! how long I have been playing?". [`WindowCursor`] is that contract: an
//! advance-only index over a timestamped sequence, handing out the contiguous
//! run of items whose timestamp falls inside `[base_time, base_time +
//! elapsed]` and never returning an item twice. The log's `get_until` and the
//! image-sequence playback share it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// Advance-only read position over a timestamped sequence.
///
/// `base_time` is fixed by the first item seen and all windows are measured
/// from it. Timestamps are assumed non-decreasing in index order; an
/// out-of-order item behind an already-passed cutoff is silently skipped by
/// the forward scan (known limitation, inherited from the log producer's
/// ordering guarantee).
#[derive(Clone, Debug, Default)]
pub struct WindowCursor {
    base_time: Option<f64>,
    index: usize,
}

impl WindowCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the first item not yet returned.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Timestamp of the first item, once one has been seen.
    pub fn base_time(&self) -> Option<f64> {
        self.base_time
    }

    /// Restart playback over the same items. The base time is kept; it is a
    /// property of the sequence, not of one playback session.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Forget everything, including the base time. Required whenever the
    /// underlying sequence is cleared or replaced.
    pub fn clear(&mut self) {
        self.index = 0;
        self.base_time = None;
    }

    /// The contiguous run of not-yet-returned items whose timestamp is at
    /// most `base_time + elapsed` (inclusive, so an item exactly at the
    /// cutoff plays on this tick). Advances the cursor past the run.
    pub fn take_due<'a, T, F>(&mut self, items: &'a [T], time_of: F, elapsed: f64) -> &'a [T]
    where
        F: Fn(&T) -> f64,
    {
        if items.is_empty() {
            return &[];
        }

        let base = *self.base_time.get_or_insert_with(|| time_of(&items[0]));
        let cutoff = base + elapsed;

        let start = self.index.min(items.len());
        let mut end = start;
        while end < items.len() && time_of(&items[end]) <= cutoff {
            end += 1;
        }
        self.index = end;

        &items[start..end]
    }
}

/// One image of a playback sequence: the file path plus the timestamp
/// encoded in its basename.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFrame {
    pub path: PathBuf,
    pub time: f64,
}

/// Result of a background image-directory scan.
pub enum ImageLoadResult {
    Success(Box<ImageSequence>),
    Error(String),
}

/// A directory of timestamped images played back through the same windowed
/// cursor as the record store.
///
/// Frames are `*.jpg` files sorted by name; each basename is the frame's
/// timestamp in seconds (e.g. `1403636579.763556.jpg`). Files whose basename
/// is not a number are skipped with a warning.
#[derive(Debug, Default)]
pub struct ImageSequence {
    frames: Vec<ImageFrame>,
    cursor: WindowCursor,
}

impl ImageSequence {
    /// Scan `dir` synchronously.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("jpg"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let stem = path.file_stem().map(|s| s.to_string_lossy());
            match stem.as_deref().map(str::parse::<f64>) {
                Some(Ok(time)) => frames.push(ImageFrame { path, time }),
                _ => {
                    tracing::warn!(path = %path.display(), "image basename is not a timestamp, skipping");
                }
            }
        }

        tracing::info!(dir = %dir.display(), frames = frames.len(), "image sequence loaded");

        Ok(Self {
            frames,
            cursor: WindowCursor::new(),
        })
    }

    /// Scan `dir` on a background thread; the receiver yields exactly one
    /// [`ImageLoadResult`] when the scan finishes.
    pub fn load(dir: PathBuf) -> Receiver<ImageLoadResult> {
        let (sender, receiver) = channel();
        thread::spawn(move || {
            let result = match Self::from_dir(&dir) {
                Ok(seq) => ImageLoadResult::Success(Box::new(seq)),
                Err(e) => ImageLoadResult::Error(format!("failed to scan {}: {}", dir.display(), e)),
            };
            let _ = sender.send(result);
        });
        receiver
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[ImageFrame] {
        &self.frames
    }

    /// The frame currently on screen: the last one handed out.
    pub fn current(&self) -> Option<&ImageFrame> {
        self.frames.get(self.cursor.index().checked_sub(1)?)
    }

    /// Frames newly due within `elapsed` seconds of the first frame's
    /// timestamp. Same contract as `Log::get_until`.
    pub fn advance_until(&mut self, elapsed: f64) -> &[ImageFrame] {
        self.cursor.take_due(&self.frames, |f| f.time, elapsed)
    }

    /// Restart playback from the first frame.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Drop all frames and cursor state.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.cursor.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_inclusive_cutoff() {
        let times = [10.0, 10.5, 11.0, 12.0];
        let mut cursor = WindowCursor::new();

        // The item exactly at the cutoff is included
        let due = cursor.take_due(&times, |t| *t, 1.0);
        assert_eq!(due, &[10.0, 10.5, 11.0]);
        assert_eq!(cursor.index(), 3);
        assert_eq!(cursor.base_time(), Some(10.0));
    }

    #[test]
    fn test_take_due_no_gaps_no_duplicates() {
        let times: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut cursor = WindowCursor::new();

        let first = cursor.take_due(&times, |t| *t, 3.0).to_vec();
        let second = cursor.take_due(&times, |t| *t, 7.5).to_vec();

        assert_eq!(first, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(second, vec![4.0, 5.0, 6.0, 7.0]);

        // Nothing new inside an already-consumed window
        assert!(cursor.take_due(&times, |t| *t, 7.5).is_empty());
    }

    #[test]
    fn test_take_due_empty_items() {
        let mut cursor = WindowCursor::new();
        let empty: [f64; 0] = [];
        assert!(cursor.take_due(&empty, |t| *t, 100.0).is_empty());
        assert_eq!(cursor.base_time(), None);
    }

    #[test]
    fn test_reset_keeps_base_time() {
        let times = [5.0, 6.0, 7.0];
        let mut cursor = WindowCursor::new();
        cursor.take_due(&times, |t| *t, 10.0);

        cursor.reset();
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.base_time(), Some(5.0));

        // Replayed from the start against the same base
        let due = cursor.take_due(&times, |t| *t, 1.0);
        assert_eq!(due, &[5.0, 6.0]);
    }

    #[test]
    fn test_clear_forgets_base_time() {
        let mut cursor = WindowCursor::new();
        cursor.take_due(&[5.0, 6.0], |t| *t, 10.0);

        cursor.clear();
        assert_eq!(cursor.base_time(), None);

        // A new sequence establishes a new base
        let due = cursor.take_due(&[100.0, 200.0], |t| *t, 0.0);
        assert_eq!(due, &[100.0]);
        assert_eq!(cursor.base_time(), Some(100.0));
    }

    #[test]
    fn test_image_sequence_playback() {
        let dir = std::env::temp_dir().join(format!(
            "navlog-imgseq-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        fs::create_dir_all(&dir).unwrap();

        for name in ["100.0.jpg", "100.5.jpg", "102.0.jpg", "notes.txt", "frame.jpg"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        let mut seq = ImageSequence::from_dir(&dir).unwrap();
        // notes.txt is not a jpg, frame.jpg has no numeric basename
        assert_eq!(seq.len(), 3);
        assert!(seq.current().is_none());

        let due = seq.advance_until(0.5);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].time, 100.0);
        assert_eq!(due[1].time, 100.5);
        assert_eq!(seq.current().unwrap().time, 100.5);

        assert!(seq.advance_until(1.0).is_empty());
        let due = seq.advance_until(2.0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].time, 102.0);

        seq.reset();
        assert_eq!(seq.advance_until(0.0).len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_image_sequence_background_load() {
        let dir = std::env::temp_dir().join(format!("navlog-imgload-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("1.0.jpg"), b"").unwrap();

        let receiver = ImageSequence::load(dir.clone());
        match receiver.recv().unwrap() {
            ImageLoadResult::Success(seq) => assert_eq!(seq.len(), 1),
            ImageLoadResult::Error(e) => panic!("load failed: {e}"),
        }

        let receiver = ImageSequence::load(dir.join("does-not-exist"));
        assert!(matches!(
            receiver.recv().unwrap(),
            ImageLoadResult::Error(_)
        ));

        fs::remove_dir_all(&dir).ok();
    }
}
