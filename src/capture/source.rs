//! フレーム取得元
//!
//! カメラ実機の代わりに、フォルダ内の画像を名前順に繰り返し返す
//! `DirectoryCamera` を提供する。

use crate::error::{Result, SentinelError};
use crate::ledger::ImageData;
use crate::scanner::{load_image, scan_folder};
use std::path::PathBuf;

/// 映像フレームの取得元
pub trait FrameSource: Send + 'static {
    /// デバイスを確保する（失敗時は `DeviceUnavailable`）
    fn acquire(&mut self) -> Result<()>;

    /// 現在のフレームを1枚取り出す（未確保ならNone）
    fn next_frame(&mut self) -> Option<ImageData>;

    fn release(&mut self);
}

/// フォルダをカメラとして扱う
pub struct DirectoryCamera {
    folder: PathBuf,
    frames: Vec<ImageData>,
    cursor: usize,
}

impl DirectoryCamera {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            frames: Vec::new(),
            cursor: 0,
        }
    }

    pub fn is_acquired(&self) -> bool {
        !self.frames.is_empty()
    }
}

impl FrameSource for DirectoryCamera {
    fn acquire(&mut self) -> Result<()> {
        let unavailable = |reason: String| {
            SentinelError::DeviceUnavailable(format!("{}: {}", self.folder.display(), reason))
        };

        let images = scan_folder(&self.folder).map_err(|e| unavailable(e.to_string()))?;
        if images.is_empty() {
            return Err(unavailable("フレームがありません".into()));
        }

        let mut frames = Vec::with_capacity(images.len());
        for info in &images {
            frames.push(load_image(info).map_err(|e| unavailable(e.to_string()))?);
        }

        tracing::debug!(folder = %self.folder.display(), frames = frames.len(), "カメラ確保");
        self.frames = frames;
        self.cursor = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Option<ImageData> {
        if self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor = self.cursor.wrapping_add(1);
        Some(frame)
    }

    fn release(&mut self) {
        self.frames.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_folder_is_unavailable() {
        let mut camera = DirectoryCamera::new("/nonexistent/camera");
        assert!(matches!(camera.acquire(), Err(SentinelError::DeviceUnavailable(_))));
        assert!(!camera.is_acquired());
    }

    #[test]
    fn test_empty_folder_is_unavailable() {
        let dir = tempdir().unwrap();
        let mut camera = DirectoryCamera::new(dir.path());
        assert!(matches!(camera.acquire(), Err(SentinelError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_frames_cycle_in_name_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"frame-b").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"frame-a").unwrap();

        let mut camera = DirectoryCamera::new(dir.path());
        assert!(camera.next_frame().is_none());
        camera.acquire().unwrap();

        let names: Vec<_> = (0..3)
            .map(|_| camera.next_frame().unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "a.jpg"]);

        camera.release();
        assert!(camera.next_frame().is_none());
    }
}
