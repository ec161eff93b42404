use crate::error::{Result, SentinelError};
use crate::ledger::ImageData;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// ヘッダから読めた場合のみ (幅, 高さ)
    pub dimensions: Option<(u32, u32)>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(SentinelError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if has_image_extension(path) {
            images.push(describe(path));
        }
    }

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// 単体の画像ファイルを確認する
pub fn inspect_file(path: &Path) -> Result<ImageInfo> {
    if !path.is_file() {
        return Err(SentinelError::ImageLoad(format!(
            "ファイルが見つかりません: {}",
            path.display()
        )));
    }
    if !has_image_extension(path) {
        return Err(SentinelError::ImageLoad(format!(
            "対応していない形式です: {}",
            path.display()
        )));
    }
    Ok(describe(path))
}

fn describe(path: &Path) -> ImageInfo {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    ImageInfo {
        path: path.to_path_buf(),
        file_name,
        dimensions: image::image_dimensions(path).ok(),
    }
}

/// 画像ファイルを読み込んで台帳に渡せる形にする
pub fn load_image(info: &ImageInfo) -> Result<ImageData> {
    let bytes = std::fs::read(&info.path)
        .map_err(|e| SentinelError::ImageLoad(format!("{}: {}", info.path.display(), e)))?;
    Ok(ImageData::new(info.file_name.clone(), bytes))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}
