use super::FrameSource;
use anyhow::{Context, Result};
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "tif", "tiff"];

/// Frames stored as individual image files, played back in file-name order
pub struct ImageDirectory {
    root: PathBuf,
    pending: VecDeque<PathBuf>,
}

impl ImageDirectory {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&root)
            .with_context(|| format!("Failed to read frame directory {}", root.display()))?
        {
            let path = entry
                .with_context(|| format!("Failed to list {}", root.display()))?
                .path();
            if path.is_file() && has_image_extension(&path) {
                files.push(path);
            }
        }
        files.sort();

        tracing::info!("Found {} frames in {}", files.len(), root.display());

        Ok(Self {
            root,
            pending: files.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirectory {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };

        let frame = image::open(&path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?
            .to_rgb8();

        Ok(Some(frame))
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn frames_are_read_in_name_order() {
        let dir = std::env::temp_dir().join(format!("frames-order-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, value) in [("frame_0002.png", 20u8), ("frame_0001.png", 10), ("notes.txt", 0)] {
            let path = dir.join(name);
            if name.ends_with(".png") {
                GrayImage::from_pixel(3, 2, Luma([value])).save(&path).unwrap();
            } else {
                std::fs::write(&path, b"not a frame").unwrap();
            }
        }

        let mut source = ImageDirectory::open(&dir).unwrap();
        assert_eq!(source.remaining(), Some(2));
        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(first.get_pixel(0, 0)[0], 10);
        assert_eq!(second.get_pixel(0, 0)[0], 20);
        assert!(source.next_frame().unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(ImageDirectory::open("/nonexistent/frames/dir").is_err());
    }
}
