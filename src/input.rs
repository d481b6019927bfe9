//! Input acquisition: normalizing file selections and URL strings into
//! candidate images with previewable addresses

use crate::error::{ClientError, Result};
use image::ImageFormat;
use reqwest::Url;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Image formats the pipeline accepts as input
const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// MIME type for an accepted input format
fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        _ => "image/webp",
    }
}

/// A user-selected image before any remote processing
///
/// Immutable once created; a new selection replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateImage {
    /// Locally selected file payload
    File {
        /// Raw image bytes
        bytes: Vec<u8>,
        /// Verified MIME type (one of the accepted set)
        mime: String,
        /// Original file name, used for the multipart part name
        file_name: String,
    },
    /// Remote image the service fetches itself
    Url(Url),
}

impl CandidateImage {
    /// Short description for logging
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::File { file_name, bytes, .. } => {
                format!("file '{file_name}' ({} bytes)", bytes.len())
            },
            Self::Url(url) => format!("url '{url}'"),
        }
    }
}

/// Owns the temp file backing a local preview; the file is removed when the
/// handle drops
#[derive(Debug)]
pub struct PreviewHandle {
    file: NamedTempFile,
}

impl PreviewHandle {
    fn new(bytes: &[u8]) -> Result<Self> {
        let mut file = NamedTempFile::new()
            .map_err(|e| ClientError::file_io_error("create preview file", "<temp>", e))?;
        file.write_all(bytes)
            .map_err(|e| ClientError::file_io_error("write preview file", file.path(), e))?;
        Ok(Self { file })
    }

    /// Path of the preview file, valid until the handle drops
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Displayable reference to the current candidate
#[derive(Debug)]
pub enum PreviewAddress {
    /// Transient local file, released with the owning handle
    Local(PreviewHandle),
    /// The remote URL itself
    Remote(Url),
}

impl std::fmt::Display for PreviewAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(handle) => write!(f, "{}", handle.path().display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// A validated selection: the candidate plus its preview address
#[derive(Debug)]
pub struct SelectedInput {
    pub candidate: CandidateImage,
    pub preview: PreviewAddress,
}

/// Validate a local file selection
///
/// The file's magic bytes must identify one of the accepted formats
/// (JPEG, PNG, GIF, WebP); the extension is not trusted.
///
/// # Errors
/// - `Io` if the file cannot be read
/// - `UnsupportedType` if the content is not an accepted image format
pub fn select_file(path: &Path) -> Result<SelectedInput> {
    let bytes = std::fs::read(path)
        .map_err(|e| ClientError::file_io_error("read input file", path, e))?;
    let format = image::guess_format(&bytes).map_err(|_| {
        ClientError::unsupported_type(format!(
            "'{}' is not a recognized image file",
            path.display()
        ))
    })?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(ClientError::unsupported_type(format!(
            "{format:?} images are not supported (accepted: JPEG, PNG, GIF, WebP)"
        )));
    }
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

    tracing::debug!(
        file = %path.display(),
        format = ?format,
        size = bytes.len(),
        "accepted file selection"
    );

    let preview = PreviewHandle::new(&bytes)?;
    Ok(SelectedInput {
        candidate: CandidateImage::File {
            mime: mime_for(format).to_string(),
            file_name,
            bytes,
        },
        preview: PreviewAddress::Local(preview),
    })
}

/// Validate a remote URL selection
///
/// No network probe happens here; reachability is discovered by the remote
/// service when it fetches the image.
///
/// # Errors
/// - `InvalidUrl` if the string is empty/whitespace or does not parse as an
///   absolute http(s) URL
pub fn select_url(raw: &str) -> Result<SelectedInput> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid_url("URL is empty"));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| ClientError::invalid_url(format!("'{trimmed}' is not an absolute URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => {},
        other => {
            return Err(ClientError::invalid_url(format!(
                "unsupported scheme '{other}' in '{trimmed}'"
            )));
        },
    }

    tracing::debug!(url = %url, "accepted url selection");
    Ok(SelectedInput {
        candidate: CandidateImage::Url(url.clone()),
        preview: PreviewAddress::Remote(url),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_select_file_accepts_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let selected = select_file(&path).unwrap();
        match &selected.candidate {
            CandidateImage::File { mime, file_name, bytes } => {
                assert_eq!(mime, "image/png");
                assert_eq!(file_name, "photo.png");
                assert!(!bytes.is_empty());
            },
            CandidateImage::Url(_) => panic!("expected file candidate"),
        }
        match &selected.preview {
            PreviewAddress::Local(handle) => assert!(handle.path().exists()),
            PreviewAddress::Remote(_) => panic!("expected local preview"),
        }
    }

    #[test]
    fn test_select_file_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"just some text").unwrap();

        let err = select_file(&path).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedType(_)));
    }

    #[test]
    fn test_select_file_rejects_unaccepted_format() {
        // BMP magic bytes identify the format, but BMP is not in the accepted set
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bmp");
        let mut bytes = b"BM".to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        std::fs::write(&path, bytes).unwrap();

        let err = select_file(&path).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedType(_)));
    }

    #[test]
    fn test_preview_file_released_on_drop() {
        let selected = {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("photo.png");
            std::fs::write(&path, png_bytes()).unwrap();
            select_file(&path).unwrap()
        };
        let preview_path = match &selected.preview {
            PreviewAddress::Local(handle) => handle.path().to_path_buf(),
            PreviewAddress::Remote(_) => panic!("expected local preview"),
        };
        assert!(preview_path.exists());
        drop(selected);
        assert!(!preview_path.exists());
    }

    #[test]
    fn test_select_url_valid() {
        let selected = select_url("https://example.com/cat.jpg").unwrap();
        assert_eq!(
            selected.candidate,
            CandidateImage::Url(Url::parse("https://example.com/cat.jpg").unwrap())
        );
        assert_eq!(selected.preview.to_string(), "https://example.com/cat.jpg");
    }

    #[test]
    fn test_select_url_rejects_empty_and_whitespace() {
        assert!(matches!(select_url(""), Err(ClientError::InvalidUrl(_))));
        assert!(matches!(select_url("   "), Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_select_url_rejects_relative_and_bad_schemes() {
        assert!(matches!(
            select_url("images/cat.jpg"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            select_url("ftp://example.com/cat.jpg"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
