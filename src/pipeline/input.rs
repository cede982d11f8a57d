//! Input resolution: normalise a user-supplied path, URL or byte buffer to a
//! local PDF file.
//!
//! pdfium opens documents from a file-system path. Downloads and in-memory
//! buffers are written into a `TempDir` that lives as long as the
//! [`ResolvedInput`], so cleanup happens when it is dropped. The `%PDF` magic
//! bytes are checked before returning so callers get a meaningful error
//! rather than a pdfium failure.

use crate::error::ReadError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input: a local path, or a temp file we wrote.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL or a byte buffer, written to a temp directory.
    /// The `TempDir` is kept alive until processing completes.
    Temporary { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Temporary { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reject paths whose extension is present and not `pdf` (case-insensitive).
///
/// A path without an extension is let through; the magic-byte check decides.
pub fn check_extension(path: &Path) -> Result<(), ReadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.eq_ignore_ascii_case("pdf") => Err(ReadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext.to_ascii_lowercase(),
        }),
        _ => Ok(()),
    }
}

/// Resolve the input string to a local PDF file path.
///
/// URLs are downloaded to a temporary directory; local paths are validated
/// for existence, extension and magic bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ReadError> {
    if input.trim().is_empty() {
        return Err(ReadError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write an in-memory PDF to a temporary file.
pub fn resolve_bytes(bytes: &[u8], file_name: &str) -> Result<ResolvedInput, ReadError> {
    let name = if file_name.is_empty() {
        "document.pdf"
    } else {
        file_name
    };
    let temp_dir = TempDir::new().map_err(|e| ReadError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(name);
    check_extension(&path)?;
    check_magic(&path, bytes)?;
    std::fs::write(&path, bytes)
        .map_err(|e| ReadError::Internal(format!("Failed to write temp file: {}", e)))?;
    debug!("Buffered {} bytes to {}", bytes.len(), path.display());
    Ok(ResolvedInput::Temporary {
        path,
        _temp_dir: temp_dir,
    })
}

fn check_magic(path: &Path, bytes: &[u8]) -> Result<(), ReadError> {
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(ReadError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Resolve a local file path, validating existence, extension and magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, ReadError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ReadError::FileNotFound { path });
    }
    check_extension(&path)?;

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() {
                check_magic(&path, &magic)?;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReadError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ReadError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ReadError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReadError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReadError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReadError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReadError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);

    let temp_dir = TempDir::new().map_err(|e| ReadError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReadError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // The server decides the content, so the magic bytes are checked but the
    // URL's extension is not.
    check_magic(&file_path, &bytes)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ReadError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Temporary {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it names a `.pdf` file.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if last.to_ascii_lowercase().ends_with(".pdf") {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
