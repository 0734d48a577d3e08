//! Input resolution: load and validate a user-supplied PDF path.
//!
//! The session's MIME guard protects the wizard, but a CLI or desktop host
//! first has to turn a filesystem path into a [`SelectedFile`] at all. This
//! module does that strictly: the file must exist, be readable, start with
//! the `%PDF` magic bytes, and fit the configured upload limit — so callers
//! get a meaningful error up front rather than a rejection notice after the
//! fact (or a mid-upload failure from the service).

use crate::config::ClientConfig;
use crate::error::IntellidocsError;
use crate::service::PDF_MIME;
use crate::session::SelectedFile;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Load `path` as a validated PDF selection.
///
/// The returned [`SelectedFile`] always carries MIME type
/// `application/pdf`; any file that fails validation is an error instead.
pub fn read_pdf(path: &Path, config: &ClientConfig) -> Result<SelectedFile, IntellidocsError> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(IntellidocsError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(IntellidocsError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    // Size gate runs on metadata, so an oversized file is rejected before a
    // single byte of it is loaded.
    let declared = file
        .metadata()
        .map_err(|e| IntellidocsError::Internal(format!("stat '{}': {e}", path.display())))?
        .len();
    if declared > config.max_upload_bytes {
        return Err(IntellidocsError::FileTooLarge {
            size: declared,
            limit: config.max_upload_bytes,
        });
    }

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| IntellidocsError::Internal(format!("read '{}': {e}", path.display())))?;

    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(IntellidocsError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    let size = bytes.len() as u64;
    if size > config.max_upload_bytes {
        return Err(IntellidocsError::FileTooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }

    debug!(path = %path.display(), size, "resolved local PDF");
    Ok(SelectedFile {
        name: path.display().to_string(),
        mime: PDF_MIME.to_string(),
        bytes,
    })
}
