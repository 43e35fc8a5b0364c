//! Local checks run before a PDF is uploaded: the path is a readable file
//! and it starts with the `%PDF` magic bytes.

use crate::error::PdfAiError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Magic bytes every PDF starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// MIME type sent with the uploaded file part.
pub const PDF_MIME: &str = "application/pdf";

/// Validate that `path` is a readable file starting with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), PdfAiError> {
    if !path.is_file() {
        return Err(PdfAiError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic == PDF_MAGIC => {}
                Ok(()) => {
                    return Err(PdfAiError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(PdfAiError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    })
                }
                Err(e) => {
                    return Err(PdfAiError::ReadFailed {
                        path: path.to_path_buf(),
                        source: e,
                    })
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PdfAiError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(PdfAiError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    debug!("Validated local PDF: {}", path.display());
    Ok(())
}

/// File name used for the multipart part.
pub fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "document.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_reported() {
        let err = validate_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, PdfAiError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_pdf(dir.path()).unwrap_err();
        assert!(matches!(err, PdfAiError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        match validate_pdf(f.path()).unwrap_err() {
            PdfAiError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn short_file_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%P").unwrap();
        assert!(matches!(
            validate_pdf(f.path()).unwrap_err(),
            PdfAiError::NotAPdf { .. }
        ));
    }

    #[test]
    fn pdf_header_passes() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap();
        validate_pdf(f.path()).unwrap();
    }

    #[test]
    fn file_name_falls_back() {
        assert_eq!(upload_file_name(Path::new("/tmp/report.pdf")), "report.pdf");
        assert_eq!(upload_file_name(Path::new("/")), "document.pdf");
    }
}
