//! Selection helpers: turn what the user picked into a [`SelectedFile`].
//!
//! A drop zone and a file picker both hand over a *list* of files; only the
//! first one is used. Nothing here validates type or size: the registry is
//! the sole judge of what can be converted, keyed by extension alone.

use crate::error::ConvertError;
use crate::model::SelectedFile;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lowercased substring after the final `.` of `name`, or `""` if none.
///
/// `"photo.JPG"` → `"jpg"`, `"archive.tar.gz"` → `"gz"`, `"README"` → `""`,
/// `"trailing."` → `""`.
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// First handle of a dropped or picked file list.
pub fn first_of<I>(files: I) -> Option<SelectedFile>
where
    I: IntoIterator<Item = SelectedFile>,
{
    files.into_iter().next()
}

/// Read a local file into a [`SelectedFile`] named after its last path
/// component.
pub async fn load_file(path: impl AsRef<Path>) -> Result<SelectedFile, ConvertError> {
    let path = path.as_ref();
    let content = tokio::fs::read(path).await.map_err(|e| map_read_error(path, e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Loaded {} ({} bytes)", path.display(), content.len());
    Ok(SelectedFile::new(name, content))
}

fn map_read_error(path: &Path, e: std::io::Error) -> ConvertError {
    let path = PathBuf::from(path);
    match e.kind() {
        ErrorKind::NotFound => ConvertError::FileNotFound { path },
        ErrorKind::PermissionDenied => ConvertError::PermissionDenied { path },
        _ => ConvertError::ReadFailed { path, source: e },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPG"), "jpg");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("archive.tar.GZ"), "gz");
        assert_eq!(extension_of("trailing."), "");
        assert_eq!(extension_of(".bashrc"), "bashrc");
        assert_eq!(extension_of(""), "");
    }

    #[test]
    fn test_first_of() {
        let files = vec![
            SelectedFile::new("a.png", vec![1u8]),
            SelectedFile::new("b.png", vec![2u8]),
        ];
        assert_eq!(first_of(files).map(|f| f.name().to_string()), Some("a.png".into()));
        assert!(first_of(Vec::new()).is_none());
    }

    #[tokio::test]
    async fn load_file_uses_last_path_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Holiday.PNG");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let f = load_file(&path).await.expect("readable file");
        assert_eq!(f.name(), "Holiday.PNG");
        assert_eq!(f.extension(), "png");
        assert_eq!(&f.content()[..], b"\x89PNG");
    }

    #[tokio::test]
    async fn load_file_missing_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(dir.path().join("nope.jpg")).await.unwrap_err();
        assert!(matches!(err, ConvertError::FileNotFound { .. }), "got: {err:?}");
    }

    #[test]
    fn read_error_mapping() {
        let p = Path::new("/x/y.png");
        let e = map_read_error(p, std::io::Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(e, ConvertError::PermissionDenied { .. }));
        let e = map_read_error(p, std::io::Error::other("disk on fire"));
        assert!(matches!(e, ConvertError::ReadFailed { .. }));
    }
}
