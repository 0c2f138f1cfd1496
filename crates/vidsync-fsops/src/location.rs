//! Conversions between filesystem paths and `file://` locations.

use std::path::{Path, PathBuf};

use vidsync_core::Location;

const FILE_SCHEME: &str = "file://";

/// Build the location for an absolute filesystem path.
#[must_use]
pub fn file_location(path: &Path) -> Location {
    Location::new(format!("{FILE_SCHEME}{}", path.display()))
}

/// Recover the filesystem path behind a `file://` location.
///
/// Returns `None` for other schemes or an empty path.
#[must_use]
pub fn path_from_location(location: &Location) -> Option<PathBuf> {
    location
        .as_str()
        .strip_prefix(FILE_SCHEME)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_locations_map_back_to_paths() {
        let path = Path::new("/media/shared/Movies/clip.mp4");
        let location = file_location(path);
        assert_eq!(location.as_str(), "file:///media/shared/Movies/clip.mp4");
        assert_eq!(path_from_location(&location), Some(path.to_path_buf()));
    }

    #[test]
    fn other_schemes_are_not_paths() {
        assert_eq!(
            path_from_location(&Location::new("content://media/external/video/7")),
            None
        );
        assert_eq!(path_from_location(&Location::new("file://")), None);
    }
}
