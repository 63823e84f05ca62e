//! Resolution of root-relative configuration paths.

use camino::{Utf8Path, Utf8PathBuf};

/// Resolves a configured path against the host root.
///
/// Absolute paths are taken as-is; relative paths (the configuration
/// defaults, e.g. `./plugins/`) are anchored at the root the host was
/// started with.
pub(crate) fn resolve(root: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        root.join(path)
    }
}
