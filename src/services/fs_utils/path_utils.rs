use std::path::{Component, Path, PathBuf};

/// True when the relative `target` stays inside whatever base it is joined to.
/// Absolute paths, prefixes and `..` that climb above the base are rejected.
pub fn is_contained_relative(target: &Path) -> bool {
    let mut depth = 0_i32;
    for component in target.components() {
        match component {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// Join `relative` onto `base`, refusing anything that would escape `base`.
pub fn resolve_within(base: &Path, relative: &str) -> std::io::Result<PathBuf> {
    let target = Path::new(relative);
    if !is_contained_relative(target) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("Path escapes storage root: {relative}"),
        ));
    }
    Ok(base.join(target))
}
