use std::fs;
use std::path::Path;

/// Move a file, falling back to copy + delete when `fs::rename` fails
/// (typically a cross-device move between the upload and storage volumes).
/// Refuses to overwrite an existing destination.
pub fn move_file_cross_device(from: &Path, to: &Path) -> std::io::Result<()> {
    if to.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("Destination already exists: {}", to.display()),
        ));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::warn!(
                "fs::rename failed (cross-device?): {}. Attempting fallback move...",
                e
            );

            if !from.is_file() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Source file does not exist",
                ));
            }

            let mut options = fs_extra::file::CopyOptions::new();
            options.overwrite = false;

            fs_extra::file::move_file(from, to, &options)
                .map(|_| ())
                .map_err(|err| std::io::Error::other(err.to_string()))
        }
    }
}

/// Remove a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
