use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

use crate::config::{ANNOTATION_EXTENSION, IMAGE_EXTENSIONS};
use crate::error::{AnnotatorError, Result};

/// File name without directory and without extension
pub fn get_basename(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
}

pub fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|metadata| metadata.is_file()).unwrap_or(false)
}

pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|metadata| metadata.is_dir()).unwrap_or(false)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(extension)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Regular, non-hidden files immediately inside `directory`
fn list_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory).map_err(|source| AnnotatorError::ListingFailed {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| AnnotatorError::ListingFailed {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if is_file(&path) && !is_hidden(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

/// List image files in a directory (non-recursive).
///
/// Files are grouped by extension in `IMAGE_EXTENSIONS` order. Extensions are
/// matched case-sensitively, so `a.jpeg` is not an image but `a.JPEG` is.
/// Within a group, paths are sorted like Nautilus sorts them.
pub fn list_images_in_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    let files = list_files(directory)?;

    let mut image_paths: Vec<PathBuf> = Vec::new();
    for extension in IMAGE_EXTENSIONS {
        let mut group: Vec<PathBuf> = files
            .iter()
            .filter(|path| has_extension(path, extension))
            .cloned()
            .collect();
        // `group.sort()` puts img10 before img2
        alphanumeric_sort::sort_path_slice(&mut group);
        image_paths.extend(group);
    }

    debug!("Found {} image(s) in {}", image_paths.len(), directory.display());
    Ok(image_paths)
}

/// Basenames of the annotation files already present in `directory`
pub fn get_basenames_in_directory(directory: &Path) -> Result<HashSet<String>> {
    let basenames: HashSet<String> = list_files(directory)?
        .iter()
        .filter(|path| has_extension(path, ANNOTATION_EXTENSION))
        .filter_map(|path| get_basename(path))
        .collect();

    debug!("Found {} annotation file(s) in {}", basenames.len(), directory.display());
    Ok(basenames)
}

/// Open an image with the platform's default viewer without waiting for it
pub fn open_in_image_viewer(path: &Path) -> io::Result<()> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "linux") {
        "xdg-open"
    } else {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Opening images is not supported on this OS",
        ));
    };

    let mut command = Command::new(program);
    command.arg(path);
    spawn_detached(command)?;
    debug!("Opened {} with {}", path.display(), program);
    Ok(())
}

/// Start `command` and reap it from a background thread once it exits
fn spawn_detached(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    Ok(thread::spawn(move || {
        let status = child.wait();
        if let Err(e) = &status {
            warn!("Failed to wait for viewer process: {}", e);
        }
        status
    }))
}
