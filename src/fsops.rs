//! Library-tree file operations: scan, import, rename, folders, and a
//! soft-delete that parks files in a per-process trash directory so a delete
//! can be undone within the session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::audio_io::is_supported_audio_path;

/// All supported audio files under `root`, depth-first, sorted by path.
pub fn scan_audio_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_supported_audio_path(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

/// Renames a file in place. A bare `new_name` (no extension) keeps the
/// source extension.
pub fn rename_file(from: &Path, new_name: &str) -> Result<PathBuf> {
    let name = new_name.trim();
    if name.is_empty() {
        anyhow::bail!("name is empty");
    }
    if name.contains('/') || name.contains('\\') {
        anyhow::bail!("name must not contain path separators");
    }
    let mut name = name.to_string();
    if Path::new(&name).extension().is_none() {
        if let Some(ext) = from.extension().and_then(|s| s.to_str()) {
            name.push('.');
            name.push_str(ext);
        }
    }
    let parent = from.parent().context("missing parent folder")?;
    let to = parent.join(name);
    if to == from {
        return Ok(to);
    }
    if to.exists() {
        anyhow::bail!("target already exists: {}", to.display());
    }
    std::fs::rename(from, &to)
        .with_context(|| format!("rename {} -> {}", from.display(), to.display()))?;
    log::info!("renamed {} -> {}", from.display(), to.display());
    Ok(to)
}

/// Copies an outside file into `dest_dir`, bumping the name on collision
/// (`kick.wav`, `kick_1.wav`, ...). The source is left untouched.
pub fn import_file(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !src.is_file() {
        anyhow::bail!("source is not a file: {}", src.display());
    }
    let file_name = src
        .file_name()
        .and_then(|s| s.to_str())
        .context("source has no file name")?;
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("create dir: {}", dest_dir.display()))?;
    let dest = unique_destination(dest_dir, file_name);
    std::fs::copy(src, &dest)
        .with_context(|| format!("copy {} -> {}", src.display(), dest.display()))?;
    log::info!("imported {} -> {}", src.display(), dest.display());
    Ok(dest)
}

pub fn create_folder(parent: &Path, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("name is empty");
    }
    if name.contains('/') || name.contains('\\') {
        anyhow::bail!("name must not contain path separators");
    }
    let dir = parent.join(name);
    if dir.exists() {
        anyhow::bail!("folder already exists: {}", dir.display());
    }
    std::fs::create_dir_all(&dir).with_context(|| format!("create dir: {}", dir.display()))?;
    Ok(dir)
}

fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let ext = Path::new(file_name).extension().and_then(|s| s.to_str());
    let mut bump = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{stem}_{bump}.{ext}"),
            None => format!("{stem}_{bump}"),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        bump += 1;
    }
}

/// Receipt for a soft delete; feed it back to [`undo_delete`] to restore.
#[derive(Clone, Debug)]
pub struct DeleteTicket {
    pub original: PathBuf,
    pub parked: PathBuf,
}

fn trash_dir() -> PathBuf {
    std::env::temp_dir().join(format!("epoch123_trash_{}", std::process::id()))
}

/// Moves the file into the trash directory instead of unlinking it.
pub fn soft_delete(path: &Path) -> Result<DeleteTicket> {
    if !path.is_file() {
        anyhow::bail!("not a file: {}", path.display());
    }
    let trash = trash_dir();
    std::fs::create_dir_all(&trash)
        .with_context(|| format!("create trash dir: {}", trash.display()))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .context("path has no file name")?;
    let parked = unique_destination(&trash, file_name);
    // rename fails across filesystems (temp dir may be tmpfs), fall back to
    // copy+remove.
    if std::fs::rename(path, &parked).is_err() {
        std::fs::copy(path, &parked)
            .with_context(|| format!("park {} -> {}", path.display(), parked.display()))?;
        std::fs::remove_file(path)?;
    }
    log::info!("soft-deleted {} -> {}", path.display(), parked.display());
    Ok(DeleteTicket {
        original: path.to_path_buf(),
        parked,
    })
}

/// Puts a soft-deleted file back where it came from.
pub fn undo_delete(ticket: &DeleteTicket) -> Result<()> {
    if ticket.original.exists() {
        anyhow::bail!("original path reoccupied: {}", ticket.original.display());
    }
    if let Some(parent) = ticket.original.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if std::fs::rename(&ticket.parked, &ticket.original).is_err() {
        std::fs::copy(&ticket.parked, &ticket.original).with_context(|| {
            format!(
                "restore {} -> {}",
                ticket.parked.display(),
                ticket.original.display()
            )
        })?;
        std::fs::remove_file(&ticket.parked)?;
    }
    log::info!("restored {}", ticket.original.display());
    Ok(())
}
