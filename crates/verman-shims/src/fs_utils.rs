use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => {
            fs::remove_file(path)?;
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Falls back to [`copy_then_remove`] across filesystems, which is not atomic.
pub fn move_path(source: &Path, destination: &Path) -> Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                "rename crosses filesystems, copying instead"
            );
            copy_then_remove(source, destination)
        }
        Err(err) => Err(err).with_context(|| {
            format!(
                "failed to move {} to {}",
                source.display(),
                destination.display()
            )
        }),
    }
}

pub(crate) fn copy_then_remove(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(source)
        .with_context(|| format!("failed to inspect {}", source.display()))?;
    if metadata.is_dir() {
        copy_tree(source, destination)?;
        fs::remove_dir_all(source)
            .with_context(|| format!("failed to remove {}", source.display()))
    } else {
        copy_entry(source, destination, &metadata)?;
        fs::remove_file(source).with_context(|| format!("failed to remove {}", source.display()))
    }
}

pub fn copy_tree(source_root: &Path, destination_root: &Path) -> Result<()> {
    if !source_root.is_dir() {
        anyhow::bail!("copy source is not a directory: {}", source_root.display());
    }

    fs::create_dir_all(destination_root)
        .with_context(|| format!("failed to create {}", destination_root.display()))?;

    let mut queue: VecDeque<(PathBuf, PathBuf)> = VecDeque::new();
    queue.push_back((source_root.to_path_buf(), destination_root.to_path_buf()));

    while let Some((from_dir, to_dir)) = queue.pop_front() {
        for entry in fs::read_dir(&from_dir)
            .with_context(|| format!("failed to read directory {}", from_dir.display()))?
        {
            let entry = entry?;
            let from_path = entry.path();
            let to_path = to_dir.join(entry.file_name());
            let metadata = fs::symlink_metadata(&from_path)
                .with_context(|| format!("failed to inspect {}", from_path.display()))?;
            if metadata.is_dir() {
                fs::create_dir_all(&to_path)
                    .with_context(|| format!("failed to create {}", to_path.display()))?;
                queue.push_back((from_path, to_path));
            } else {
                copy_entry(&from_path, &to_path, &metadata)?;
            }
        }
    }

    Ok(())
}

fn copy_entry(from_path: &Path, to_path: &Path, metadata: &fs::Metadata) -> Result<()> {
    if metadata.file_type().is_symlink() {
        let target = fs::read_link(from_path)
            .with_context(|| format!("failed to read link {}", from_path.display()))?;
        return create_symlink(&target, to_path).with_context(|| {
            format!(
                "failed to create symlink {} -> {}",
                to_path.display(),
                target.display()
            )
        });
    }

    fs::copy(from_path, to_path).with_context(|| {
        format!(
            "failed to copy {} to {}",
            from_path.display(),
            to_path.display()
        )
    })?;
    Ok(())
}

pub fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_file(target, link)
    }
}

pub fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}

pub(crate) fn set_executable_mode(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

pub(crate) fn set_dir_mode(path: &Path) -> io::Result<()> {
    set_executable_mode(path)
}

pub fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}
