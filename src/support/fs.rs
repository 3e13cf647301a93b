//! Filesystem helpers used by bootstrap and the cleanup chain.

use std::{env, ffi::CString, fs, io, os::unix::ffi::OsStrExt, path::Path};

use tracing::{debug, warn};

/// Remove a file, treating absence as success.
///
/// Cleanup actions call this without knowing whether the file was ever
/// created, so a missing file must not be an error.
pub fn remove_file_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(
                target: "rewind::fs",
                path = %path.display(),
                "removed transient file"
            );
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(
                target: "rewind::fs",
                path = %path.display(),
                %err,
                "failed to remove transient file"
            );
        }
    }
}

/// Snapshot the current file-creation mask and lower it to zero, so files
/// created by an elevated run stay reachable for the invoking user.
pub fn lower_umask() -> libc::mode_t {
    unsafe { libc::umask(0) }
}

/// Restore a previously snapshotted file-creation mask.
pub fn restore_umask(mask: libc::mode_t) {
    unsafe {
        libc::umask(mask);
    }
}

/// Hand ownership of `path` (recursively) back to the user that invoked
/// `sudo`, identified by `SUDO_UID`/`SUDO_GID`. No-op unless the process is
/// root and both variables are present.
pub fn restore_path_ownership(path: &Path) {
    let Some((uid, gid)) = sudo_caller_ids() else {
        return;
    };
    if unsafe { libc::geteuid() } != 0 {
        return;
    }
    debug!(
        target: "rewind::fs",
        path = %path.display(),
        uid,
        gid,
        "restoring path ownership to invoking user"
    );
    chown_tree(path, uid, gid);
}

fn sudo_caller_ids() -> Option<(libc::uid_t, libc::gid_t)> {
    let uid = env::var("SUDO_UID").ok()?.parse().ok()?;
    let gid = env::var("SUDO_GID").ok()?.parse().ok()?;
    Some((uid, gid))
}

fn chown_tree(path: &Path, uid: libc::uid_t, gid: libc::gid_t) {
    chown_one(path, uid, gid);
    let Ok(entries) = fs::read_dir(path) else {
        return;
    };
    for entry in entries.flatten() {
        let child = entry.path();
        if child.is_dir() {
            chown_tree(&child, uid, gid);
        } else {
            chown_one(&child, uid, gid);
        }
    }
}

fn chown_one(path: &Path, uid: libc::uid_t, gid: libc::gid_t) {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return;
    };
    if unsafe { libc::chown(c_path.as_ptr(), uid, gid) } != 0 {
        warn!(
            target: "rewind::fs",
            path = %path.display(),
            err = %io::Error::last_os_error(),
            "failed to restore ownership"
        );
    }
}
