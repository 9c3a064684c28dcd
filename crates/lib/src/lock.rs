//! Per-project run lock.
//!
//! gclient and ninja keep state inside the checkout, so two runs against the
//! same project must not overlap. Mutating commands take the lock at
//! `third_party/.rtcbuild/.lock` exclusively; read-only commands share it.
//! The OS releases the lock when the holder exits, even on a crash.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::layout;

const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
  Shared,
  Exclusive,
}

/// Who holds an exclusive lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
  pub pid: u32,
  pub command: String,
  pub since_unix: u64,
}

impl Holder {
  fn current(command: &str) -> Self {
    Self {
      pid: std::process::id(),
      command: command.to_string(),
      since_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default(),
    }
  }

  fn read_from(mut file: &File) -> Option<Self> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    serde_json::from_str(&contents).ok()
  }
}

fn describe_holder(holder: &Option<Holder>) -> String {
  match holder {
    Some(h) => format!(" (`rtcbuild {}`, PID {}, since unix time {})", h.command, h.pid, h.since_unix),
    None => String::new(),
  }
}

#[derive(Debug, Error)]
pub enum ProjectLockError {
  #[error(
    "project is in use by another rtcbuild run{}\nif no such process exists, remove '{}'",
    describe_holder(.holder),
    .lock_path.display()
  )]
  Busy {
    lock_path: PathBuf,
    holder: Option<Holder>,
  },

  #[error("failed to {action} lock file '{path}': {source}")]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl ProjectLockError {
  fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
    let path = path.to_path_buf();
    move |source| Self::Io { action, path, source }
  }
}

/// A held project lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct ProjectLock {
  file: File,
  path: PathBuf,
  mode: LockMode,
}

impl ProjectLock {
  /// Take the lock for `root` without waiting.
  ///
  /// `command` is recorded for exclusive holders so a blocked run can say
  /// who it is waiting on.
  pub fn acquire(root: &Path, mode: LockMode, command: &str) -> Result<Self, ProjectLockError> {
    let dir = layout::state_dir(root);
    let path = dir.join(LOCK_FILE);
    fs::create_dir_all(&dir).map_err(ProjectLockError::io("create directory for", &path))?;

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&path)
      .map_err(ProjectLockError::io("open", &path))?;

    match sys::try_lock(&file, mode) {
      Ok(()) => {}
      Err(e) if sys::is_contention(&e) => {
        return Err(ProjectLockError::Busy {
          holder: Holder::read_from(&file),
          lock_path: path,
        });
      }
      Err(e) => return Err(ProjectLockError::io("lock", &path)(e)),
    }

    let lock = Self { file, path, mode };
    if mode == LockMode::Exclusive {
      lock.record_holder(command)?;
    }
    debug!(path = %lock.path.display(), ?mode, "acquired project lock");
    Ok(lock)
  }

  fn record_holder(&self, command: &str) -> Result<(), ProjectLockError> {
    let json = serde_json::to_vec_pretty(&Holder::current(command)).map_err(|e| ProjectLockError::Io {
      action: "serialize",
      path: self.path.clone(),
      source: io::Error::other(e),
    })?;

    let mut file = &self.file;
    file.set_len(0).map_err(ProjectLockError::io("truncate", &self.path))?;
    file.seek(SeekFrom::Start(0)).map_err(ProjectLockError::io("seek", &self.path))?;
    file.write_all(&json).map_err(ProjectLockError::io("write", &self.path))?;
    file.flush().map_err(ProjectLockError::io("flush", &self.path))
  }

  /// Holder recorded in the lock file; `None` for shared locks.
  pub fn holder(&self) -> Option<Holder> {
    match self.mode {
      LockMode::Exclusive => Holder::read_from(&self.file),
      LockMode::Shared => None,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[cfg(unix)]
mod sys {
  use std::fs::File;
  use std::io;

  use rustix::fs::{FlockOperation, flock};

  use super::LockMode;

  pub fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
    let operation = if mode == LockMode::Exclusive {
      FlockOperation::NonBlockingLockExclusive
    } else {
      FlockOperation::NonBlockingLockShared
    };
    flock(file, operation).map_err(io::Error::from)
  }

  pub fn is_contention(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
  }
}

#[cfg(windows)]
mod sys {
  use std::fs::File;
  use std::io;
  use std::os::windows::io::AsRawHandle;

  use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};
  use windows_sys::Win32::System::IO::OVERLAPPED;

  use super::LockMode;

  pub fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
    let mut flags = LOCKFILE_FAIL_IMMEDIATELY;
    if mode == LockMode::Exclusive {
      flags |= LOCKFILE_EXCLUSIVE_LOCK;
    }

    // SAFETY: the handle is owned by `file` and outlives the call; a zeroed
    // OVERLAPPED locks from offset 0.
    let locked = unsafe {
      let mut overlapped: OVERLAPPED = std::mem::zeroed();
      LockFileEx(file.as_raw_handle() as HANDLE, flags, 0, 1, 0, &mut overlapped)
    };

    if locked == 0 {
      Err(io::Error::last_os_error())
    } else {
      Ok(())
    }
  }

  pub fn is_contention(err: &io::Error) -> bool {
    err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) || err.kind() == io::ErrorKind::WouldBlock
  }
}
