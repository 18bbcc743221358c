// ── Target process ────────────────────────────────────────────────────────────
//
// `std::process` is enough here: the target is started with no arguments,
// inherited environment and standard streams, and is only ever polled.
// Dropping the `Child` closes our handle; it never kills the target.
//
// On Windows `Command::spawn` calls CreateProcessW with handle inheritance
// enabled, where a bare CreateProcess launch would pass FALSE.  The loader
// opens no inheritable handles beyond its standard streams, which the child
// inherits either way.

use std::{
    io,
    path::Path,
    process::{Child, Command},
};

use log::info;

use super::{ProcessStatus, TargetProcess};

/// Start the target executable at `path` (relative to the working directory).
pub(crate) fn spawn_target(path: &Path) -> io::Result<Child> {
    let child = Command::new(path).spawn()?;
    info!("started {} (pid {})", path.display(), child.id());
    Ok(child)
}

impl TargetProcess for Child {
    fn status(&mut self) -> io::Result<ProcessStatus> {
        Ok(match self.try_wait()? {
            None => ProcessStatus::Running,
            Some(exit) => ProcessStatus::Exited(exit.code()),
        })
    }
}
