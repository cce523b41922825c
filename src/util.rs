//! Utility functions for use in other parts of rawm.
use crate::{Error, Result};
use std::{
    ffi::CString,
    io::Read,
    process::{Command, Stdio},
};
use tracing::info;

/// Run an external command from its argv.
///
/// This redirects the process stdout and stderr to /dev/null. The child
/// inherits our environment; `SIGCHLD` handling in the main loop reaps it.
pub fn spawn(argv: &[&str]) -> Result<()> {
    let (cmd, args) = match argv.split_first() {
        Some(parts) => parts,
        None => return Ok(()),
    };

    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| {
            eprintln!("rawm: unable to spawn {cmd}: {e}");
            Error::from(e)
        })
}

/// Run an external command and block until it exits, returning its stdout.
///
/// Used for the dmenu pipe when renaming a tag; the event loop stalls for
/// the duration, which is accepted for interactive prompts.
pub fn spawn_for_output(argv: &[&str]) -> std::io::Result<String> {
    let (cmd, args) = match argv.split_first() {
        Some(parts) => parts,
        None => return Ok(String::new()),
    };

    info!(?argv, "spawning subprocess for output");
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut buf = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_string(&mut buf)?;
    }
    child.wait()?;

    Ok(buf)
}

/// Replace the current process image with the given argv (restart path).
///
/// Only returns on failure.
pub fn exec_self(argv: &[String]) -> Result<()> {
    let args = argv
        .iter()
        .map(|a| CString::new(a.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let Some(prog) = args.first() else {
        return Ok(());
    };

    info!(?argv, "re-exec'ing");
    nix::unistd::execvp(prog, &args)?;

    Ok(())
}
