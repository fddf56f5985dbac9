#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{exit, Command};

fn main() {
    let mut args: Vec<_> = std::env::args_os().collect();
    // No matter what the binary is called, we need to pass `crc-check` to `crc-stamp`.
    args[0] = "crc-check".into();

    // Prefer the `crc-stamp` installed next to this binary, then fall back to $PATH.
    let program = std::env::current_exe()
        .ok()
        .map(|exe| exe.with_file_name(format!("crc-stamp{}", std::env::consts::EXE_SUFFIX)))
        .filter(|sibling| sibling.is_file())
        .map(|sibling| sibling.into_os_string())
        .unwrap_or_else(|| "crc-stamp".into());

    let mut cmd = Command::new(program);
    cmd.args(&args);

    #[cfg(unix)]
    let err = cmd.exec();
    #[cfg(not(unix))]
    let err = match cmd.spawn() {
        Ok(mut child) => match child.wait() {
            Ok(exitcode) => exit(exitcode.code().unwrap_or(98)),
            Err(e) => e,
        },
        Err(e) => e,
    };

    eprintln!("Error launching `crc-stamp`: {err}");
    eprintln!("Note: the `crc-check` binary is a small shim that launches `crc-stamp`.");
    eprintln!("Make sure `crc-stamp` is installed and available in $PATH.");

    exit(99);
}
