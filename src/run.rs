use colored::*;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Read, Write},
    path::Path,
    process::{Command, Stdio},
    thread,
};

use crate::error::{MgrError, Result};

/// Calls `f` for every line of `reader`. Invalid UTF-8 is replaced rather
/// than ending the stream.
fn for_each_line<R, F>(reader: R, mut f: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(&str) -> io::Result<()>,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        f(line.trim_end_matches(['\n', '\r']))?;
    }
}

fn append_line(log: &mut File, line: &str) -> io::Result<()> {
    writeln!(log, "{}", line)?;
    log.flush()
}

/// Runs `command` in `cwd`, teeing its output into the log file and, when
/// `show_output` is set, the console.
pub fn run_command(command: &[&str], cwd: &Path, log_path: &Path, show_output: bool) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };
    let command_line = command.join(" ");

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut log = OpenOptions::new().create(true).append(true).open(log_path)?;
    let mut err_log = OpenOptions::new().append(true).open(log_path)?;

    let spawned = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(MgrError::CommandNotFound {
                program: program.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!(command = %command_line, cwd = %cwd.display(), "spawned");

    append_line(&mut log, &format!("\n--- Running Command: {} ---", command_line))?;
    if show_output {
        println!("{}", format!("--- Running Command: {} ---", command_line).dimmed());
    }

    // stderr is drained on its own thread so a full pipe cannot stall the child
    let stderr_handle = child.stderr.take().map(|stderr| {
        thread::spawn(move || {
            for_each_line(stderr, |line| {
                if show_output {
                    eprintln!("{}", line);
                }
                append_line(&mut err_log, line)
            })
        })
    });

    if let Some(stdout) = child.stdout.take() {
        for_each_line(stdout, |line| {
            if show_output {
                println!("{}", line);
            }
            append_line(&mut log, line)
        })?;
    }

    if let Some(handle) = stderr_handle {
        match handle.join() {
            Ok(Err(e)) => tracing::warn!("failed to log stderr of {command_line}: {e}"),
            Err(_) => tracing::warn!("stderr reader for {command_line} panicked"),
            Ok(Ok(())) => {}
        }
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(MgrError::CommandFailed {
            command: command_line,
            code: status.code(),
            log: log_path.to_path_buf(),
        });
    }

    Ok(())
}
