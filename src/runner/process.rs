//! Child process invocation with captured output.
//! Internal to `runner`; public API is defined in `mod.rs`.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use camino::Utf8Path;

use super::InvocationSpec;
use super::error::InvocationError;

/// Exit status and both output streams of a finished child.
#[derive(Debug)]
pub(super) struct CapturedOutput {
    pub(super) status: ExitStatus,
    pub(super) stdout: Vec<u8>,
    pub(super) stderr: Vec<u8>,
}

/// Spawn the spec's executable under its composed environment and wait for
/// it to exit, capturing both output streams.
///
/// The child sees only the composed environment; the parent's variables are
/// cleared first so the composition layers are authoritative.
pub(super) fn invoke(spec: &InvocationSpec) -> Result<CapturedOutput, InvocationError> {
    if !spec.executable.as_std_path().exists() {
        return Err(InvocationError::MissingOutput {
            target: spec.target.clone(),
            path: spec.executable.clone(),
        });
    }

    let mut cmd = Command::new(spec.executable.as_std_path());
    cmd.env_clear()
        .envs(&spec.environment)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    tracing::info!(test = %spec.test, program = %spec.executable, "invoking test executable");

    let child = cmd.spawn().map_err(|source| InvocationError::Spawn {
        program: spec.executable.clone(),
        source,
    })?;
    capture_child(child, &spec.executable)
}

fn capture_child(
    mut child: Child,
    program: &Utf8Path,
) -> Result<CapturedOutput, InvocationError> {
    let Some(stdout) = child.stdout.take() else {
        terminate_child(&mut child, "stdout pipe unavailable");
        return Err(stream_error(program, "child process missing stdout pipe"));
    };
    let Some(stderr) = child.stderr.take() else {
        terminate_child(&mut child, "stderr pipe unavailable");
        return Err(stream_error(program, "child process missing stderr pipe"));
    };

    let out_handle = thread::spawn(move || read_stream(stdout));
    let err_handle = thread::spawn(move || read_stream(stderr));

    let status = child.wait().map_err(|source| InvocationError::Stream {
        program: program.to_owned(),
        source,
    })?;
    let stdout = join_capture(out_handle, "stdout");
    let stderr = join_capture(err_handle, "stderr");
    Ok(CapturedOutput {
        status,
        stdout,
        stderr,
    })
}

fn read_stream(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

fn join_capture(handle: JoinHandle<io::Result<Vec<u8>>>, stream_name: &str) -> Vec<u8> {
    match handle.join() {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(err)) => {
            tracing::debug!("failed to read child {stream_name}: {err}");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!("{stream_name} capture thread panicked: {err:?}");
            Vec::new()
        }
    }
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        tracing::debug!("failed to kill child after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        tracing::debug!("failed to reap child after {context}: {err}");
    }
}

fn stream_error(program: &Utf8Path, message: &str) -> InvocationError {
    InvocationError::Stream {
        program: program.to_owned(),
        source: io::Error::other(message.to_owned()),
    }
}
