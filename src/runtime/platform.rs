use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

/// Host capabilities the evaluator calls out to: the two output sinks and
/// the subprocess runner behind the `run` built-in. The embedder decides
/// whether the sinks are process streams, in-memory buffers, or something
/// else entirely.
pub trait Platform {
    fn stdout_print(&mut self, line: &str);
    fn stderr_print(&mut self, line: &str);

    /// Spawn `command[0]` with the remaining items as arguments, stream the
    /// child's stdout/stderr line-by-line to the sinks, wait, and return the
    /// exit code. The default implementation reports the capability as
    /// unavailable, which is what pure-library embeddings get.
    fn run_process(&mut self, command: &[String]) -> Result<i32, String> {
        let _ = command;
        Err(process_disabled_message())
    }
}

pub fn process_disabled_message() -> String {
    "`run` unavailable: this embedding provides no subprocess capability".to_string()
}

/// The CLI platform: process streams and real subprocesses, inheriting the
/// interpreter's working directory and environment.
pub struct StdPlatform;

impl Platform for StdPlatform {
    fn stdout_print(&mut self, line: &str) {
        println!("{line}");
    }

    fn stderr_print(&mut self, line: &str) {
        eprintln!("{line}");
    }

    fn run_process(&mut self, command: &[String]) -> Result<i32, String> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| "`run` requires a non-empty command".to_string())?;
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| err.to_string())?;

        // Drain stderr on a helper thread so neither pipe can fill up and
        // stall the child while we stream stdout live.
        let stderr = child.stderr.take().expect("stderr was piped");
        let stderr_reader = std::thread::spawn(move || {
            BufReader::new(stderr)
                .lines()
                .map_while(Result::ok)
                .collect::<Vec<_>>()
        });

        let stdout = child.stdout.take().expect("stdout was piped");
        for line in BufReader::new(stdout).lines() {
            let line = line.map_err(|err| err.to_string())?;
            self.stdout_print(&line);
        }
        for line in stderr_reader.join().unwrap_or_default() {
            self.stderr_print(&line);
        }

        let status = child.wait().map_err(|err| err.to_string())?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Library embedding without subprocess support: output still reaches the
/// process streams, `run` reports the capability as unavailable.
pub struct NoProcessPlatform;

impl Platform for NoProcessPlatform {
    fn stdout_print(&mut self, line: &str) {
        println!("{line}");
    }

    fn stderr_print(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

/// Captures output in memory. Used by tests and available to embedders
/// that want transcripts instead of streams.
#[derive(Default)]
pub struct BufferPlatform {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl BufferPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Platform for BufferPlatform {
    fn stdout_print(&mut self, line: &str) {
        self.stdout.push(line.to_string());
    }

    fn stderr_print(&mut self, line: &str) {
        self.stderr.push(line.to_string());
    }
}
