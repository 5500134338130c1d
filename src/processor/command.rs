//! External command stages.
//!
//! The bundle is piped to the program's stdin, stdout becomes the stage
//! output and stderr is forwarded to the diagnostic sink.
//!
//! # Example
//!
//! ```toml
//! [processors.uglifyjs]
//! command = ["uglifyjs", "--compress"]
//! live = false
//! ```

use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{ProcessError, Processor};

/// Runs `program args...` once per bundle.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl CommandProcessor {
    /// Create from a command array (e.g., `["uglifyjs"]` or `["npx", "terser"]`).
    ///
    /// Returns `None` for an empty array.
    pub fn from_slice<S: AsRef<std::ffi::OsStr>>(cmd: &[S]) -> Option<Self> {
        let (program, args) = cmd.split_first()?;
        Some(Self {
            program: program.as_ref().to_owned(),
            args: args.iter().map(|a| a.as_ref().to_owned()).collect(),
            cwd: None,
        })
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

impl Processor for CommandProcessor {
    fn run(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        diagnostics: &mut dyn Write,
    ) -> Result<(), ProcessError> {
        let name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: name.clone(),
            source,
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProcessError::Failed(format!("`{name}` has no stdin")))?;

        // stdin is fed from its own thread: a child that fills its stdout pipe
        // before draining stdin would otherwise block both sides forever.
        let (written, result) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(input));
            let result = child.wait_with_output();
            (writer.join(), result)
        });
        let out = result?;

        match written {
            Ok(Ok(())) => {}
            // Child exited without reading everything; its status tells the story.
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ProcessError::Failed(format!(
                    "stdin writer for `{name}` panicked"
                )));
            }
        }

        diagnostics.write_all(&out.stderr)?;

        if !out.status.success() {
            return Err(ProcessError::Exit {
                program: name,
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        output.extend_from_slice(&out.stdout);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_from_slice() {
        let cmd = CommandProcessor::from_slice(&["npx", "terser", "-c"]).unwrap();
        assert_eq!(cmd.program, OsString::from("npx"));
        assert_eq!(cmd.args.len(), 2);
        assert!(CommandProcessor::from_slice::<&str>(&[]).is_none());
    }

    #[test]
    fn test_missing_program() {
        let cmd = CommandProcessor::from_slice(&["mend-no-such-program"]).unwrap();
        let err = cmd.run(b"x", &mut Vec::new(), &mut io::sink()).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_passthrough() {
        let cmd = CommandProcessor::from_slice(&["cat"]).unwrap();
        let mut out = Vec::new();
        cmd.run(b"var a = 1;\n", &mut out, &mut io::sink()).unwrap();
        assert_eq!(out, b"var a = 1;\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_large_input_does_not_deadlock() {
        // Far larger than a pipe buffer in both directions
        let input = vec![b'x'; 4 * 1024 * 1024];
        let cmd = CommandProcessor::from_slice(&["cat"]).unwrap();
        let mut out = Vec::new();
        cmd.run(&input, &mut out, &mut io::sink()).unwrap();
        assert_eq!(out.len(), input.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_reports_stderr() {
        let cmd = CommandProcessor::from_slice(&["sh", "-c", "echo 'unexpected token' >&2; exit 3"])
            .unwrap();
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let err = cmd.run(b"", &mut out, &mut diag).unwrap_err();

        match &err {
            ProcessError::Exit { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "unexpected token");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("unexpected token"));
        assert_eq!(diag, b"unexpected token\n");
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_cwd() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("banner.txt"), "/* banner */").unwrap();
        let cmd = CommandProcessor::from_slice(&["cat", "banner.txt", "-"])
            .unwrap()
            .cwd(dir.path());
        let mut out = Vec::new();
        cmd.run(b"body{}", &mut out, &mut io::sink()).unwrap();
        assert_eq!(out, b"/* banner */body{}");
    }
}
