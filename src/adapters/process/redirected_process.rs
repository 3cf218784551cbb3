use std::ffi::OsString;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::errors::{GpgPipeError, Result};
use crate::core::traits::process::{ProcessFactory, ToolProcess};

/// Poll interval while waiting under a timeout.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// How long output readers get to reach EOF after the child was killed.
/// A grandchild that inherited the pipes can hold them open indefinitely.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Append-only text buffer filled by a reader thread, read after join.
type Accumulator = Arc<Mutex<String>>;

/// A background reader and the channel it signals on when it stops.
struct Reader {
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

/// A child process with all three standard streams redirected.
///
/// Stdout and stderr are drained line by line on two background threads
/// from the moment the process starts, so the child never blocks on a
/// full pipe. Both threads are joined in `wait_for_exit` before the
/// buffers are considered complete.
pub struct RedirectedProcess {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Option<Duration>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    readers: Vec<Reader>,
    output: Accumulator,
    errors: Accumulator,
    exit_code: i32,
    start_error: Option<String>,
    disposed: bool,
}

impl RedirectedProcess {
    pub fn new(program: &Path, args: &[OsString], timeout: Option<Duration>) -> Self {
        Self {
            program: program.to_path_buf(),
            args: args.to_vec(),
            timeout,
            child: None,
            stdin: None,
            readers: Vec::new(),
            output: Arc::default(),
            errors: Arc::default(),
            exit_code: 0,
            start_error: None,
            disposed: false,
        }
    }

    fn check_disposed(&self) -> Result<()> {
        if self.disposed {
            return Err(GpgPipeError::Disposed);
        }
        Ok(())
    }

    /// Wait for every reader to hit EOF.
    fn join_readers(&mut self) {
        for reader in self.readers.drain(..) {
            join_reader(reader.handle);
        }
    }

    /// Like `join_readers`, but readers still running after `grace` are detached.
    fn join_readers_within(&mut self, grace: Duration) {
        let deadline = Instant::now() + grace;
        let mut detached = 0;
        for reader in self.readers.drain(..) {
            let left = deadline.saturating_duration_since(Instant::now());
            match reader.done.recv_timeout(left) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => join_reader(reader.handle),
                Err(RecvTimeoutError::Timeout) => detached += 1,
            }
        }
        if detached > 0 {
            tracing::warn!(detached, "output pipes still held open after kill; detaching readers");
        }
    }
}

fn join_reader(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        tracing::warn!("output reader thread panicked");
    }
}

/// Drain `stream` line by line into `sink` until EOF.
///
/// Bytes that are not UTF-8 are replaced rather than ending the capture:
/// gpg prints localized diagnostics in whatever encoding the locale uses.
fn capture<R: Read + Send + 'static>(stream: R, sink: Accumulator) -> Reader {
    let (tx, done) = mpsc::channel();
    let handle = thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
            let line = raw
                .strip_suffix(b"\n")
                .map(|l| l.strip_suffix(b"\r").unwrap_or(l))
                .unwrap_or(&raw);
            let mut buf = sink.lock().unwrap_or_else(|e| e.into_inner());
            if !buf.is_empty() {
                buf.push('\n');
            }
            buf.push_str(&String::from_utf8_lossy(line));
        }
        let _ = tx.send(());
    });
    Reader { handle, done }
}

fn read_accumulator(acc: &Accumulator) -> String {
    acc.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

impl ToolProcess for RedirectedProcess {
    fn start(&mut self) -> Result<bool> {
        self.check_disposed()?;

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program = %self.program.display(), error = %e, "spawn failed");
                self.start_error = Some(e.to_string());
                return Ok(false);
            }
        };

        if let Some(out) = child.stdout.take() {
            self.readers.push(capture(out, Arc::clone(&self.output)));
        }
        if let Some(err) = child.stderr.take() {
            self.readers.push(capture(err, Arc::clone(&self.errors)));
        }
        self.stdin = child.stdin.take();
        self.child = Some(child);
        Ok(true)
    }

    fn start_error(&self) -> Option<&str> {
        self.start_error.as_deref()
    }

    fn input(&mut self) -> Result<&mut dyn Write> {
        self.check_disposed()?;
        match self.stdin.as_mut() {
            Some(stdin) => Ok(stdin),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "process stdin is not open",
            )
            .into()),
        }
    }

    fn wait_for_exit(&mut self) -> Result<()> {
        self.check_disposed()?;
        // Closing stdin first lets tools that read to EOF finish.
        drop(self.stdin.take());

        let Some(child) = self.child.as_mut() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "process was never started",
            )
            .into());
        };

        // A limit too large to represent as an instant is no limit at all.
        let deadline = self
            .timeout
            .and_then(|limit| Some((limit, Instant::now().checked_add(limit)?)));

        let status = match deadline {
            None => child.wait()?,
            Some((limit, deadline)) => loop {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
                if Instant::now() >= deadline {
                    tracing::warn!(?limit, "gpg timed out, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    self.join_readers_within(KILL_GRACE);
                    return Err(GpgPipeError::Timeout { limit });
                }
                thread::sleep(WAIT_POLL);
            },
        };

        // Readers see EOF once the child and any inheritors have closed the pipes.
        self.join_readers();
        self.exit_code = status.code().unwrap_or(-1);
        Ok(())
    }

    fn exit_code(&self) -> i32 {
        self.exit_code
    }

    fn output(&self) -> String {
        read_accumulator(&self.output)
    }

    fn error(&self) -> String {
        read_accumulator(&self.errors)
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        drop(self.stdin.take());

        if let Some(mut child) = self.child.take() {
            // Still running means the caller bailed out early; don't leave a zombie.
            if matches!(child.try_wait(), Ok(None)) {
                tracing::debug!(pid = child.id(), "killing unfinished gpg process");
                let _ = child.kill();
                let _ = child.wait();
            }
        }
        self.join_readers_within(KILL_GRACE);
    }
}

impl Drop for RedirectedProcess {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsProcessFactory;

impl ProcessFactory for OsProcessFactory {
    type Process = RedirectedProcess;

    fn create(&self, program: &Path, args: &[OsString], timeout: Option<Duration>) -> Self::Process {
        RedirectedProcess::new(program, args, timeout)
    }
}
