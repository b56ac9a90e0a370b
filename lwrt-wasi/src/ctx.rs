// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! WASI context: what a module sees of its process.
//!
//! Arguments, environment and the three standard descriptors are fixed
//! when the context is built. There are no pre-opened directories, so the
//! descriptor table only ever shrinks (through `fd_close`).

use std::{
    fmt,
    io::{self, Cursor, Read, Write},
    time::Instant,
};

use crate::prelude::*;

/// Descriptor number of standard input
pub const STDIN: u32 = 0;
/// Descriptor number of standard output
pub const STDOUT: u32 = 1;
/// Descriptor number of standard error
pub const STDERR: u32 = 2;

/// An in-memory sink shared between the embedder and a context
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        lock(&self.0).clone()
    }

    /// Contents decoded as UTF-8, with invalid sequences replaced
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&lock(&self.0)).into_owned()
    }

    /// Number of bytes captured
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.0).len()
    }

    /// Whether nothing has been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.0).is_empty()
    }

    /// Discard the captured bytes
    pub fn clear(&self) {
        lock(&self.0).clear();
    }

    fn append(&self, bytes: &[u8]) {
        lock(&self.0).extend_from_slice(bytes);
    }
}

/// Where bytes written to an output descriptor go
#[derive(Debug, Clone, Default)]
pub(crate) enum OutputPipe {
    /// Discarded
    #[default]
    Null,
    /// The host process's standard output
    Stdout,
    /// The host process's standard error
    Stderr,
    /// Appended to a shared buffer
    Capture(CaptureBuffer),
}

impl OutputPipe {
    /// Whether written bytes go nowhere
    pub(crate) fn discards(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub(crate) fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            },
            Self::Stderr => io::stderr().lock().write_all(bytes),
            Self::Capture(buffer) => {
                buffer.append(bytes);
                Ok(())
            },
        }
    }
}

/// Where bytes read from standard input come from
#[derive(Default)]
pub(crate) enum InputPipe {
    /// End of file immediately
    #[default]
    Empty,
    /// The host process's standard input
    Stdin,
    /// A fixed byte string
    Bytes(Cursor<Vec<u8>>),
}

impl InputPipe {
    pub(crate) fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Empty => Ok(0),
            Self::Stdin => io::stdin().lock().read(buf),
            Self::Bytes(cursor) => cursor.read(buf),
        }
    }
}

impl fmt::Debug for InputPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Stdin => f.write_str("Stdin"),
            Self::Bytes(cursor) => {
                write!(f, "Bytes({} of {})", cursor.position(), cursor.get_ref().len())
            },
        }
    }
}

/// An open descriptor
#[derive(Debug)]
pub(crate) enum Descriptor {
    /// Readable stream (standard input)
    Input(InputPipe),
    /// Writable stream (standard output or error)
    Output(OutputPipe),
}

/// Per-module WASI state
#[derive(Debug)]
pub struct WasiCtx {
    args:        Vec<String>,
    /// `KEY=VALUE` pairs
    env:         Vec<String>,
    descriptors: Mutex<HashMap<u32, Descriptor>>,
    /// Origin of the monotonic and CPU-time clocks
    started:     Instant,
}

impl WasiCtx {
    /// Start building a context with no arguments, no environment and
    /// null standard streams
    #[must_use]
    pub fn builder() -> WasiCtxBuilder {
        WasiCtxBuilder::new()
    }

    /// Command-line arguments, program name first
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Environment as `KEY=VALUE` strings
    #[must_use]
    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// Whether `fd` is currently open
    #[must_use]
    pub fn is_open(&self, fd: u32) -> bool {
        lock(&self.descriptors).contains_key(&fd)
    }

    /// The host functions of `wasi_snapshot_preview1` bound to this context
    #[must_use]
    pub fn into_registry(self) -> CallbackRegistry {
        crate::preview1::registry(Arc::new(self))
    }

    pub(crate) fn started(&self) -> Instant {
        self.started
    }

    pub(crate) fn with_descriptor<R>(&self, fd: u32, f: impl FnOnce(&mut Descriptor) -> R) -> Option<R> {
        lock(&self.descriptors).get_mut(&fd).map(f)
    }

    pub(crate) fn close(&self, fd: u32) -> bool {
        lock(&self.descriptors).remove(&fd).is_some()
    }
}

/// Builder for [`WasiCtx`]
#[derive(Debug, Default)]
pub struct WasiCtxBuilder {
    args:   Vec<String>,
    env:    Vec<(String, String)>,
    stdin:  InputPipe,
    stdout: OutputPipe,
    stderr: OutputPipe,
}

impl WasiCtxBuilder {
    /// Create a builder with no arguments, no environment and null streams
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect all three standard streams to the host process's
    #[must_use]
    pub fn inherit_stdio(mut self) -> Self {
        self.stdin = InputPipe::Stdin;
        self.stdout = OutputPipe::Stdout;
        self.stderr = OutputPipe::Stderr;
        self
    }

    /// Send standard output to `buffer`
    #[must_use]
    pub fn stdout_capture(mut self, buffer: &CaptureBuffer) -> Self {
        self.stdout = OutputPipe::Capture(buffer.clone());
        self
    }

    /// Send standard error to `buffer`
    #[must_use]
    pub fn stderr_capture(mut self, buffer: &CaptureBuffer) -> Self {
        self.stderr = OutputPipe::Capture(buffer.clone());
        self
    }

    /// Serve standard input from `bytes`
    #[must_use]
    pub fn stdin_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = InputPipe::Bytes(Cursor::new(bytes.into()));
        self
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable; a later value for the same key wins
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }

    /// Finish the context
    #[must_use]
    pub fn build(self) -> WasiCtx {
        let descriptors = HashMap::from([
            (STDIN, Descriptor::Input(self.stdin)),
            (STDOUT, Descriptor::Output(self.stdout)),
            (STDERR, Descriptor::Output(self.stderr)),
        ]);
        debug!(args = self.args.len(), env = self.env.len(), "WASI context built");
        WasiCtx {
            args: self.args,
            env: self.env.into_iter().map(|(key, value)| format!("{key}={value}")).collect(),
            descriptors: Mutex::new(descriptors),
            started: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_args_and_env() {
        let ctx = WasiCtx::builder()
            .arg("prog")
            .args(["-v", "input.txt"])
            .env("HOME", "/root")
            .env("LANG", "C")
            .env("HOME", "/tmp")
            .build();
        assert_eq!(ctx.args(), ["prog", "-v", "input.txt"]);
        assert_eq!(ctx.env(), ["HOME=/tmp", "LANG=C"]);
        assert!(ctx.is_open(STDIN) && ctx.is_open(STDOUT) && ctx.is_open(STDERR));
        assert!(!ctx.is_open(3));
    }

    #[test]
    fn test_capture_buffer_is_shared() {
        let buffer = CaptureBuffer::new();
        let pipe = OutputPipe::Capture(buffer.clone());
        pipe.write_all(b"hello ").expect("in-memory write");
        pipe.write_all(b"world").expect("in-memory write");
        assert_eq!(buffer.to_string_lossy(), "hello world");
        assert_eq!(buffer.len(), 11);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_stdin_bytes_read_to_end() {
        let mut pipe = InputPipe::Bytes(Cursor::new(b"abc".to_vec()));
        let mut buf = [0u8; 2];
        assert_eq!(pipe.read(&mut buf).expect("read"), 2);
        assert_eq!(&buf, b"ab");
        assert_eq!(pipe.read(&mut buf).expect("read"), 1);
        assert_eq!(pipe.read(&mut buf).expect("read"), 0);
        assert_eq!(InputPipe::Empty.read(&mut buf).expect("read"), 0);
    }

    #[test]
    fn test_close() {
        let ctx = WasiCtx::builder().build();
        assert!(ctx.close(STDOUT));
        assert!(!ctx.close(STDOUT));
        assert!(!ctx.is_open(STDOUT));
    }
}
