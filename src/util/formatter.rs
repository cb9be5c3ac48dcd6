//! Indenting writer for generated text.
//!
//! Output accumulates in memory and is written to the destination file by
//! `finish()`; dropping an unfinished formatter writes best-effort so that
//! scope exit always releases the file.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

const INDENT: &str = "    ";

/// A code writer that tracks indentation across newlines.
pub struct Formatter {
    sink: Option<(File, PathBuf)>,
    buf: String,
    depth: usize,
    at_line_start: bool,
    finished: bool,
}

impl Formatter {
    /// A formatter writing to an already-opened file.
    pub fn to_file(file: File, path: PathBuf) -> Self {
        Formatter {
            sink: Some((file, path)),
            buf: String::new(),
            depth: 0,
            at_line_start: true,
            finished: false,
        }
    }

    /// A formatter that only accumulates in memory.
    pub fn to_buffer() -> Self {
        Formatter {
            sink: None,
            buf: String::new(),
            depth: 0,
            at_line_start: true,
            finished: false,
        }
    }

    /// Append text, indenting at the start of every non-empty line.
    pub fn push(&mut self, text: &str) -> &mut Self {
        for segment in text.split_inclusive('\n') {
            if self.at_line_start && segment != "\n" {
                for _ in 0..self.depth {
                    self.buf.push_str(INDENT);
                }
            }
            self.buf.push_str(segment);
            self.at_line_start = segment.ends_with('\n');
        }
        self
    }

    /// Append text followed by a newline.
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.push(text).push("\n")
    }

    pub fn endl(&mut self) -> &mut Self {
        self.push("\n")
    }

    /// Run `body` one level deeper.
    pub fn indented(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self
    }

    /// Emit `{`, the indented body, then `}` (no trailing newline).
    pub fn block(&mut self, body: impl FnOnce(&mut Self)) -> &mut Self {
        self.push("{\n");
        self.indented(body);
        self.push("}")
    }

    /// The accumulated text.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Write the accumulated text to the destination and flush.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        if let Some((file, path)) = self.sink.as_mut() {
            file.write_all(self.buf.as_bytes())
                .and_then(|()| file.flush())
                .with_context(|| format!("failed to write file: {}", path.display()))?;
        }
        Ok(())
    }
}

impl Drop for Formatter {
    fn drop(&mut self) {
        if !self.finished {
            if let Some((file, _)) = self.sink.as_mut() {
                let _ = file.write_all(self.buf.as_bytes());
                let _ = file.flush();
            }
        }
    }
}
