//! `tracing` setup. In the browser every formatted event goes to the
//! devtools console; native builds (tests) write to stderr.

use std::io;
use tracing::Level;

/// Buffers one formatted event and hands it to the console when dropped.
#[cfg(target_arch = "wasm32")]
pub(crate) struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

#[cfg(target_arch = "wasm32")]
impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&self.buf);
        let msg = wasm_bindgen::JsValue::from_str(line.trim_end());
        match self.level {
            Level::ERROR => web_sys::console::error_1(&msg),
            Level::WARN => web_sys::console::warn_1(&msg),
            Level::INFO => web_sys::console::info_1(&msg),
            _ => web_sys::console::debug_1(&msg),
        }
        self.buf.clear();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MakeConsoleWriter;

#[cfg(target_arch = "wasm32")]
impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for MakeConsoleWriter {
    type Writer = io::Stderr;

    fn make_writer(&'a self) -> Self::Writer {
        io::stderr()
    }
}

fn default_level() -> Level {
    if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub(crate) fn init() {
    let installed = tracing_subscriber::fmt()
        .with_max_level(default_level())
        .with_writer(MakeConsoleWriter)
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .try_init();

    if installed.is_ok() {
        tracing::debug!(level = %default_level(), "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::info!("still logging");
    }
}
