//! Indentation-tracking writer for generated Rust source.
//!
//! The `codegen` crate covers traits and inherent impls; everything else
//! (enums with tagged variants, `match` tables, trait impls with where
//! clauses) is written through a `CodeWriter`.
//!
//! Indentation is managed by RAII guards. The level lives in an
//! `Rc<Cell<usize>>`, so a guard can be held while the writer is borrowed
//! mutably for writes.
//!
//! ```
//! use pact_codegen::code_writer::CodeWriter;
//! use pact_codegen::cw_writeln;
//!
//! let mut output = String::new();
//! let mut w = CodeWriter::new(&mut output);
//!
//! w.doc("A key.").unwrap();
//! w.block("pub mod message_key", |w| {
//!     cw_writeln!(w, "pub const LOGIN: u32 = {};", 1)
//! })
//! .unwrap();
//!
//! assert_eq!(
//!     output,
//!     "/// A key.\npub mod message_key {\n    pub const LOGIN: u32 = 1;\n}\n"
//! );
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub struct CodeWriter<W> {
    writer: W,
    indent_level: Rc<Cell<usize>>,
    at_line_start: Cell<bool>,
}

const INDENT: &str = "    ";

impl<W: fmt::Write> CodeWriter<W> {
    /// A writer indenting with four spaces, as `rustfmt` does.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            indent_level: Rc::new(Cell::new(0)),
            at_line_start: Cell::new(true),
        }
    }

    /// Write text without a newline. Indents if at the start of a line.
    fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }

        if self.at_line_start.get() && !text.trim().is_empty() {
            for _ in 0..self.indent_level.get() {
                self.writer.write_str(INDENT)?;
            }
            self.at_line_start.set(false);
        }

        self.writer.write_str(text)
    }

    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.writer.write_char('\n')?;
        self.at_line_start.set(true);
        Ok(())
    }

    pub fn blank_line(&mut self) -> fmt::Result {
        self.writer.write_char('\n')?;
        self.at_line_start.set(true);
        Ok(())
    }

    /// Indentation increases while the returned guard is alive.
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    /// Outer doc comment, one `///` line per input line.
    pub fn doc(&mut self, text: &str) -> fmt::Result {
        for line in text.lines() {
            if line.trim().is_empty() {
                self.writeln("///")?;
            } else {
                self.writeln(&format!("/// {}", line.trim_end()))?;
            }
        }
        Ok(())
    }

    /// `#[...]` attribute line.
    pub fn attr(&mut self, attr: &str) -> fmt::Result {
        self.writeln(&format!("#[{attr}]"))
    }

    /// `header {`, the body one level deeper, then `}`.
    pub fn block<F>(&mut self, header: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.block_with_close(header, "}", body)
    }

    /// Like [`block`](Self::block) with a custom closer, e.g. `};` or `},`.
    pub fn block_with_close<F>(&mut self, header: &str, close: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        if header.is_empty() {
            self.writeln("{")?;
        } else {
            self.writeln(&format!("{header} {{"))?;
        }
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln(close)
    }

    /// Use [`cw_writeln!`](crate::cw_writeln) instead.
    #[doc(hidden)]
    pub fn writeln_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let formatted = format!("{args}");
        self.writeln(&formatted)
    }
}

pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        let current = self.indent_level.get();
        self.indent_level.set(current.saturating_sub(1));
    }
}

/// `writeln!` for a [`CodeWriter`].
#[macro_export]
macro_rules! cw_writeln {
    ($writer:expr, $($arg:tt)*) => {
        $writer.writeln_fmt(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks_indent() {
        let mut output = String::new();
        let mut w = CodeWriter::new(&mut output);

        w.block("impl Foo", |w| {
            w.block("fn bar(&self) -> u32", |w| w.writeln("42"))
        })
        .unwrap();

        assert_eq!(
            output,
            "impl Foo {\n    fn bar(&self) -> u32 {\n        42\n    }\n}\n"
        );
    }

    #[test]
    fn custom_close() {
        let mut output = String::new();
        let mut w = CodeWriter::new(&mut output);

        w.block_with_close("let x = match y", "};", |w| w.writeln("_ => 0,"))
            .unwrap();

        assert_eq!(output, "let x = match y {\n    _ => 0,\n};\n");
    }

    #[test]
    fn doc_keeps_paragraph_breaks() {
        let mut output = String::new();
        let mut w = CodeWriter::new(&mut output);

        w.doc("First line.\n\nSecond paragraph.  ").unwrap();
        w.attr("derive(Debug)").unwrap();

        assert_eq!(
            output,
            "/// First line.\n///\n/// Second paragraph.\n#[derive(Debug)]\n"
        );
    }

    #[test]
    fn blank_lines_are_not_indented() {
        let mut output = String::new();
        let mut w = CodeWriter::new(&mut output);

        {
            let _indent = w.indent();
            w.writeln("a").unwrap();
            w.blank_line().unwrap();
            w.writeln("b").unwrap();
        }
        w.writeln("c").unwrap();
        assert_eq!(output, "    a\n\n    b\nc\n");
    }

    #[test]
    fn writeln_macro_formats() {
        let mut output = String::new();
        let mut w = CodeWriter::new(&mut output);

        w.block("fn sum(a: u32, b: u32) -> u64", |w| {
            cw_writeln!(w, "u64::from(a) + u64::from({})", "b")
        })
        .unwrap();

        assert_eq!(output, "fn sum(a: u32, b: u32) -> u64 {\n    u64::from(a) + u64::from(b)\n}\n");
    }
}
