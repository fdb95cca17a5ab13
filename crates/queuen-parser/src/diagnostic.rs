//! Pretty-printable diagnostic reports for parse errors.
//!
//! [`ParseError`] carries tokens and subtrees, not rendered text; this
//! module turns one into a coloured, source-labelled report against the
//! stream's log. Single-span errors underline their whole highlight as one
//! range; `redux` errors give every highlighted block its own colour from a
//! rotating palette, skipping the gaps between blocks.

use crate::error::ParseError;
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::fmt;
use std::io;
use std::ops::Range;

/// Translate a byte offset in `source` into a char offset for ariadne.
fn map_index(source: &str, byte: usize) -> usize {
    source[..byte.min(source.len())].chars().count()
}

fn map_span(source: &str, span: Range<usize>) -> Range<usize> {
    map_index(source, span.start)..map_index(source, span.end)
}

/// A diagnostic report that can be printed to a CLI with pretty colours and
/// labelled lines of source.
pub struct Diagnostic<'a> {
    source: &'a str,
    error: &'a ParseError,
}

impl ParseError {
    /// Returns a pretty-printable diagnostic over `source`, which should be
    /// the log of the stream the error came from.
    pub fn to_diagnostic<'a>(&'a self, source: &'a str) -> Diagnostic<'a> {
        Diagnostic {
            source,
            error: self,
        }
    }
}

impl Diagnostic<'_> {
    /// Write the report to a [`Write`], with colours.
    ///
    /// [`Write`]: std::io::Write
    pub fn write(&self, w: impl io::Write) -> io::Result<()> {
        let mut colors = ColorGenerator::new();
        let spans: Vec<Range<usize>> = self
            .error
            .spans()
            .into_iter()
            .map(|span| map_span(self.source, span))
            .collect();

        let offset = spans
            .first()
            .map(|span| span.start)
            .or_else(|| self.error.index().map(|i| map_index(self.source, i)))
            .unwrap_or(0);

        let mut report: ariadne::ReportBuilder<'_, Range<usize>> =
            Report::build(ReportKind::Error, (), offset);
        report.set_message(self.error.message());

        if self.error.redux() {
            for span in &spans {
                report.add_label(Label::new(span.clone()).with_color(colors.next()));
            }
        } else if let Some(merged) = spans
            .iter()
            .cloned()
            .reduce(|a, b| a.start.min(b.start)..a.end.max(b.end))
        {
            report.add_label(Label::new(merged).with_color(colors.next()));
        }

        report.finish().write(Source::from(self.source), w)
    }
}

impl fmt::Display for Diagnostic<'_> {
    /// Write the report to a [`fmt::Formatter`]. Alternate formatting
    /// disables colours.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct StripColorAdaptor<'a, 'b> {
            f: &'a mut fmt::Formatter<'b>,
            strip: anstream::adapter::StripBytes,
        }
        impl io::Write for StripColorAdaptor<'_, '_> {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                for printable in self.strip.strip_next(buf) {
                    let s = std::str::from_utf8(printable).map_err(|_| io::ErrorKind::Other)?;
                    self.f.write_str(s).map_err(|_| io::ErrorKind::Other)?;
                }

                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        struct ColorAdaptor<'a, 'b> {
            f: &'a mut fmt::Formatter<'b>,
        }
        impl io::Write for ColorAdaptor<'_, '_> {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                let s = std::str::from_utf8(buf).map_err(|_| io::ErrorKind::Other)?;
                self.f.write_str(s).map_err(|_| io::ErrorKind::Other)?;
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        if f.alternate() {
            self.write(StripColorAdaptor {
                f,
                strip: Default::default(),
            })
            .map_err(|_| fmt::Error)
        } else {
            self.write(ColorAdaptor { f }).map_err(|_| fmt::Error)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::lexer::TokenStream;
    use crate::parser::parse_line;

    fn render(input: &str) -> String {
        let mut stream = TokenStream::new(input);
        let error = parse_line(&mut stream)
            .expect_err("input should fail to parse");
        format!("{:#}", error.to_diagnostic(stream.log()))
    }

    #[test]
    fn single_span_report_names_the_error() {
        let report = render("(");
        assert!(report.contains("missing right parenthesis"), "{report}");
        assert!(report.contains('('), "{report}");
    }

    #[test]
    fn redux_report_shows_every_block() {
        let report = render("2 3");
        assert!(
            report.contains("not a statement or reducible expression"),
            "{report}"
        );
        assert!(report.contains("2 3"), "{report}");
    }

    #[test]
    fn lexical_report_has_no_labels() {
        let report = render("\"abc");
        assert!(report.contains("unterminated string"), "{report}");
    }

    #[test]
    fn spans_survive_unicode_prefixes() {
        // The reported span is mapped from bytes to chars, so a multi-byte
        // operator before the error must not shift the underline.
        let report = render("× ×(");
        assert!(report.contains("missing right parenthesis"), "{report}");
    }
}
