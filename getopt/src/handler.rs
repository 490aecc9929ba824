//! What the registry does with an error raised while parsing.

use std::io::Write;

use log::debug;

use crate::error::Error;
use crate::tokenize::Token;

/// Decision returned by an [`ErrorHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Abort the parse with this error.
    Stop(Error),
    /// Keep going. `Some` records the error as the parse result unless a
    /// later one replaces it; `None` swallows it.
    Continue(Option<Error>),
}

pub trait ErrorHandler {
    fn handle(&mut self, error: Error, token: &Token) -> Flow;
}

impl<F> ErrorHandler for F
where
    F: FnMut(Error, &Token) -> Flow,
{
    fn handle(&mut self, error: Error, token: &Token) -> Flow {
        self(error, token)
    }
}

/// Stops at the first error without printing anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailFast;

impl ErrorHandler for FailFast {
    fn handle(&mut self, error: Error, token: &Token) -> Flow {
        debug!("{} while handling {}", error, token);
        Flow::Stop(error)
    }
}

/// Writes `<error> while handling <token>` and stops.
pub struct Report<W> {
    out: W,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Report { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl Report<std::io::Stderr> {
    pub fn stderr() -> Self {
        Report::new(std::io::stderr())
    }
}

impl<W: Write> ErrorHandler for Report<W> {
    fn handle(&mut self, error: Error, token: &Token) -> Flow {
        let _ = writeln!(self.out, "{} while handling {}", error, token);
        Flow::Stop(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_writes_and_stops() {
        let mut report = Report::new(Vec::new());
        let flow = report.handle(
            Error::UnknownOption("-q".to_string()),
            &Token::flag("-q"),
        );
        assert_eq!(flow, Flow::Stop(Error::UnknownOption("-q".to_string())));
        let text = String::from_utf8(report.into_inner()).unwrap();
        assert_eq!(text, "unknown option `-q` while handling -q\n");
    }

    #[test]
    fn closure_is_a_handler() {
        let mut seen = 0;
        let mut lenient = |err: Error, _: &Token| {
            seen += 1;
            Flow::Continue(Some(err))
        };
        let flow = lenient.handle(Error::MissingRequired("--out".into()), &Token::flag("--out"));
        assert!(matches!(flow, Flow::Continue(Some(_))));
        assert_eq!(seen, 1);
    }
}
