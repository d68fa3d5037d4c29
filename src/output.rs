//! Printing and persisting the assembled C.
//!
//! Output failures never fail the run: C is already computed, so they are
//! logged and reported back in [`OutputReport`].

use crate::matrix::{Element, Matrix};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub print: bool,
    pub path: Option<PathBuf>,
}

/// What happened to each requested output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputReport {
    pub printed: bool,
    pub written_to: Option<PathBuf>,
    pub errors: Vec<String>,
}

/// Print C to `console` and/or persist it, as `options` asks.
pub fn emit<T: Element, W: Write>(
    c: &Matrix<T>,
    options: &OutputOptions,
    console: &mut W,
) -> OutputReport {
    let mut report = OutputReport::default();

    if options.print {
        let printed = writeln!(console, "Resultant Matrix C:")
            .map_err(Into::into)
            .and_then(|_| c.write_to(console));
        match printed {
            Ok(()) => report.printed = true,
            Err(e) => {
                warn!(error = %e, "Failed to print result");
                report.errors.push(format!("print: {}", e));
            }
        }
    }

    if let Some(path) = &options.path {
        match c.save_to_file(path) {
            Ok(()) => {
                info!(path = %path.display(), rows = c.rows, cols = c.cols, "Result saved");
                report.written_to = Some(path.clone());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save result, continuing");
                report.errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_format() {
        let c = Matrix::from_vec(vec![14i64, 32, 32, 77], 2, 2).unwrap();
        let mut console = Vec::new();
        let report = emit(
            &c,
            &OutputOptions {
                print: true,
                path: None,
            },
            &mut console,
        );
        assert!(report.printed);
        assert_eq!(
            String::from_utf8(console).unwrap(),
            "Resultant Matrix C:\n14 32\n32 77\n"
        );
    }

    #[test]
    fn test_nothing_requested() {
        let c = Matrix::<i64>::new(1, 1);
        let mut console = Vec::new();
        let report = emit(&c, &OutputOptions::default(), &mut console);
        assert_eq!(report, OutputReport::default());
        assert!(console.is_empty());
    }
}
