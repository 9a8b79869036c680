//! Error accumulation for lenient ("continue on error") processing.

use super::types::{Error, Result};

/// Collects content errors while an archive is read.
///
/// In strict mode the first recorded error is handed back to the caller so it
/// can abort with `?`. In lenient mode every error is kept as a
/// human-readable string and processing continues.
#[derive(Debug, Default)]
pub struct ErrorLog {
    continue_on_error: bool,
    errors: Vec<String>,
}

impl ErrorLog {
    /// Create an empty log.
    pub fn new(continue_on_error: bool) -> Self {
        Self {
            continue_on_error,
            errors: Vec::new(),
        }
    }

    /// Whether errors are recorded rather than propagated.
    #[inline]
    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    /// Record an error.
    ///
    /// Returns `Err(err)` in strict mode and `Ok(())` in lenient mode.
    pub fn record(&mut self, err: Error) -> Result<()> {
        ::log::error!("{}", err);
        self.errors.push(err.to_string());
        if self.continue_on_error {
            Ok(())
        } else {
            Err(err)
        }
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Move the recorded messages out of the log.
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_log_propagates() {
        let mut log = ErrorLog::new(false);
        let result = log.record(Error::FileNotFound("/a.txt".to_string()));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
        assert_eq!(log.errors().len(), 1);
    }

    #[test]
    fn test_lenient_log_accumulates() {
        let mut log = ErrorLog::new(true);
        assert!(log.record(Error::FileNotFound("/a.txt".to_string())).is_ok());
        assert!(log.record(Error::EntryNotFound("/b.txt".to_string())).is_ok());
        let errors = log.into_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("/a.txt"));
    }
}
