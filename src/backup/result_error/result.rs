use crate::backup::result_error::error::Error;
use crate::backup::result_error::WithMsg;

pub type Result<T> = std::result::Result<T, Error>;

impl<R, S: Into<String>> WithMsg<S> for Result<R> {
    fn with_msg(self, msg: S) -> Self {
        self.map_err(|e| e.with_msg(msg))
    }
}

/// Keeps the primary error and appends the cleanup error when there is one.
///
/// A cleanup failure after a success does not undo the success, it is only
/// reported through tracing.
pub fn chain_cleanup<T>(res: Result<T>, cleanup: std::io::Result<()>) -> Result<T> {
    match (res, cleanup) {
        (res, Ok(())) => res,
        (Ok(v), Err(e)) => {
            tracing::warn!("Cleanup failed: {e}");
            Ok(v)
        }
        (Err(e1), Err(e2)) => Err(e1.chain(Error::from(e2).with_msg("Cleanup failed"))),
    }
}
