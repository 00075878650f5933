/// Extension for results on degrade-only paths: the snapshot must never fail
/// because one source did, so errors become log lines and `None`.
pub trait ResultOkLogExt<T, E> {
    /// Logs the error at `debug` level and discards it. Used by cascade tiers
    /// where failure is the expected common case (e.g. a missing host mount).
    fn ok_trace(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_trace(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::debug!("{err}");
                None
            }
        }
    }
}
