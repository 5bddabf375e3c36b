use crate::error::Result;

/// Opaque handle to the shared embedded database.
///
/// The bootstrap layer never looks inside the database; it only sequences the
/// handle's release. `close_sync` must be a blocking call because it runs
/// during the will-quit window, where awaited continuations are not
/// guaranteed to complete.
pub trait DbConnection: Send {
    /// Close the connection, blocking until resources are released.
    ///
    /// Called at most once; the handle is consumed by the shutdown sequencer
    /// after this returns, success or not.
    fn close_sync(&mut self) -> Result<()>;
}
