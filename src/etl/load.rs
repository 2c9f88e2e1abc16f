//! Loader trait for loading data to destinations

use eyre::Result;

/// Loader trait for loading data to a destination
///
/// Called once per extracted batch, in extraction order.
///
/// # Example
/// ```no_run
/// use tap_gapi::etl::Loader;
/// use eyre::Result;
///
/// struct LineLoader {
///     lines: Vec<String>,
/// }
///
/// impl Loader for LineLoader {
///     type Item = String;
///
///     async fn load(&mut self, items: Vec<Self::Item>) -> Result<usize> {
///         let count = items.len();
///         self.lines.extend(items);
///         Ok(count)
///     }
/// }
/// ```
pub trait Loader: Send {
    /// The type of items to load
    type Item: Send;

    /// Load items to the destination
    ///
    /// Returns the number of items successfully loaded
    ///
    /// # Errors
    /// Returns an error if loading fails (I/O, serialization, etc.)
    fn load(
        &mut self,
        items: Vec<Self::Item>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
