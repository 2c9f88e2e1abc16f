//! Extractor trait for pulling batches from a source

use eyre::Result;

/// Extractor trait for extracting data from a source, one batch at a time
///
/// A batch is whatever the source naturally returns in one go: an API page,
/// a file, a query result. Returning `None` signals exhaustion.
///
/// # Example
/// ```no_run
/// use tap_gapi::etl::Extractor;
/// use eyre::Result;
///
/// struct Countdown(u32);
///
/// impl Extractor for Countdown {
///     type Item = u32;
///
///     async fn next_batch(&mut self) -> Result<Option<Vec<Self::Item>>> {
///         if self.0 == 0 {
///             return Ok(None);
///         }
///         self.0 -= 1;
///         Ok(Some(vec![self.0]))
///     }
/// }
/// ```
pub trait Extractor: Send {
    /// The type of items extracted
    type Item: Send;

    /// Extract the next batch, or `None` once the source is exhausted
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, I/O, parsing, etc.)
    fn next_batch(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<Vec<Self::Item>>>> + Send;

    /// Drain the source into memory
    fn extract_all(&mut self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send
    where
        Self: Sized,
    {
        async move {
            let mut items = Vec::new();
            while let Some(batch) = self.next_batch().await? {
                items.extend(batch);
            }
            Ok(items)
        }
    }
}
