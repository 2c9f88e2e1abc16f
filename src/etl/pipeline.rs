//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// Batches flow through one at a time, so memory use is bounded by the
/// largest batch rather than the whole source.
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Item)
/// - `L`: Loader type (must load T::Output)
///
/// # Example
/// ```no_run
/// use tap_gapi::etl::Pipeline;
/// # use tap_gapi::etl::{Extractor, Transformer, Loader};
/// # use eyre::Result;
/// # struct MyExtractor(Option<Vec<i32>>);
/// # impl Extractor for MyExtractor {
/// #     type Item = i32;
/// #     async fn next_batch(&mut self) -> Result<Option<Vec<Self::Item>>> { Ok(self.0.take()) }
/// # }
/// # struct MyTransformer;
/// # impl Transformer for MyTransformer {
/// #     type Input = i32;
/// #     type Output = i32;
/// #     fn transform(&self, input: Self::Input) -> Result<Self::Output> { Ok(input) }
/// # }
/// # struct MyLoader;
/// # impl Loader for MyLoader {
/// #     type Item = i32;
/// #     async fn load(&mut self, items: Vec<Self::Item>) -> Result<usize> { Ok(items.len()) }
/// # }
///
/// # async fn example() -> Result<()> {
/// let mut pipeline = Pipeline::new(
///     MyExtractor(Some(vec![1, 2, 3])),
///     MyTransformer,
///     MyLoader,
/// );
///
/// let count = pipeline.run().await?;
/// println!("Processed {} items", count);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run the pipeline until the extractor is exhausted
    ///
    /// Returns the number of items successfully loaded
    ///
    /// # Errors
    /// Returns the first error from any stage. Batches loaded before the
    /// error stay loaded.
    pub async fn run(&mut self) -> Result<usize> {
        log::debug!("Starting ETL pipeline");

        let mut batches = 0usize;
        let mut count = 0usize;
        while let Some(items) = self.extractor.next_batch().await? {
            batches += 1;
            log::trace!("Extracted batch {} with {} items", batches, items.len());

            let transformed = self.transformer.transform_many(items)?;
            count += self.loader.load(transformed).await?;
        }

        if count == 0 {
            log::debug!("No items loaded from {} batch(es)", batches);
        } else {
            log::debug!("Loaded {} items from {} batch(es)", count, batches);
        }
        Ok(count)
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Take the stages back, e.g. to read extractor state after a run
    pub fn into_parts(self) -> (E, T, L) {
        (self.extractor, self.transformer, self.loader)
    }
}
