pub mod yahoo;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::{Interval, Series};

/// A source of historical OHLCV bars, shared across jobs as
/// `Arc<dyn MarketDataProvider>`.
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch bars for `symbol` at `interval` covering `range` (e.g. `"1d"`, `"5d"`).
    ///
    /// An unknown symbol or a quiet market may yield an empty series; that is
    /// not an error at this layer.
    fn fetch_series(
        &self,
        symbol: &str,
        interval: Interval,
        range: &str,
    ) -> BoxFuture<'_, Result<Series, Report<ProviderError>>>;
}
