//! Domain types: candles, the series store, and the bounded history view.

pub mod candle;
pub mod series;
pub mod view;

pub use candle::Candle;
pub use series::{Series, SeriesError};
pub use view::HistoryView;
