//! Built-in evaluators.
//!
//! Each evaluator is a long-side entry condition over the bounded view. All of
//! them are edge-triggered (they fire on the bar a condition becomes true), so a
//! persisting state does not re-fire every bar before debounce even sees it.

pub mod atr_expansion;
pub mod bollinger_bounce;
pub mod golden_cross;
pub mod hurst_trend;
pub mod ma_reclaim;
pub mod obv_breakout;
pub mod rsi_bounce;
pub mod volume_surge;

pub use atr_expansion::AtrExpansion;
pub use bollinger_bounce::BollingerBounce;
pub use golden_cross::GoldenCross;
pub use hurst_trend::HurstTrend;
pub use ma_reclaim::MaReclaim;
pub use obv_breakout::ObvBreakout;
pub use rsi_bounce::RsiOversoldBounce;
pub use volume_surge::VolumeSurge;
