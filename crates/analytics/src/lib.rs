pub mod filter;
pub mod ranking;
pub mod stats;

pub use filter::VaultFilter;
pub use ranking::{flow_totals, rank, Flow, FlowTotals, Party, RankingRow};
pub use stats::{compute as compute_stats, CumulativePoint, DatasetStats};
