pub mod trade_query;

pub use trade_query::{parse_timestamp, FilterCriteria, MatchMode, SearchCriteria, TradeQueryService};
