//! Shared library for the monthly reading counter Lambda.
//!
//! Counts records in a Notion database whose status marks them finished and
//! whose end date falls within one local calendar month.

pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod models;
pub mod monthly;
pub mod notion;
pub mod pagination;
pub mod window;

pub use config::Config;
pub use error::{Error, Result};
pub use filter::{DateCheck, FinishedFilter, StatusMatch, StatusRule};
pub use models::{MatchRecord, Page, QueryPage, QueryRequest};
pub use monthly::{respond, DebugLevel, MonthlyParams};
pub use notion::{NotionApi, NotionClient};
pub use pagination::{count_finished, walk_pages, Tally};
pub use window::{MonthWindow, TzOffset};
