pub mod query;
pub mod run;
