pub mod api;
pub mod challenge;
pub mod core;
pub mod report;
