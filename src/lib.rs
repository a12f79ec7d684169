pub mod catalog;
pub mod config;
pub mod decision;
pub mod draft;
pub mod errors;
pub mod grade;
pub mod observability;
pub mod ui;
pub mod util;
