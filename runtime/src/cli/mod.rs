//! CLI subcommand implementations for the lms-scraper binary.

pub mod doctor;
pub mod scrape_cmd;
