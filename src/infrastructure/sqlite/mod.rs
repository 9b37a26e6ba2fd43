pub mod migrations;
pub mod record_store;
