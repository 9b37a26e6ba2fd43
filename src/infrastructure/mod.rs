pub mod clock;
pub mod memory;
pub mod notify;
pub mod sqlite;
