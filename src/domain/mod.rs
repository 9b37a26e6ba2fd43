pub mod entities;
pub mod error;
pub mod events;
pub mod ports;
pub mod synthesis;
pub mod values;
