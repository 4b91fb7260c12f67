pub mod conversation;
pub mod report;
pub mod signals;
pub mod state;
pub mod utils;
