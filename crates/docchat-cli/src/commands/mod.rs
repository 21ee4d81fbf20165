pub mod ask;
pub mod chat;
pub mod documents;
pub mod session;
pub mod utils;
