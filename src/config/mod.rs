pub mod bot;
pub mod topics;
