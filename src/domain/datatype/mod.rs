pub mod list;
pub mod security;
pub mod status;
