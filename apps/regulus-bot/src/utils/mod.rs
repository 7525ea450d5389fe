pub mod components;
pub mod embeds;
pub mod permissions;
