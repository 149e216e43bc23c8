pub mod resource;
pub mod use_case;

