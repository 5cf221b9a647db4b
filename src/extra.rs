/// String helpers
pub mod str;
