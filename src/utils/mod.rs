pub mod code;
pub mod hash;
pub mod jwt;
pub mod notify;
