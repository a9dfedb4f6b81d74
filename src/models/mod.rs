// src/models/mod.rs

pub mod assignment;
pub mod exercise;
pub mod legacy;
pub mod live_session;
pub mod question;
pub mod user;
