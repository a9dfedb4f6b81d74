// src/handlers/mod.rs

pub mod assignment;
pub mod auth;
pub mod catalog;
pub mod exercise;
pub mod legacy;
pub mod live_session;
