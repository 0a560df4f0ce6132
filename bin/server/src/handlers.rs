//! HTTP request handlers

pub mod cases;
pub mod error;
pub mod health;
pub mod upload;
pub mod upload_form;
