pub mod auth;
pub mod booking;
pub mod notification;
pub mod payment;
pub mod project;
pub mod shared;
pub mod upload;
