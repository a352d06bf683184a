//! Request validation and business rules, shared by the HTTP handlers.
//!
//! Every function takes the application state and returns [`AppError`] so
//! handlers stay thin.
//!
//! [`AppError`]: crate::common::app_error::AppError

pub mod carts;
pub mod chats;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod pos;
pub mod tables;
pub mod users;
