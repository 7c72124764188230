//! Request handlers, one module per resource.

pub mod attributes;
pub mod auth;
pub mod comments;
pub mod links;
pub mod materials;
pub mod modules;
pub mod notifications;
pub mod objectives;
pub mod observations;
pub mod programs;
pub mod relations;
pub mod tags;
pub mod users;
