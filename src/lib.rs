//! Terminal client for an AI chat backend with document-grounded context.
//!
//! The backend owns authentication, document chunking, and answer
//! generation; this crate owns the client side of the conversation: the
//! message transcript, the backend-assigned session id, the attached
//! document set, and the compose/upload workflow around them.
pub mod auth;
pub mod chat;
pub mod cli;
pub mod core;
pub mod documents;
