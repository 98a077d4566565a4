//! External service adapters.
//!
//! The pipeline talks to the outside world through two narrow seams: the
//! messaging client ([`messaging`]) and the mail transport ([`mail`]).

pub mod mail;
pub mod messaging;
