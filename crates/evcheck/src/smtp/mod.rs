//! The SMTP probe stack (C5-C8): dialer, line client, session facade,
//! random-recipient port and its cache, and the checker that drives them.

pub mod checker;
pub mod client;
pub mod dialer;
pub mod random_rcpt;
pub mod random_rcpt_cache;
pub mod session;
