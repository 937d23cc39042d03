#![forbid(unsafe_code)]

mod command;
mod connection;
pub mod line;
mod parse;
mod response;
mod value;

pub use command::{Command, is_valid_key};
pub use connection::Connection;
pub use parse::{Parse, RawValue};
pub use response::Response;
pub use value::{Value, escape, unescape};
