pub mod detect;
pub mod http;
