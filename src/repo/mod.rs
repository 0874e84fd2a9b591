pub mod email_list;

pub use email_list::*;
