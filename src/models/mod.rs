// Core data models for mxsift

pub mod validation;
pub mod email_list;

pub use validation::*;
pub use email_list::*;
