pub mod assignment;
pub mod parser;
