pub mod field;
pub mod form;
pub mod generate;
pub mod preview;
pub mod session;
