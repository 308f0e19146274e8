//! Property test modules

mod batch_tests;
mod diff_tests;
mod parser_tests;
mod process_tests;
