mod common;
mod concurrency_tests;
mod retry_tests;
