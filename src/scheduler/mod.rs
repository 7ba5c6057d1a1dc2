mod deque;
mod worker;

pub use deque::*;
pub use worker::*;

#[cfg(test)]
mod worker_tests;
