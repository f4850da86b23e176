mod common;
mod scheduler;
