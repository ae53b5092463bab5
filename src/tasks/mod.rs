//! Background task scheduling and main-thread dispatch

pub mod runner;
pub mod main_thread;

pub use runner::TaskRunner;
pub use main_thread::{MainThreadHandle, MainThreadQueue};
