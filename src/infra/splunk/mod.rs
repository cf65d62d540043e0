pub mod client;

pub use client::SplunkClient;
