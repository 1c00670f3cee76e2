pub mod blackjack;
pub mod casino;
pub mod clock;
pub mod combat;
pub mod command;
pub mod config;
pub mod economy;
pub mod engine;
pub mod error;
pub mod event;
pub mod market;
pub mod moderation;
pub mod persona;
pub mod rng;
pub mod session;
pub mod store;
pub mod types;
