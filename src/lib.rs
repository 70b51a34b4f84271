//! Starclicker - backend for a Telegram Mini App clicker game
//!
//! Accounts, clicks and the leaderboard live in SQLite; coin packs are sold for
//! Telegram Stars and credited exactly once per invoice payload, whichever
//! channel (Mini App callback or bot webhook) reports the payment first.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod payload;
pub mod payments;
pub mod reconcile;
