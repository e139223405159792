//! # Adapters Layer

mod scripted_wallet;

pub use scripted_wallet::ScriptedWallet;
