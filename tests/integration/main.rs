//! End-to-end tests: the reference host with the tweak engine loaded.

mod loot;
mod mock_host;
mod profile_sync;
mod requests;
mod startup;
