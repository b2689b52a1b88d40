pub mod common;

mod concurrent_refresh;
mod server_health;
mod token_lifecycle;
