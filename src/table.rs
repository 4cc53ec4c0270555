use config::Config;
use session::Session;

pub mod config;
pub mod error;
pub mod index_node;
pub mod layout;
pub mod meta;
pub mod page;
pub mod row;
pub mod row_store;
pub mod session;
pub mod statement;


pub fn open(config: &Config) -> Session {
    Session::new(config)
}
