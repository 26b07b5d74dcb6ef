pub mod entities;
pub mod kv;
pub mod state;
