//! Stagekit Server - HTTP source of truth for the assembly document

pub mod server;

pub use server::{
    load_assembly, router, start_server, AppState, ServerConfig, FETCH_PATH, SUBMIT_PATH,
};
