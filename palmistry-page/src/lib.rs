pub mod error;
pub mod prepare;
pub mod result;
pub mod session;
pub mod state;
pub mod view;
