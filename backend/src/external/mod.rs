//! External API integrations

pub mod ecb_fx;

pub use ecb_fx::EcbFxClient;
