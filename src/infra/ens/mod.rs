//! ENS integrations.

pub mod registrar;

pub use registrar::{
    DEFAULT_CONTROLLER_ADDRESS, EnsRegistrarClient, EnsRegistrarConfig, RESERVED_LABELS,
};
