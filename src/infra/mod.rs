//! Infrastructure layer implementations.

pub mod bonus;
pub mod database;
pub mod ens;
pub mod ledger;

pub use bonus::InMemoryBonusStore;
pub use database::{PostgresClient, PostgresConfig};
pub use ens::{EnsRegistrarClient, EnsRegistrarConfig};
pub use ledger::{SimulatedChainClient, parse_token_list, parse_treasury_seed};
