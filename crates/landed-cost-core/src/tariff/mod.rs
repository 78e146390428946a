pub mod fixtures;
pub mod repository;

pub use repository::{InMemoryTariffRepository, TariffRate, TariffRepository, TariffTable, TariffVersion};
