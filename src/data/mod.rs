//! External data: census sectors, state names and the IPCA series.

pub mod ipca;
pub mod sectors;
pub mod states;

pub use ipca::{IndexCorrection, IndexSource, IpcaClient};
pub use sectors::*;
pub use states::StateNames;
