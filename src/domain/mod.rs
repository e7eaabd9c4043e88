// Domain layer: FDO message vocabulary, ledger data model and the ports the hooks depend on.

pub mod message;
pub mod model;
pub mod ports;
