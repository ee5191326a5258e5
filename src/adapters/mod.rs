// Adapters layer: concrete implementations for external systems (postal data, routing, storage).

pub mod geonames;
pub mod osrm;
pub mod storage;
