//! HTTP layer: endpoint routing, the request gateway and its stages.

pub(crate) mod common;
pub(crate) mod gateway;
pub(crate) mod interceptors;
pub(crate) mod loud_wire;
