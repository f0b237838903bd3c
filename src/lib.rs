//! Опрос сетевых принтеров по SNMP: статус, расходники и история замен.

pub mod collector;
pub mod config;
pub mod formatter;
pub mod handlers;
pub mod history;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod snmp;
pub mod store;
