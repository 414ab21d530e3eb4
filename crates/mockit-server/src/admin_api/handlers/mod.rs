pub mod routes;
pub mod system;
