pub mod cone;
pub mod coords;
pub mod http;
pub mod query_loop;
pub mod votable;
