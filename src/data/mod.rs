//! Persistence of the client document.

pub mod db {
    pub use crate::db::*;
}

pub mod client_storage {
    pub use crate::client_storage::*;
}
