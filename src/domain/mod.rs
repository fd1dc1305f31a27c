pub mod cms;
pub mod constants;
pub mod crypto;
pub mod parameters;
pub mod types;
pub mod verification;
