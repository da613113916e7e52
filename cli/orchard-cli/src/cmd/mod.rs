pub mod claim;
pub mod shutdown;
