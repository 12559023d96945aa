pub mod access;
pub mod clinic;
pub mod contract;
pub mod enums;
pub mod patient;
pub mod planning;
pub mod treatment;

pub use access::*;
pub use clinic::*;
pub use contract::*;
pub use enums::*;
pub use patient::*;
pub use planning::*;
pub use treatment::*;
