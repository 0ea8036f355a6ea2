pub mod doctor;
pub mod enums;
pub mod observation;
pub mod opd;
pub mod patient;

pub use doctor::*;
pub use enums::*;
pub use observation::*;
pub use opd::*;
pub use patient::*;
