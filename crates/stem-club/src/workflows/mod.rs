pub mod contact;
pub mod intake;
pub mod membership;
pub mod router;

pub use router::intake_router;
