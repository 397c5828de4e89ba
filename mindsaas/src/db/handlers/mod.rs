pub mod answers;
pub mod deliveries;
pub mod payments;
pub mod prds;

pub use answers::IntakeAnswers;
pub use deliveries::Deliveries;
pub use payments::Payments;
pub use prds::Prds;
