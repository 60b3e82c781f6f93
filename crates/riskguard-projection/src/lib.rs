pub mod payload;
pub mod projection;
pub mod replay;

pub use payload::{TransactionCreatedData, UserProfileUpdatedData};
pub use projection::ProfileProjection;
pub use replay::{validate_as_of, ReplayService};
