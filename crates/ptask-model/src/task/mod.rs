mod assignment;
pub use assignment::AssignmentDetails;

mod params;
pub use params::TaskParams;

mod schedule;
pub use schedule::TaskSchedule;

mod context;
pub use context::ExecutionContext;

mod response;
pub use response::{CODE_INTERNAL, CODE_OK, CODE_TIMEOUT, Response};
