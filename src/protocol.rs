pub mod flow;
pub mod messages;
pub mod policy;

pub use flow::*;
pub use messages::*;
pub use policy::build_rules;
