mod choice;
mod estimator_choice;
mod schema;

pub use choice::Choice;
pub use estimator_choice::*;
pub use schema::*;
