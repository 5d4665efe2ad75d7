mod correlated;

pub use correlated::CorrelatedGenerator;
