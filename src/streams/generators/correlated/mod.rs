mod correlated_generator;

pub use correlated_generator::CorrelatedGenerator;
