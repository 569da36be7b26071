// Adapters layer: concrete implementations of the domain ports.

pub mod aws;

pub use aws::AwsProvider;
