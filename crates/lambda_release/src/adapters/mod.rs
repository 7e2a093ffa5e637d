pub mod autoscaling;
pub mod aws_autoscaling;
pub mod aws_lambda;
pub mod configuration;
pub mod pause;
pub mod registry;
