pub mod cloud_a;
pub mod cloud_b;
pub mod local;
