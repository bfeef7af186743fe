pub mod batch;
pub mod eligibility;
pub mod loader;
pub mod sampler;
pub mod seriesitem;
pub mod store;
pub mod tensor;
pub mod windows;
