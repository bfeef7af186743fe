use burn::tensor::{backend::Backend, Int, Tensor};

/// Windows sampled for one training step, `N` windows of `W` steps.
#[derive(Clone, Debug)]
pub struct Batch<B: Backend> {
    pub s: Tensor<B, 2>,              // [N, n_s]
    pub y: Tensor<B, 2>,              // [N, W]
    pub x: Tensor<B, 3>,              // [N, n_x, W]
    pub available_mask: Tensor<B, 2>, // [N, W]
    pub sample_mask: Tensor<B, 2>,    // [N, W]
    pub idxs: Tensor<B, 1, Int>,      // [N]
}

impl<B: Backend> Batch<B> {
    pub fn len(&self) -> usize {
        self.idxs.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn windows_size(&self) -> usize {
        self.y.dims()[1]
    }
}
