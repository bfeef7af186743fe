use burn::tensor::{backend::Backend, Tensor};
use rand::Rng;

use crate::data::batch::Batch;
use crate::data::windows::{ChannelLayout, WindowSet};
use crate::utils::{float_tensor, int_tensor};

/// Picks the windows of a batch out of the eligible ones.
///
/// Shuffled batches draw `batch_size` windows uniformly with replacement, so
/// a small eligible set yields repeated windows. Unshuffled batches take every
/// eligible window in order and ignore `batch_size`.
pub fn select_windows<R: Rng>(
    eligible: &[usize],
    batch_size: usize,
    shuffle: bool,
    rng: &mut R,
) -> Vec<usize> {
    if !shuffle || eligible.is_empty() {
        return eligible.to_vec();
    }

    (0..batch_size)
        .map(|_| eligible[rng.gen_range(0..eligible.len())])
        .collect()
}

/// Selects the chosen rows of `values` (the `[n_windows, n_channels, W]`
/// tensor of `windows`) and splits their channels into batch tensors.
pub fn gather<B: Backend>(
    windows: &WindowSet,
    values: Tensor<B, 3>,
    chosen: &[usize],
    layout: &ChannelLayout,
    device: &B::Device,
) -> Batch<B> {
    let n = chosen.len();
    let n_windows = windows.len();
    let w = windows.windows_size();
    let n_x = layout.n_exogenous();
    let n_s = windows.n_static();

    let chosen = int_tensor::<B>(chosen.iter().map(|&window| window as i64).collect(), device);
    let values = values.select(0, chosen.clone());
    let channel = |c: usize| values.clone().slice([0..n, c..c + 1, 0..w]).reshape([n, w]);

    let x = if n_x == 0 {
        float_tensor(Vec::new(), [n, 0, w], device)
    } else {
        values.clone().slice([0..n, layout.exogenous.clone(), 0..w])
    };
    let s = if n_s == 0 {
        float_tensor(Vec::new(), [n, 0], device)
    } else {
        float_tensor::<B, 2>(windows.static_rows().to_vec(), [n_windows, n_s], device)
            .select(0, chosen.clone())
    };
    let idxs = windows.series_idxs().iter().map(|&idx| idx as i64).collect();

    Batch {
        s,
        y: channel(layout.y),
        x,
        available_mask: channel(layout.available_mask),
        sample_mask: channel(layout.sample_mask),
        idxs: int_tensor::<B>(idxs, device).select(0, chosen),
    }
}
