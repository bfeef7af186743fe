use burn::tensor::{backend::Backend, Data, Int, Shape, Tensor};

pub fn float_tensor<B: Backend, const D: usize>(
    values: Vec<f32>,
    dims: [usize; D],
    device: &B::Device,
) -> Tensor<B, D> {
    let data = Data::new(values, Shape::new(dims));
    let tensor: Tensor<B, D> = Tensor::from_data(data.convert());
    tensor.to_device(device)
}

pub fn int_tensor<B: Backend>(values: Vec<i64>, device: &B::Device) -> Tensor<B, 1, Int> {
    let len = values.len();
    let data = Data::new(values, Shape::new([len]));
    let tensor: Tensor<B, 1, Int> = Tensor::from_data(data.convert());
    tensor.to_device(device)
}
