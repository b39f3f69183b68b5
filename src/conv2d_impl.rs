use ndarray::{Array2, ArrayView3};

/// Unfold a `[C, H, W]` feature map into a `[C * kh * kw, out_h * out_w]` matrix
/// so a valid convolution becomes one GEMM against the `[F, C * kh * kw]` kernel.
///
/// Row order is channel, then kernel row, then kernel column, which is the
/// row-major flattening of a PyTorch `[F, C, kh, kw]` weight.
pub fn im2col(
    input: ArrayView3<'_, f32>,
    kernel_h: usize,
    kernel_w: usize,
    stride_h: usize,
    stride_w: usize,
    out_h: usize,
    out_w: usize,
) -> Array2<f32> {
    let channels = input.dim().0;
    let mut col_matrix = Array2::zeros((channels * kernel_h * kernel_w, out_h * out_w));

    for c in 0..channels {
        for kh in 0..kernel_h {
            for kw in 0..kernel_w {
                let row_idx = (c * kernel_h + kh) * kernel_w + kw;
                let mut row = col_matrix.row_mut(row_idx);

                for oh in 0..out_h {
                    let ih = oh * stride_h + kh;
                    for ow in 0..out_w {
                        let iw = ow * stride_w + kw;
                        row[oh * out_w + ow] = input[[c, ih, iw]];
                    }
                }
            }
        }
    }

    col_matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_im2col_basic() {
        let input = Array3::from_shape_vec((1, 2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        let col = im2col(input.view(), 2, 2, 1, 1, 1, 1);

        assert_eq!(col.shape(), &[4, 1]);
        assert_eq!(col.column(0).to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_im2col_with_stride() {
        let input = Array3::from_shape_vec(
            (1, 3, 3),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        )
        .unwrap();

        let col = im2col(input.view(), 2, 2, 2, 2, 1, 1);

        assert_eq!(col.shape(), &[4, 1]);
        assert_eq!(col.column(0).to_vec(), vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn test_im2col_sliding_patches() {
        let input = Array3::from_shape_vec(
            (1, 3, 3),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        )
        .unwrap();

        let col = im2col(input.view(), 2, 2, 1, 1, 2, 2);

        assert_eq!(col.shape(), &[4, 4]);
        assert_eq!(col.column(0).to_vec(), vec![1.0, 2.0, 4.0, 5.0]);
        assert_eq!(col.column(1).to_vec(), vec![2.0, 3.0, 5.0, 6.0]);
        assert_eq!(col.column(2).to_vec(), vec![4.0, 5.0, 7.0, 8.0]);
        assert_eq!(col.column(3).to_vec(), vec![5.0, 6.0, 8.0, 9.0]);
    }

    #[test]
    fn test_im2col_multiple_channels() {
        let input = Array3::from_shape_vec(
            (2, 2, 2),
            vec![
                1.0, 2.0, 3.0, 4.0, //
                5.0, 6.0, 7.0, 8.0,
            ],
        )
        .unwrap();

        let col = im2col(input.view(), 2, 2, 1, 1, 1, 1);

        assert_eq!(col.shape(), &[8, 1]);
        assert_eq!(
            col.column(0).to_vec(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
        );
    }
}
