// 该文件是 Yuntu （云图） 项目的一部分。
// src/model/yolo.rs - YOLO 输入预处理
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::{RgbImage, imageops};
use thiserror::Error;
use tracing::debug;

use crate::{
  config::ModelSpec,
  model::{TensorPayload, Transform},
  tensor::ImageTensor,
};

pub const YOLO_INPUT_W: u32 = 608;
pub const YOLO_INPUT_H: u32 = 608;

#[derive(Error, Debug)]
pub enum PreprocessError {
  #[error("目标尺寸无效: {0}x{1}")]
  InvalidDimension(u32, u32),
  #[error("输入图像为空: {0}x{1}")]
  EmptyFrame(u32, u32),
}

pub struct YoloPreprocessBuilder {
  width: u32,
  height: u32,
}

impl Default for YoloPreprocessBuilder {
  fn default() -> Self {
    Self {
      width: YOLO_INPUT_W,
      height: YOLO_INPUT_H,
    }
  }
}

impl YoloPreprocessBuilder {
  pub fn target_size(mut self, width: u32, height: u32) -> Self {
    self.width = width;
    self.height = height;
    self
  }

  pub fn model_spec(mut self, spec: &ModelSpec) -> Self {
    self.width = spec.input_width;
    self.height = spec.input_height;
    self
  }

  /// 校验目标尺寸并构建预处理器。
  pub fn build(self) -> Result<YoloPreprocess, PreprocessError> {
    if self.width == 0 || self.height == 0 {
      return Err(PreprocessError::InvalidDimension(self.width, self.height));
    }

    Ok(YoloPreprocess {
      width: self.width,
      height: self.height,
    })
  }
}

/// YOLO 输入预处理：拉伸缩放到模型输入尺寸并归一化。
///
/// 无副作用，相同输入得到相同输出。
pub struct YoloPreprocess {
  width: u32,
  height: u32,
}

impl YoloPreprocess {
  pub fn builder() -> YoloPreprocessBuilder {
    YoloPreprocessBuilder::default()
  }

  pub fn target_size(&self) -> (u32, u32) {
    (self.width, self.height)
  }
}

impl Transform for YoloPreprocess {
  type Input = RgbImage;
  type Output = TensorPayload;
  type Error = PreprocessError;

  fn transform(&self, input: &RgbImage) -> Result<TensorPayload, PreprocessError> {
    let (original_w, original_h) = input.dimensions();
    if original_w == 0 || original_h == 0 {
      return Err(PreprocessError::EmptyFrame(original_w, original_h));
    }

    debug!(
      "缩放图像: {}x{} -> {}x{}",
      original_w, original_h, self.width, self.height
    );

    // 直接拉伸到目标尺寸，不裁剪也不加边
    let resized = imageops::resize(
      input,
      self.width,
      self.height,
      imageops::FilterType::CatmullRom,
    );

    Ok(TensorPayload {
      image_data: ImageTensor::from_rgb(&resized),
      image_size: (original_w, original_h),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
      Rgb([(x * 29 % 256) as u8, (y * 31 % 256) as u8, ((x + y) * 17 % 256) as u8])
    })
  }

  #[test]
  fn build_rejects_zero_dimensions() {
    let err = YoloPreprocess::builder().target_size(0, 608).build();
    assert!(matches!(err, Err(PreprocessError::InvalidDimension(0, 608))));

    let err = YoloPreprocess::builder().target_size(608, 0).build();
    assert!(matches!(err, Err(PreprocessError::InvalidDimension(608, 0))));
  }

  #[test]
  fn transform_rejects_empty_frame() {
    let model = YoloPreprocess::builder().target_size(2, 2).build().unwrap();
    let empty = RgbImage::new(0, 0);

    assert!(matches!(
      model.transform(&empty),
      Err(PreprocessError::EmptyFrame(0, 0))
    ));
  }

  #[test]
  fn output_shape_and_range_follow_target_size() {
    let model = YoloPreprocess::builder().target_size(5, 4).build().unwrap();
    let payload = model.transform(&gradient(64, 48)).unwrap();

    assert_eq!(payload.image_data.shape(), [1, 4, 5, 3]);
    assert!(
      payload
        .image_data
        .as_slice()
        .iter()
        .all(|v| (0.0..=1.0).contains(v))
    );
  }

  #[test]
  fn original_size_is_kept_regardless_of_target() {
    let image = gradient(5, 3);

    for (w, h) in [(2, 2), (8, 8), (5, 3)] {
      let model = YoloPreprocess::builder().target_size(w, h).build().unwrap();
      let payload = model.transform(&image).unwrap();
      assert_eq!(payload.image_size, (5, 3));
    }
  }

  #[test]
  fn red_frame_maps_to_unit_red_tensor() {
    let model = YoloPreprocess::builder().target_size(2, 2).build().unwrap();
    let red = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
    let payload = model.transform(&red).unwrap();

    assert_eq!(payload.image_size, (2, 2));
    assert_eq!(payload.image_data.shape(), [1, 2, 2, 3]);
    for y in 0..2 {
      for x in 0..2 {
        assert_eq!(payload.image_data.get(y, x, 0), 1.0);
        assert_eq!(payload.image_data.get(y, x, 1), 0.0);
        assert_eq!(payload.image_data.get(y, x, 2), 0.0);
      }
    }
  }

  #[test]
  fn resize_to_same_size_is_pixel_stable() {
    let image = gradient(8, 8);
    let model = YoloPreprocess::builder().target_size(8, 8).build().unwrap();
    let payload = model.transform(&image).unwrap();
    let identity = ImageTensor::from_rgb(&image);

    // 插值核在原尺寸上重采样，只允许量化级别的偏差
    for (a, b) in payload
      .image_data
      .as_slice()
      .iter()
      .zip(identity.as_slice())
    {
      assert!((a - b).abs() <= 1.0 / 255.0 + f32::EPSILON);
    }
  }

  #[test]
  fn model_spec_sets_target_size() {
    let spec = crate::config::model_spec("YOLO").unwrap();
    let model = YoloPreprocess::builder().model_spec(spec).build().unwrap();

    assert_eq!(model.target_size(), (608, 608));
  }
}
