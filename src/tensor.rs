// 该文件是 Yuntu （云图） 项目的一部分。
// src/tensor.rs - NHWC 图像张量定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::RgbImage;
use serde::ser::{Serialize, SerializeSeq, Serializer};

const RGB_CHANNELS: usize = 3;

/// NHWC 排布的归一化图像张量，批维度固定为 1。
///
/// 元素按行主序存放，取值范围 [0.0, 1.0]。
/// 序列化为 JSON 时展开为 [1, H, W, 3] 形状的嵌套数组。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
  width: u32,
  height: u32,
  data: Box<[f32]>,
}

impl ImageTensor {
  /// 从 RGB 图像构建张量，像素值除以 255 映射到 [0.0, 1.0]。
  pub fn from_rgb(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let data = image
      .as_raw()
      .iter()
      .map(|value| *value as f32 / 255.0)
      .collect();

    Self {
      width,
      height,
      data,
    }
  }

  /// 张量形状 [批, 高, 宽, 通道]。
  pub fn shape(&self) -> [usize; 4] {
    [
      1,
      self.height as usize,
      self.width as usize,
      RGB_CHANNELS,
    ]
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  /// 取 (y, x, c) 处的元素。
  pub fn get(&self, y: u32, x: u32, c: usize) -> f32 {
    let index = (y as usize * self.width as usize + x as usize) * RGB_CHANNELS + c;
    self.data[index]
  }

  fn row(&self, y: u32) -> &[f32] {
    let stride = self.width as usize * RGB_CHANNELS;
    let start = y as usize * stride;
    &self.data[start..start + stride]
  }
}

impl Serialize for ImageTensor {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    // 最外层为批维度
    let mut batch = serializer.serialize_seq(Some(1))?;
    batch.serialize_element(&Plane { tensor: self })?;
    batch.end()
  }
}

struct Plane<'a> {
  tensor: &'a ImageTensor,
}

impl Serialize for Plane<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut rows = serializer.serialize_seq(Some(self.tensor.height as usize))?;
    for y in 0..self.tensor.height {
      rows.serialize_element(&Row {
        cells: self.tensor.row(y),
      })?;
    }
    rows.end()
  }
}

struct Row<'a> {
  cells: &'a [f32],
}

impl Serialize for Row<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut pixels = serializer.serialize_seq(Some(self.cells.len() / RGB_CHANNELS))?;
    for pixel in self.cells.chunks_exact(RGB_CHANNELS) {
      pixels.serialize_element(pixel)?;
    }
    pixels.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn from_rgb_normalizes_values() {
    let image = RgbImage::from_pixel(1, 1, Rgb([255, 0, 51]));
    let tensor = ImageTensor::from_rgb(&image);

    assert_eq!(tensor.as_slice(), &[1.0, 0.0, 51.0 / 255.0]);
  }

  #[test]
  fn shape_is_batch_height_width_channels() {
    let image = RgbImage::new(7, 4);
    let tensor = ImageTensor::from_rgb(&image);

    assert_eq!(tensor.shape(), [1, 4, 7, 3]);
    assert_eq!(tensor.as_slice().len(), 4 * 7 * 3);
  }

  #[test]
  fn get_indexes_row_major() {
    let image = RgbImage::from_fn(3, 2, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 0]));
    let tensor = ImageTensor::from_rgb(&image);

    assert_eq!(tensor.get(1, 2, 0), 20.0 / 255.0);
    assert_eq!(tensor.get(1, 2, 1), 10.0 / 255.0);
    assert_eq!(tensor.get(0, 0, 2), 0.0);
  }

  #[test]
  fn serializes_as_nested_arrays() {
    let image = RgbImage::from_pixel(2, 3, Rgb([255, 0, 0]));
    let tensor = ImageTensor::from_rgb(&image);
    let value = serde_json::to_value(&tensor).unwrap();

    let batch = value.as_array().unwrap();
    assert_eq!(batch.len(), 1);
    let rows = batch[0].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    let pixels = rows[0].as_array().unwrap();
    assert_eq!(pixels.len(), 2);
    let channels = pixels[0].as_array().unwrap();
    assert_eq!(channels.len(), 3);
    assert_eq!(channels[0].as_f64().unwrap(), 1.0);
    assert_eq!(channels[1].as_f64().unwrap(), 0.0);
  }
}
