// 该文件是 Yuntu （云图） 项目的一部分。
// src/input.rs - 图像对象输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use async_trait::async_trait;
use aws_sdk_s3::{error::SdkError, operation::get_object::GetObjectError};
use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::store::ObjectStore;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("对象不存在: {0}")]
  NotFound(String),
  #[error("对象下载错误: {0}")]
  Download(#[source] Box<SdkError<GetObjectError>>),
  #[error("对象读取错误: {0}")]
  Body(#[from] aws_sdk_s3::primitives::ByteStreamError),
  #[error("图像解码错误: {0}")]
  Decode(#[from] image::ImageError),
}

/// 按名称拉取一个已解码的输入。
#[async_trait]
pub trait Fetch {
  type Item;
  type Error;

  async fn fetch(&self, name: &str) -> Result<Self::Item, Self::Error>;
}

/// 从对象存储下载图像并解码为 RGB。
pub struct ImageObjectInput {
  store: ObjectStore,
}

impl ImageObjectInput {
  pub fn new(store: ObjectStore) -> Self {
    Self { store }
  }
}

#[async_trait]
impl Fetch for ImageObjectInput {
  type Item = RgbImage;
  type Error = InputError;

  async fn fetch(&self, name: &str) -> Result<RgbImage, InputError> {
    info!("下载图像对象: {}", name);
    let object = self
      .store
      .client()
      .get_object()
      .bucket(self.store.bucket())
      .key(name)
      .send()
      .await
      .map_err(|err| match &err {
        SdkError::ServiceError(service) if service.err().is_no_such_key() => {
          InputError::NotFound(name.to_string())
        }
        _ => InputError::Download(Box::new(err)),
      })?;

    let bytes = object.body.collect().await?.into_bytes();
    debug!("图像对象大小: {} 字节", bytes.len());

    let image = image::load_from_memory(&bytes)?;
    Ok(image.into_rgb8())
  }
}
