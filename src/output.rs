// 该文件是 Yuntu （云图） 项目的一部分。
// src/output.rs - 张量载荷输出
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

use async_trait::async_trait;
use aws_sdk_s3::{
  error::SdkError, operation::put_object::PutObjectError, primitives::ByteStream,
};
use thiserror::Error;
use tracing::info;

use crate::{model::TensorPayload, store::ObjectStore};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("载荷序列化错误: {0}")]
  Serialize(#[from] serde_json::Error),
  #[error("载荷上传错误: {0}")]
  Upload(#[source] Box<SdkError<PutObjectError>>),
}

/// 发布一次处理结果，返回写入的对象键。
#[async_trait]
pub trait Publish {
  type Payload;
  type Error;

  async fn publish(&self, name: &str, payload: &Self::Payload) -> Result<String, Self::Error>;
}

/// 把张量载荷以 JSON 文本写回对象存储。
pub struct TensorPayloadOutput {
  store: ObjectStore,
}

impl TensorPayloadOutput {
  pub fn new(store: ObjectStore) -> Self {
    Self { store }
  }

  /// 由输入对象名推导载荷对象键。
  pub fn object_key(name: &str) -> String {
    format!("yolo-{name}.json")
  }
}

#[async_trait]
impl Publish for TensorPayloadOutput {
  type Payload = TensorPayload;
  type Error = OutputError;

  async fn publish(&self, name: &str, payload: &TensorPayload) -> Result<String, OutputError> {
    let key = Self::object_key(name);
    // 与下游约定为带缩进的 JSON 文本
    let body = serde_json::to_vec_pretty(payload)?;
    info!("上传载荷对象: {} ({} 字节)", key, body.len());

    self
      .store
      .client()
      .put_object()
      .bucket(self.store.bucket())
      .key(&key)
      .content_type("application/json")
      .body(ByteStream::from(body))
      .send()
      .await
      .map_err(|err| OutputError::Upload(Box::new(err)))?;

    Ok(key)
  }
}
