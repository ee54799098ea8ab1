// 该文件是 Yuntu （云图） 项目的一部分。
// src/handler.rs - 请求编排
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
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::{
  input::{Fetch, InputError},
  model::{PreprocessError, TensorPayload, Transform},
  output::{OutputError, Publish},
};

#[derive(Error, Debug)]
pub enum HandlerError {
  #[error("请求体解析错误: {0}")]
  Request(#[from] serde_json::Error),
  #[error("输入错误: {0}")]
  Input(#[from] InputError),
  #[error("预处理错误: {0}")]
  Preprocess(#[from] PreprocessError),
  #[error("输出错误: {0}")]
  Output(#[from] OutputError),
}

impl HandlerError {
  /// 响应体 error 字段使用的错误类别。
  pub fn kind(&self) -> &'static str {
    match self {
      HandlerError::Request(_) => "RequestError",
      HandlerError::Input(InputError::NotFound(_)) => "ObjectNotFoundError",
      HandlerError::Input(InputError::Decode(_)) => "DecodeError",
      HandlerError::Input(_) => "StorageError",
      HandlerError::Preprocess(PreprocessError::InvalidDimension(_, _)) => {
        "InvalidDimensionError"
      }
      HandlerError::Preprocess(PreprocessError::EmptyFrame(_, _)) => "DecodeError",
      HandlerError::Output(_) => "UploadError",
    }
  }

  fn status_code(&self) -> u16 {
    match self {
      HandlerError::Request(_) => 400,
      _ => 500,
    }
  }
}

/// 入站事件。body 为网关转发的 JSON 文本。
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerEvent {
  pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRequest {
  pub image_name: String,
}

/// 出站响应。body 为 JSON 文本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
  #[serde(rename = "statusCode")]
  pub status_code: u16,
  pub body: String,
}

impl HandlerResponse {
  fn ok(image_name: &str) -> Self {
    Self {
      status_code: 200,
      body: serde_json::json!({ "image_name": image_name }).to_string(),
    }
  }

  fn error(err: &HandlerError) -> Self {
    Self {
      status_code: err.status_code(),
      body: serde_json::json!({ "error": err.kind(), "message": err.to_string() }).to_string(),
    }
  }
}

/// 取图、预处理、发布的三段式流水线。
pub struct Handler<F, M, P> {
  input: F,
  model: M,
  output: P,
}

impl<F, M, P> Handler<F, M, P>
where
  F: Fetch<Item = RgbImage> + Send + Sync,
  M: Transform<Input = RgbImage, Output = TensorPayload> + Send + Sync,
  P: Publish<Payload = TensorPayload> + Send + Sync,
  HandlerError: From<F::Error> + From<M::Error> + From<P::Error>,
{
  pub fn new(input: F, model: M, output: P) -> Self {
    Self {
      input,
      model,
      output,
    }
  }

  /// 处理一次请求。上传只在预处理成功后发生，成功恰好写入一个对象。
  pub async fn process(
    &self,
    request: &InferenceRequest,
  ) -> Result<HandlerResponse, HandlerError> {
    let frame = self.input.fetch(&request.image_name).await?;
    let payload = self.model.transform(&frame)?;
    let key = self.output.publish(&request.image_name, &payload).await?;
    info!("载荷已写入: {}", key);

    Ok(HandlerResponse::ok(&request.image_name))
  }

  /// 事件入口：解析请求体，失败折叠为非 200 响应。
  pub async fn handle(&self, event: HandlerEvent) -> HandlerResponse {
    let result = match serde_json::from_str::<InferenceRequest>(&event.body) {
      Ok(request) => {
        info!("处理图像: {}", request.image_name);
        self.process(&request).await
      }
      Err(err) => Err(HandlerError::Request(err)),
    };

    match result {
      Ok(response) => response,
      Err(err) => {
        error!("处理失败: {}", err);
        HandlerResponse::error(&err)
      }
    }
  }
}
