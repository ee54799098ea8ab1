// 该文件是 Yuntu （云图） 项目的一部分。
// src/main.rs - 云函数入口
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use anyhow::Context;
use lambda_runtime::{LambdaEvent, run, service_fn};
use tracing::info;

use yuntu::{
  FromUrl,
  config::Config,
  handler::{Handler, HandlerEvent, HandlerResponse},
  input::ImageObjectInput,
  model::YoloPreprocess,
  output::TensorPayloadOutput,
  store::ObjectStoreBuilder,
};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
  tracing_subscriber::fmt::init();

  let config = Config::load().context("加载配置失败")?;
  info!("存储地址: {}", config.store_url);
  info!(
    "模型: {} -> {} ({}x{})",
    config.model.name,
    config.model.function_name,
    config.model.input_width,
    config.model.input_height
  );

  let store = ObjectStoreBuilder::from_url(&config.store_url)
    .context("解析存储地址失败")?
    .connect()
    .await;

  let model = YoloPreprocess::builder()
    .model_spec(config.model)
    .build()
    .context("构建预处理器失败")?;

  let handler = Handler::new(
    ImageObjectInput::new(store.clone()),
    model,
    TensorPayloadOutput::new(store),
  );
  let handler = &handler;

  run(service_fn(move |event: LambdaEvent<HandlerEvent>| async move {
    Ok::<HandlerResponse, lambda_runtime::Error>(handler.handle(event.payload).await)
  }))
  .await
}
