// 该文件是 Yuntu （云图） 项目的一部分。
// src/config.rs - 启动配置与模型注册表
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;
use url::Url;

/// 模型注册表条目：模型名对应的下游函数与输入尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
  pub name: &'static str,
  pub function_name: &'static str,
  pub input_width: u32,
  pub input_height: u32,
}

pub const MODELS: [ModelSpec; 1] = [ModelSpec {
  name: "YOLO",
  function_name: "Yolo",
  input_width: 608,
  input_height: 608,
}];

/// 按名称查找注册的模型。
pub fn model_spec(name: &str) -> Option<&'static ModelSpec> {
  MODELS.iter().find(|spec| spec.name == name)
}

const STORE_URL_ENV: &str = "IMAGE_STORE_URL";
const STACK_OUTPUT_PATH_ENV: &str = "STACK_OUTPUT_PATH";
const MODEL_NAME_ENV: &str = "MODEL_NAME";
const DEFAULT_MODEL_NAME: &str = "YOLO";
const DEFAULT_STACK_OUTPUT_PATH: &str = "./StackOutput.json";
const IMAGE_STORE_OUTPUT_KEY: &str = "ImageStore";

/// 启动配置。进程启动时构建一次，之后只读。
#[derive(Debug, Clone)]
pub struct Config {
  /// 对象存储地址，形如 s3://bucket
  pub store_url: Url,
  /// 本函数服务的模型
  pub model: &'static ModelSpec,
}

impl Config {
  /// 从环境变量加载；桶名缺省时回退到部署栈输出文件。
  pub fn load() -> anyhow::Result<Self> {
    let model_name =
      std::env::var(MODEL_NAME_ENV).unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string());
    let model =
      model_spec(&model_name).with_context(|| format!("未注册的模型: {model_name}"))?;

    let store_url = match std::env::var(STORE_URL_ENV) {
      Ok(raw) => {
        Url::parse(&raw).with_context(|| format!("无法解析 {STORE_URL_ENV}: {raw}"))?
      }
      Err(_) => {
        let path = std::env::var(STACK_OUTPUT_PATH_ENV)
          .unwrap_or_else(|_| DEFAULT_STACK_OUTPUT_PATH.to_string());
        info!("{} 未设置，读取部署栈输出: {}", STORE_URL_ENV, path);
        let bucket = image_store_bucket(Path::new(&path))?;
        Url::parse(&format!("s3://{bucket}")).context("无法构造存储地址")?
      }
    };

    Ok(Config { store_url, model })
  }
}

/// 部署栈输出文件，即 describe-stacks 的输出形状。
#[derive(Debug, Deserialize)]
struct StackOutputFile {
  #[serde(rename = "Stacks")]
  stacks: Vec<Stack>,
}

#[derive(Debug, Deserialize)]
struct Stack {
  #[serde(rename = "Outputs")]
  outputs: Vec<StackOutput>,
}

#[derive(Debug, Deserialize)]
struct StackOutput {
  #[serde(rename = "OutputKey")]
  output_key: String,
  #[serde(rename = "OutputValue")]
  output_value: String,
}

fn image_store_bucket(path: &Path) -> anyhow::Result<String> {
  let raw =
    std::fs::read(path).with_context(|| format!("无法读取栈输出文件: {}", path.display()))?;
  let file: StackOutputFile =
    serde_json::from_slice(&raw).context("栈输出文件格式错误")?;

  find_output(&file, IMAGE_STORE_OUTPUT_KEY)
    .with_context(|| format!("栈输出中缺少 {IMAGE_STORE_OUTPUT_KEY}"))
}

fn find_output(file: &StackOutputFile, key: &str) -> Option<String> {
  file
    .stacks
    .first()?
    .outputs
    .iter()
    .find(|output| output.output_key == key)
    .map(|output| output.output_value.clone())
}

#[cfg(test)]
mod tests {
  use super::*;

  const STACK_OUTPUT: &str = r#"{
    "Stacks": [
      {
        "Outputs": [
          { "OutputKey": "ApiEndpoint", "OutputValue": "https://example.invalid" },
          { "OutputKey": "ImageStore", "OutputValue": "image-store-1a2b3c" }
        ]
      }
    ]
  }"#;

  #[test]
  fn model_table_has_yolo_entry() {
    let spec = model_spec("YOLO").unwrap();

    assert_eq!(spec.function_name, "Yolo");
    assert_eq!((spec.input_width, spec.input_height), (608, 608));
  }

  #[test]
  fn unknown_model_is_not_found() {
    assert!(model_spec("SSD").is_none());
  }

  #[test]
  fn find_output_picks_image_store_value() {
    let file: StackOutputFile = serde_json::from_str(STACK_OUTPUT).unwrap();

    assert_eq!(
      find_output(&file, IMAGE_STORE_OUTPUT_KEY).as_deref(),
      Some("image-store-1a2b3c")
    );
    assert_eq!(find_output(&file, "LogStore"), None);
  }

  #[test]
  fn find_output_handles_empty_stacks() {
    let file: StackOutputFile = serde_json::from_str(r#"{ "Stacks": [] }"#).unwrap();

    assert_eq!(find_output(&file, IMAGE_STORE_OUTPUT_KEY), None);
  }
}
