// 该文件是 Yuntu （云图） 项目的一部分。
// src/store.rs - 对象存储访问
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

use aws_sdk_s3::Client;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("URI scheme mismatch: expected '{expected}', found '{found}'")]
  SchemeMismatch {
    expected: &'static str,
    found: String,
  },
  #[error("missing bucket name in store url: {0}")]
  MissingBucket(Url),
}

pub struct ObjectStoreBuilder {
  bucket: String,
}

impl FromUrlWithScheme for ObjectStoreBuilder {
  const SCHEME: &'static str = "s3";
}

impl FromUrl for ObjectStoreBuilder {
  type Error = StoreError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StoreError::SchemeMismatch {
        expected: Self::SCHEME,
        found: url.scheme().to_string(),
      });
    }

    let bucket = url
      .host_str()
      .filter(|host| !host.is_empty())
      .ok_or_else(|| StoreError::MissingBucket(url.clone()))?;

    Ok(ObjectStoreBuilder {
      bucket: bucket.to_string(),
    })
  }
}

impl ObjectStoreBuilder {
  /// 加载环境中的凭证与区域配置，建立客户端。
  pub async fn connect(self) -> ObjectStore {
    info!("连接对象存储桶: {}", self.bucket);
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
      .load()
      .await;

    ObjectStore {
      client: Client::new(&aws_config),
      bucket: self.bucket,
    }
  }
}

/// 存储客户端与桶名。进程启动时创建一次，之后只读。
#[derive(Clone)]
pub struct ObjectStore {
  client: Client,
  bucket: String,
}

impl ObjectStore {
  pub fn client(&self) -> &Client {
    &self.client
  }

  pub fn bucket(&self) -> &str {
    &self.bucket
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_url_extracts_bucket() {
    let url = Url::parse("s3://image-store").unwrap();
    let builder = ObjectStoreBuilder::from_url(&url).unwrap();

    assert_eq!(builder.bucket, "image-store");
  }

  #[test]
  fn from_url_rejects_other_schemes() {
    let url = Url::parse("file:///tmp/images").unwrap();

    assert!(matches!(
      ObjectStoreBuilder::from_url(&url),
      Err(StoreError::SchemeMismatch { found, .. }) if found == "file"
    ));
  }

  #[test]
  fn from_url_requires_bucket_host() {
    let url = Url::parse("s3:///no-host").unwrap();

    assert!(matches!(
      ObjectStoreBuilder::from_url(&url),
      Err(StoreError::MissingBucket(_))
    ));
  }
}
