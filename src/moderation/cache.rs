//! 审核结果缓存
//! 按（书名，作者）缓存整书分析结果，避免重复扫描未变化的书籍

use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::error::Result;
use super::service::ModerationService;
use super::types::AnalysisResult;

const DEFAULT_MAX_BOOKS: u64 = 512;

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookKey {
    pub name: String,
    pub author: String,
}

impl BookKey {
    pub fn new(name: &str, author: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            author: author.trim().to_string(),
        }
    }
}

/// 分析结果缓存
#[derive(Clone)]
pub struct ResultCache {
    cache: MokaCache<BookKey, Arc<AnalysisResult>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_BOOKS)
    }

    pub fn with_capacity(max_books: u64) -> Self {
        Self {
            cache: MokaCache::builder().max_capacity(max_books).build(),
        }
    }

    pub async fn get(&self, key: &BookKey) -> Option<Arc<AnalysisResult>> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: BookKey, result: AnalysisResult) -> Arc<AnalysisResult> {
        let value = Arc::new(result);
        self.cache.insert(key, Arc::clone(&value)).await;
        value
    }

    pub async fn invalidate(&self, key: &BookKey) {
        self.cache.invalidate(key).await;
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    /// 当前条目数（近似值，moka 异步维护）
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// 命中直接返回，未命中时分析文本并写入缓存
    pub async fn get_or_analyze(
        &self,
        key: BookKey,
        service: &ModerationService,
        text: &str,
    ) -> Result<Arc<AnalysisResult>> {
        if let Some(hit) = self.cache.get(&key).await {
            debug!(name = %key.name, author = %key.author, "moderation cache hit");
            return Ok(hit);
        }
        let result = service.analyze_text(text)?;
        Ok(self.insert(key, result).await)
    }

    /// 导出缓存条目为 JSON，供外部持久化；未命中时返回 `None`
    pub async fn export_json(&self, key: &BookKey) -> Result<Option<String>> {
        match self.cache.get(key).await {
            Some(value) => Ok(Some(serde_json::to_string(value.as_ref())?)),
            None => Ok(None),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = ResultCache::new();
        let service = ModerationService::create(None).unwrap();
        let key = BookKey::new(" 远行 ", "佚名");

        assert!(cache.get(&key).await.is_none());
        let first = cache
            .get_or_analyze(key.clone(), &service, "第一章 出发\n正文\n")
            .await
            .unwrap();
        // 命中时不再分析，即便文本为空也直接返回
        let second = cache.get_or_analyze(key.clone(), &service, "").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BookKey::new("远行", "佚名"), key);
    }

    #[tokio::test]
    async fn test_invalidate_and_export() {
        let cache = ResultCache::new();
        let key = BookKey::new("书", "作者");
        cache.insert(key.clone(), AnalysisResult::default()).await;

        let json = cache.export_json(&key).await.unwrap().unwrap();
        let restored: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, AnalysisResult::default());

        cache.invalidate(&key).await;
        assert!(cache.get(&key).await.is_none());
        assert!(cache.export_json(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_analysis_errors_are_not_cached() {
        let cache = ResultCache::new();
        let service = ModerationService::create(None).unwrap();
        let key = BookKey::new("空书", "无名");
        assert!(cache.get_or_analyze(key.clone(), &service, "  ").await.is_err());
        assert!(cache.get(&key).await.is_none());
    }
}
