//! 审核配置
//! 所有字段均可在 JSON 中省略，缺省时取默认值

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ModerationError, Result};

/// 内置广告/噪声行模式
pub const DEFAULT_AD_PATTERNS: [&str; 4] = [
    // 关注、加群类引流
    r"关注.{0,6}(?:公众号|微信)|公众号|加.{0,4}(?:QQ|微信)?群|QQ群|扫码|书友群|微信号",
    // 传播声明
    r"(?:仅供|只供)(?:学习|交流|参考|试阅)|请于下载后|版权归|本书由.{0,12}(?:整理|收集|提供)",
    r"(?i)(?:https?://|www\.)\S+|\.(?:com|net|cn|org)\b",
    // 纯符号分隔线
    r"^[\s\p{P}\p{S}]+$",
];

/// 审核配置，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationConfig {
    /// 单行得分达到该值即记为命中行
    #[serde(default = "default_line_score_threshold")]
    pub line_score_threshold: f64,
    /// 章节得分达到该值即标记章节
    #[serde(default = "default_chapter_score_threshold")]
    pub chapter_score_threshold: f64,
    /// 兜底分段时每段行数
    #[serde(default = "default_fallback_chunk_size")]
    pub fallback_chunk_size: usize,
    /// 章节数低于该值时考虑兜底分段
    #[serde(default = "default_min_chapter_count")]
    pub min_chapter_count: usize,
    /// 总字数超过该值才允许兜底分段
    #[serde(default = "default_fallback_min_characters")]
    pub fallback_min_characters: u64,
    #[serde(default = "default_summary_max_length")]
    pub summary_max_length: usize,
    #[serde(default = "default_ad_patterns")]
    pub ad_patterns: Vec<String>,
    /// 外部敏感词库路径，未设置时使用内置词库
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
}

fn default_line_score_threshold() -> f64 { 2.0 }
fn default_chapter_score_threshold() -> f64 { 3.5 }
fn default_fallback_chunk_size() -> usize { 20 }
fn default_min_chapter_count() -> usize { 5 }
fn default_fallback_min_characters() -> u64 { 10_000 }
fn default_summary_max_length() -> usize { 200 }
fn default_ad_patterns() -> Vec<String> {
    DEFAULT_AD_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            line_score_threshold: default_line_score_threshold(),
            chapter_score_threshold: default_chapter_score_threshold(),
            fallback_chunk_size: default_fallback_chunk_size(),
            min_chapter_count: default_min_chapter_count(),
            fallback_min_characters: default_fallback_min_characters(),
            summary_max_length: default_summary_max_length(),
            ad_patterns: default_ad_patterns(),
            lexicon_path: None,
        }
    }
}

impl ModerationConfig {
    /// 从 JSON 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ModerationError::invalid_config(format!("读取 {} 失败: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ModerationError::invalid_config(format!("解析配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<()> {
        if self.fallback_chunk_size == 0 {
            return Err(ModerationError::invalid_config("fallbackChunkSize 必须大于 0"));
        }
        if !self.line_score_threshold.is_finite() || !self.chapter_score_threshold.is_finite() {
            return Err(ModerationError::invalid_config("阈值必须是有限数"));
        }
        Ok(())
    }
}
