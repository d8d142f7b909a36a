//! 审核服务
//! 规范化 → 去广告 → 切分章节 → 内容分析

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::ad_filter::AdFilter;
use super::analyzer::ContentAnalyzer;
use super::config::ModerationConfig;
use super::error::{ModerationError, Result};
use super::normalizer::TextNormalizer;
use super::patterns::{Lexicon, PatternLibrary};
use super::splitter::ChapterSplitter;
use super::types::{AnalysisResult, ChapterMap, QuickChapterResult};

/// 审核服务，创建后只读，可在线程间共享
#[derive(Debug)]
pub struct ModerationService {
    config: ModerationConfig,
    patterns: Arc<PatternLibrary>,
    normalizer: TextNormalizer,
    ad_filter: AdFilter,
    splitter: ChapterSplitter,
    analyzer: ContentAnalyzer,
}

impl ModerationService {
    /// 创建服务，未提供配置时使用默认配置
    pub fn create(config: Option<ModerationConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let lexicon = match &config.lexicon_path {
            Some(path) => Lexicon::load(path)?,
            None => Lexicon::bundled()?,
        };
        let patterns = Arc::new(PatternLibrary::new(&lexicon)?);
        let ad_filter = AdFilter::new(&config.ad_patterns)?;
        let splitter = ChapterSplitter::new(Arc::clone(&patterns), &config);
        let analyzer = ContentAnalyzer::new(Arc::clone(&patterns), &config);

        debug!(ad_patterns = config.ad_patterns.len(), "moderation service created");

        Ok(Self {
            config,
            patterns,
            normalizer: TextNormalizer::new(),
            ad_filter,
            splitter,
            analyzer,
        })
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    pub fn patterns(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// 分析内存中的文本
    pub fn analyze_text(&self, text: &str) -> Result<AnalysisResult> {
        let start = Instant::now();
        let lines = self.normalizer.lines_from_str(text);
        if lines.is_empty() {
            return Err(ModerationError::EmptyText);
        }
        let result = self.run(lines);
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "text analysis finished");
        Ok(result)
    }

    /// 分析文件，编码自动检测
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<AnalysisResult> {
        let path = path.as_ref();
        let start = Instant::now();
        let lines = self.normalizer.lines_from_file(path)?;
        let result = self.run(lines);
        info!(
            path = %path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "file analysis finished"
        );
        Ok(result)
    }

    /// 只切分不计分，便于调用方查看章节结构
    pub fn split_text(&self, text: &str) -> ChapterMap {
        let lines = self.ad_filter.filter(self.normalizer.lines_from_str(text));
        self.splitter.split(&lines)
    }

    /// 对调用方已切好的章节行做快速检查
    pub fn quick_check(&self, lines: &[String]) -> QuickChapterResult {
        self.analyzer.quick_analyze(lines)
    }

    /// 对原始章节文本做快速检查（先规范化、去广告）
    pub fn quick_check_text(&self, text: &str) -> QuickChapterResult {
        let lines = self.ad_filter.filter(self.normalizer.lines_from_str(text));
        self.analyzer.quick_analyze(&lines)
    }

    fn run(&self, lines: Vec<String>) -> AnalysisResult {
        let before = lines.len();
        let lines = self.ad_filter.filter(lines);
        debug!(lines = before, removed = before - lines.len(), "ad lines filtered");
        let map = self.splitter.split(&lines);
        self.analyzer.analyze(&map)
    }
}
