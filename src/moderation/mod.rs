//! 书籍文本审核引擎
//! 负责编码检测、去广告、章节切分和敏感内容计分

pub mod ad_filter;
pub mod analyzer;
pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod patterns;
pub mod service;
pub mod splitter;
pub mod types;

pub use ad_filter::AdFilter;
pub use analyzer::ContentAnalyzer;
pub use batch::{quick_check_chapters, worker_count, BookVerdict, ChapterInput, ChapterVerdict};
pub use cache::{BookKey, ResultCache};
pub use config::{ModerationConfig, DEFAULT_AD_PATTERNS};
pub use error::{ModerationError, Result};
pub use normalizer::TextNormalizer;
pub use patterns::{Lexicon, ModerationLevel, PatternLibrary};
pub use service::ModerationService;
pub use splitter::ChapterSplitter;
pub use types::{
    AnalysisResult, Chapter, ChapterAnalysis, ChapterMap, QuickChapterResult, SUMMARY_MARKER,
};
