//! 内容分析器
//! 行级计分 → 章节计分 → 整书汇总

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::config::ModerationConfig;
use super::patterns::PatternLibrary;
use super::types::{
    AnalysisResult, Chapter, ChapterAnalysis, ChapterMap, QuickChapterResult, SUMMARY_MARKER,
};

/// 干扰字符：空白、标点分隔符、括号等，计分前统一去除
static DENOISE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s,，、`~\-—_|｜&＆()（）\[\]【】{}<>*·•.。]").expect("denoise pattern is valid")
});

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 内容分析器
#[derive(Debug, Clone)]
pub struct ContentAnalyzer {
    patterns: Arc<PatternLibrary>,
    line_score_threshold: f64,
    chapter_score_threshold: f64,
    summary_max_length: usize,
}

impl ContentAnalyzer {
    pub fn new(patterns: Arc<PatternLibrary>, config: &ModerationConfig) -> Self {
        Self {
            patterns,
            line_score_threshold: config.line_score_threshold,
            chapter_score_threshold: config.chapter_score_threshold,
            summary_max_length: config.summary_max_length,
        }
    }

    /// 行得分：各等级不同命中词数 × 权重之和
    pub fn score_line(&self, line: &str) -> f64 {
        let cleaned = DENOISE_RE.replace_all(line, "");
        self.patterns
            .level_patterns()
            .iter()
            .map(|lp| {
                let distinct: HashSet<&str> = lp
                    .regex
                    .find_iter(&cleaned)
                    .map(|m| m.as_str())
                    .filter(|s| !s.is_empty())
                    .collect();
                f64::from(lp.level.weight()) * distinct.len() as f64
            })
            .sum()
    }

    /// 章节得分：只有达到行阈值的行计入，每行贡献一半得分
    fn score_chapter<'l>(&self, lines: &'l [String], mut on_flagged: impl FnMut(&'l str)) -> f64 {
        let mut score = 0.0;
        for line in lines {
            let line_score = self.score_line(line);
            if line_score >= self.line_score_threshold {
                score += line_score / 2.0;
                on_flagged(line);
            }
        }
        score
    }

    pub fn analyze_chapter(&self, chapter: &Chapter) -> ChapterAnalysis {
        let mut flagged_lines = Vec::new();
        let score = self.score_chapter(&chapter.lines, |line| flagged_lines.push(line.to_string()));
        ChapterAnalysis {
            title: chapter.title().to_string(),
            score,
            flagged_lines,
            is_flagged: score >= self.chapter_score_threshold,
        }
    }

    /// 快速检查：只给出结论和命中行数，不保留命中文本
    pub fn quick_analyze(&self, lines: &[String]) -> QuickChapterResult {
        let mut flagged_lines_count = 0;
        let score = self.score_chapter(lines, |_| flagged_lines_count += 1);
        QuickChapterResult {
            score,
            is_flagged: score >= self.chapter_score_threshold,
            flagged_lines_count,
        }
    }

    pub fn analyze(&self, map: &ChapterMap) -> AnalysisResult {
        let mut total_score = 0.0;
        let mut total_characters = 0u64;
        let mut details = Vec::new();

        for chapter in map {
            let analysis = self.analyze_chapter(chapter);
            total_score += analysis.score;
            total_characters += chapter.char_count();
            if analysis.is_flagged {
                details.push(analysis);
            }
        }

        let total_chapters = map.len();
        let flagged_chapters = details.len();
        let flagged_rate = if total_chapters == 0 {
            0.0
        } else {
            flagged_chapters as f64 / total_chapters as f64
        };

        let result = AnalysisResult {
            total_score: round2(total_score),
            flagged_chapters,
            total_chapters,
            flagged_rate,
            total_characters,
            summary: self.extract_summary(map),
            details,
        };

        info!(
            total_chapters,
            flagged_chapters,
            total_score = result.total_score,
            total_characters,
            "book analyzed"
        );
        result
    }

    /// 0 号章节带简介标记时拼接其全部内容并截断
    fn extract_summary(&self, map: &ChapterMap) -> String {
        let Some(preface) = map.get(0).filter(|c| c.is_summary()) else {
            return String::new();
        };
        let joined: String = preface.lines.concat();
        joined
            .strip_prefix(SUMMARY_MARKER)
            .unwrap_or(&joined)
            .chars()
            .take(self.summary_max_length)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer_with(config: &ModerationConfig) -> ContentAnalyzer {
        ContentAnalyzer::new(Arc::new(PatternLibrary::bundled().unwrap()), config)
    }

    fn analyzer() -> ContentAnalyzer {
        analyzer_with(&ModerationConfig::default())
    }

    fn chapter(index: usize, lines: &[&str]) -> Chapter {
        Chapter {
            index,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_plain_line_scores_zero() {
        assert_eq!(analyzer().score_line("他推开窗，看见了远处的山。"), 0.0);
    }

    #[test]
    fn test_distinct_matches_counted_once() {
        let a = analyzer();
        assert_eq!(a.score_line("他们在赌博"), 2.0);
        assert_eq!(a.score_line("赌博，赌博，还是赌博"), 2.0);
    }

    #[test]
    fn test_new_moderate_match_adds_two() {
        let a = analyzer();
        let base = a.score_line("他们在赌博");
        assert_eq!(a.score_line("他们在赌博还有暴力"), base + 2.0);
    }

    #[test]
    fn test_levels_are_weighted() {
        let a = analyzer();
        assert_eq!(a.score_line("醉酒"), 1.0);
        assert_eq!(a.score_line("吸毒"), 3.0);
        assert_eq!(a.score_line("醉酒后吸毒又赌博"), 6.0);
    }

    #[test]
    fn test_denoise_before_matching() {
        let a = analyzer();
        assert_eq!(a.score_line("赌-博"), 2.0);
        assert_eq!(a.score_line("吸 | 毒"), 3.0);
    }

    #[test]
    fn test_line_threshold_gates_chapter_score() {
        let a = analyzer();
        let analysis = a.analyze_chapter(&chapter(1, &["第一章 开始", "醉酒", "他们在赌博"]));
        assert_eq!(analysis.score, 1.0);
        assert_eq!(analysis.flagged_lines, vec!["他们在赌博".to_string()]);
        assert!(!analysis.is_flagged);
        assert_eq!(analysis.title, "第一章 开始");
    }

    #[test]
    fn test_chapter_threshold_boundary() {
        let lines = ["第一章 开始", "吸毒 暴力 赌博"];
        let analysis = analyzer().analyze_chapter(&chapter(1, &lines));
        assert_eq!(analysis.score, 3.5);
        assert!(analysis.is_flagged);

        let stricter = ModerationConfig {
            chapter_score_threshold: 3.5 + 1e-9,
            ..ModerationConfig::default()
        };
        assert!(!analyzer_with(&stricter).analyze_chapter(&chapter(1, &lines)).is_flagged);
    }

    #[test]
    fn test_quick_matches_full_chapter_scoring() {
        let a = analyzer();
        let c = chapter(3, &["第三章", "吸毒 暴力 赌博", "贩毒和枪支", "平静的一天"]);
        let full = a.analyze_chapter(&c);
        let quick = a.quick_analyze(&c.lines);
        assert_eq!(quick.score, full.score);
        assert_eq!(quick.is_flagged, full.is_flagged);
        assert_eq!(quick.flagged_lines_count, full.flagged_lines.len());
        assert_eq!(quick.flagged_lines_count, 2);
    }

    #[test]
    fn test_analyze_empty_map() {
        let result = analyzer().analyze(&ChapterMap::new());
        assert_eq!(result, AnalysisResult::default());
        assert_eq!(result.flagged_rate, 0.0);
    }

    #[test]
    fn test_analyze_aggregates_book() {
        let map: ChapterMap = vec![
            vec!["summary:一本书的简介".to_string(), "第二行".to_string()],
            vec!["第一章 开始".to_string(), "吸毒 暴力 赌博".to_string()],
            vec!["第二章 继续".to_string(), "他们在赌博".to_string()],
        ]
        .into_iter()
        .collect();
        let result = analyzer().analyze(&map);
        assert_eq!(result.total_chapters, 3);
        assert_eq!(result.flagged_chapters, 1);
        assert_eq!(result.total_score, 4.5);
        assert!((result.flagged_rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.summary, "一本书的简介第二行");
        assert_eq!(result.details.len(), 1);
        assert_eq!(result.details[0].title, "第一章 开始");
        assert_eq!(result.total_characters, map.total_chars());
    }

    #[test]
    fn test_summary_truncated() {
        let config = ModerationConfig {
            summary_max_length: 4,
            ..ModerationConfig::default()
        };
        let map: ChapterMap = vec![vec!["summary:一二三四五六".to_string()]].into_iter().collect();
        assert_eq!(analyzer_with(&config).analyze(&map).summary, "一二三四");
    }

    #[test]
    fn test_no_summary_without_marker() {
        let map: ChapterMap = vec![Vec::new(), vec!["第一章".to_string()]].into_iter().collect();
        assert_eq!(analyzer().analyze(&map).summary, "");
    }
}
