//! 章节切分器
//! 预扫描选出最匹配的标题模式，再按该模式与番外模式切分，
//! 章节过少且文本足够长时退化为按固定行数分段

use std::sync::Arc;
use tracing::debug;

use super::config::ModerationConfig;
use super::patterns::PatternLibrary;
use super::types::{ChapterMap, SUMMARY_MARKER};

/// 章节切分器
#[derive(Debug, Clone)]
pub struct ChapterSplitter {
    patterns: Arc<PatternLibrary>,
    /// 低于该章节数时考虑兜底分段
    min_chapter_count: usize,
    /// 兜底分段的最小字数
    fallback_min_characters: u64,
    fallback_chunk_size: usize,
}

impl ChapterSplitter {
    pub fn new(patterns: Arc<PatternLibrary>, config: &ModerationConfig) -> Self {
        Self {
            patterns,
            min_chapter_count: config.min_chapter_count,
            fallback_min_characters: config.fallback_min_characters,
            fallback_chunk_size: config.fallback_chunk_size.max(1),
        }
    }

    /// 切分规范化、去广告后的行
    pub fn split(&self, lines: &[String]) -> ChapterMap {
        if lines.is_empty() {
            return ChapterMap::new();
        }

        // Stage 1: 预扫描选择主模式
        let main = self.select_main_pattern(lines);

        // Stage 2: 按主模式与番外模式切分
        let mut map = self.split_by_titles(lines, main);

        // 简介标记不计入字数
        let total_chars = map.total_chars();

        // Stage 3: 标记简介
        Self::mark_summary(&mut map);

        // Stage 4: 兜底分段
        if map.len() < self.min_chapter_count && total_chars > self.fallback_min_characters {
            debug!(
                chapters = map.len(),
                total_chars,
                chunk_size = self.fallback_chunk_size,
                "too few chapters detected, falling back to fixed-size chunks"
            );
            return self.chunk_lines(lines);
        }

        map
    }

    /// 统计每个主模式的命中行数，返回命中最多者的下标（并列取靠前者）
    pub fn select_main_pattern(&self, lines: &[String]) -> Option<usize> {
        let candidates = self.patterns.main_patterns();
        let mut counts = vec![0usize; candidates.len()];

        for line in lines {
            if self.patterns.is_excluded(line) {
                continue;
            }
            for (i, pattern) in candidates.iter().enumerate() {
                if pattern.is_match(line) {
                    counts[i] += 1;
                }
            }
        }

        let mut best: Option<usize> = None;
        for (i, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            match best {
                Some(b) if counts[b] >= count => {}
                _ => best = Some(i),
            }
        }

        match best {
            Some(i) => debug!(pattern = candidates[i].name(), matches = counts[i], "main title pattern selected"),
            None => debug!("no main title pattern matched"),
        }
        best
    }

    fn is_title(&self, line: &str, main: Option<usize>) -> bool {
        if self.patterns.is_excluded(line) {
            return false;
        }
        let main_hit = main
            .and_then(|i| self.patterns.main_patterns().get(i))
            .map_or(false, |p| p.is_match(line));
        main_hit || self.patterns.extra_patterns().iter().any(|p| p.is_match(line))
    }

    /// 标题行先开新章再写入，标题之前的行留在 0 号章节
    fn split_by_titles(&self, lines: &[String], main: Option<usize>) -> ChapterMap {
        let mut map = ChapterMap::new();
        let mut index = 0usize;
        map.bucket_mut(0);

        for line in lines {
            if self.is_title(line, main) {
                index += 1;
            }
            map.bucket_mut(index).lines.push(line.clone());
        }

        map
    }

    /// 0 号章节首行不是标题时加上简介标记，已有标记则不重复添加
    fn mark_summary(map: &mut ChapterMap) {
        if let Some(first) = map.get_mut(0).and_then(|c| c.lines.first_mut()) {
            if !first.starts_with(SUMMARY_MARKER) {
                first.insert_str(0, SUMMARY_MARKER);
            }
        }
    }

    fn chunk_lines(&self, lines: &[String]) -> ChapterMap {
        lines
            .chunks(self.fallback_chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter_with(config: &ModerationConfig) -> ChapterSplitter {
        ChapterSplitter::new(Arc::new(PatternLibrary::bundled().unwrap()), config)
    }

    fn splitter() -> ChapterSplitter {
        splitter_with(&ModerationConfig::default())
    }

    fn to_lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(splitter().split(&[]).is_empty());
    }

    #[test]
    fn test_chinese_chapters() {
        let lines = to_lines(&["第一章 开始", "这是正文内容", "第二章 继续", "更多内容"]);
        let map = splitter().split(&lines);
        assert_eq!(map.len(), 3);
        assert!(map.get(0).unwrap().lines.is_empty());
        assert_eq!(map.get(1).unwrap().lines, to_lines(&["第一章 开始", "这是正文内容"]));
        assert_eq!(map.get(2).unwrap().title(), "第二章 继续");
    }

    #[test]
    fn test_summary_marked_once() {
        let lines = to_lines(&["一本关于远行的书", "第一章 开始", "正文"]);
        let s = splitter();
        let first = s.split(&lines);
        assert_eq!(first.get(0).unwrap().lines, to_lines(&["summary:一本关于远行的书"]));

        // 对已标记的结果再次切分
        let relines: Vec<String> = first.iter().flat_map(|c| c.lines.clone()).collect();
        let second = s.split(&relines);
        assert_eq!(second.get(0).unwrap().title(), "summary:一本关于远行的书");
        assert_eq!(second, first);
    }

    #[test]
    fn test_summary_only_on_first_line() {
        let lines = to_lines(&["简介第一行", "简介第二行", "第一章 开始"]);
        let map = splitter().split(&lines);
        assert_eq!(map.get(0).unwrap().lines, to_lines(&["summary:简介第一行", "简介第二行"]));
    }

    #[test]
    fn test_best_pattern_selected() {
        let lines = to_lines(&[
            "第一章 开始",
            "1. 清单里的第一项",
            "正文",
            "第二章 继续",
            "正文",
            "第三章 结束",
        ]);
        let s = splitter();
        assert_eq!(s.select_main_pattern(&lines), Some(0));
        let map = s.split(&lines);
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(1).unwrap().lines, to_lines(&["第一章 开始", "1. 清单里的第一项", "正文"]));
    }

    #[test]
    fn test_tie_prefers_first_pattern() {
        let lines = to_lines(&["第一章 开始", "正文", "1、开始", "正文"]);
        let s = splitter();
        assert_eq!(s.select_main_pattern(&lines), Some(0));
        assert_eq!(s.split(&lines).len(), 2);
    }

    #[test]
    fn test_no_main_pattern() {
        let lines = to_lines(&["只有正文", "没有标题"]);
        assert_eq!(splitter().select_main_pattern(&lines), None);
    }

    #[test]
    fn test_extra_chapters_always_split() {
        let lines = to_lines(&["第一章 开始", "正文", "番外 夏日", "番外正文", "后记", "感谢"]);
        let map = splitter().split(&lines);
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(2).unwrap().title(), "番外 夏日");
        assert_eq!(map.get(3).unwrap().title(), "后记");
    }

    #[test]
    fn test_excluded_line_is_not_boundary() {
        let lines = to_lines(&["第一章 开始", "正文", "第二章 他终于走了。", "正文"]);
        let map = splitter().split(&lines);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_fallback_chunks() {
        let config = ModerationConfig {
            min_chapter_count: 3,
            fallback_min_characters: 5,
            fallback_chunk_size: 2,
            ..ModerationConfig::default()
        };
        let lines = to_lines(&["甲乙", "丙丁", "戊己", "庚辛", "壬癸"]);
        let map = splitter_with(&config).split(&lines);
        assert_eq!(map.len(), 3);
        let indices: Vec<usize> = map.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(map.get(0).unwrap().lines, to_lines(&["甲乙", "丙丁"]));
        assert_eq!(map.get(2).unwrap().lines, to_lines(&["壬癸"]));
    }

    #[test]
    fn test_summary_marker_not_counted_for_fallback() {
        let config = ModerationConfig {
            min_chapter_count: 3,
            fallback_min_characters: 10,
            fallback_chunk_size: 1,
            ..ModerationConfig::default()
        };
        let lines = to_lines(&["甲乙丙丁戊", "己庚辛壬癸"]);
        let map = splitter_with(&config).split(&lines);
        assert_eq!(map.len(), 1);
        assert!(map.get(0).unwrap().is_summary());
    }

    #[test]
    fn test_short_text_keeps_heuristic_split() {
        let lines = to_lines(&["甲乙", "丙丁"]);
        let map = splitter().split(&lines);
        assert_eq!(map.len(), 1);
        assert!(map.get(0).unwrap().is_summary());
    }

    #[test]
    fn test_order_preserved() {
        let lines = to_lines(&["序", "第一章 a", "x", "y", "第二章 b", "z", "番外", "w"]);
        let map = splitter().split(&lines);
        let flattened: Vec<String> = map
            .iter()
            .flat_map(|c| c.lines.iter())
            .map(|l| l.strip_prefix(SUMMARY_MARKER).unwrap_or(l).to_string())
            .collect();
        assert_eq!(flattened, lines);
    }
}
