use serde::{Deserialize, Serialize};

/// 简介标记，只加在 0 号章节的首行
pub const SUMMARY_MARKER: &str = "summary:";

/// 单个章节，首行即标题行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub index: usize,
    pub lines: Vec<String>,
}

impl Chapter {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            lines: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or("")
    }

    /// 字符数（按 Unicode 标量计）
    pub fn char_count(&self) -> u64 {
        self.lines.iter().map(|l| l.chars().count() as u64).sum()
    }

    /// 首行是否带简介标记
    pub fn is_summary(&self) -> bool {
        self.title().starts_with(SUMMARY_MARKER)
    }
}

/// 有序章节表，下标即章节序号
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMap {
    chapters: Vec<Chapter>,
}

impl ChapterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取指定序号的章节，不存在时依次补齐
    pub fn bucket_mut(&mut self, index: usize) -> &mut Chapter {
        while self.chapters.len() <= index {
            let next = self.chapters.len();
            self.chapters.push(Chapter::new(next));
        }
        &mut self.chapters[index]
    }

    pub fn get(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Chapter> {
        self.chapters.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chapter> {
        self.chapters.iter()
    }

    pub fn total_chars(&self) -> u64 {
        self.chapters.iter().map(Chapter::char_count).sum()
    }

    pub fn into_chapters(self) -> Vec<Chapter> {
        self.chapters
    }
}

impl<'a> IntoIterator for &'a ChapterMap {
    type Item = &'a Chapter;
    type IntoIter = std::slice::Iter<'a, Chapter>;

    fn into_iter(self) -> Self::IntoIter {
        self.chapters.iter()
    }
}

impl FromIterator<Vec<String>> for ChapterMap {
    fn from_iter<I: IntoIterator<Item = Vec<String>>>(iter: I) -> Self {
        let chapters = iter
            .into_iter()
            .enumerate()
            .map(|(index, lines)| Chapter { index, lines })
            .collect();
        Self { chapters }
    }
}

/// 章节分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterAnalysis {
    pub title: String,
    pub score: f64,
    pub flagged_lines: Vec<String>,
    pub is_flagged: bool,
}

/// 整书分析结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 总分（保留两位小数）
    pub total_score: f64,
    pub flagged_chapters: usize,
    pub total_chapters: usize,
    pub flagged_rate: f64,
    pub total_characters: u64,
    pub summary: String,
    /// 仅保留被标记的章节
    pub details: Vec<ChapterAnalysis>,
}

/// 单章快速检查结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickChapterResult {
    pub score: f64,
    pub is_flagged: bool,
    pub flagged_lines_count: usize,
}
