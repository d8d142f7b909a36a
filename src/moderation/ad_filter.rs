//! 广告/噪声行过滤

use regex::Regex;

use super::error::{ModerationError, Result};

/// 广告行过滤器
#[derive(Debug)]
pub struct AdFilter {
    patterns: Vec<Regex>,
}

impl AdFilter {
    /// 编译全部模式，任一模式无效即构造失败
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let source = p.as_ref();
                Regex::new(source).map_err(|e| ModerationError::invalid_pattern("ad", source, e))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// 行内任意位置命中即视为广告
    pub fn is_ad(&self, line: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(line))
    }

    pub fn filter(&self, lines: Vec<String>) -> Vec<String> {
        lines.into_iter().filter(|line| !self.is_ad(line)).collect()
    }
}
