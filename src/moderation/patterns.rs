//! 模式库
//! 章节标题候选模式、番外模式、标题排除模式以及三级敏感词模式，
//! 在服务创建时一次性编译，之后只读共享

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::error::{ModerationError, Result};

/// 内置词库（各级模式以 base64 存储）
const BUNDLED_LEXICON: &str = include_str!("../../assets/lexicon.json");

/// 标题模式定义
struct TitlePatternDef {
    /// 正则表达式字符串（整行匹配）
    pattern: &'static str,
    /// 模式名称
    name: &'static str,
}

/// 主标题候选模式，预扫描后只保留命中最多的一个
const MAIN_TITLE_DEFS: &[TitlePatternDef] = &[
    // 标准"第X章"格式
    TitlePatternDef {
        pattern: r"第[零〇一二两三四五六七八九十百千万0-9０-９]+[章回节集][：:\s]*.{0,30}",
        name: "chinese_chapter",
    },
    // 括号包裹的章节 【第X章】
    TitlePatternDef {
        pattern: r"[【\[「]第[零〇一二两三四五六七八九十百千万0-9０-９]+[章节回][】\]」][：:\s]*.{0,30}",
        name: "chinese_chapter_bracket",
    },
    // 卷/部/篇结构
    TitlePatternDef {
        pattern: r"(?:第[零〇一二两三四五六七八九十百千万0-9０-９]+[卷部篇]|卷[零〇一二两三四五六七八九十百千万0-9０-９]+)[：:\s]*.{0,30}",
        name: "chinese_volume",
    },
    // 纯数字章节 "001 标题" 或 "001.标题"
    TitlePatternDef {
        pattern: r"[0-9０-９]{1,4}[.、．\s]\s*.{1,30}",
        name: "numeric_chapter",
    },
    // 中文数字序号 "一、标题"
    TitlePatternDef {
        pattern: r"[一二三四五六七八九十百千]+[、.．]\s*.{1,30}",
        name: "chinese_numeric",
    },
    TitlePatternDef {
        pattern: r"(?i)chapter\s*(?:\d+|[IVXLCM]+)\b.{0,40}",
        name: "english_chapter",
    },
];

/// 番外/序章/尾声等补充章节模式，始终生效
const EXTRA_TITLE_DEFS: &[TitlePatternDef] = &[
    TitlePatternDef {
        pattern: r"番外[零〇一二两三四五六七八九十百千万0-9０-９]*[篇章]?(?:[：:\s].{0,30})?",
        name: "chinese_extra",
    },
    TitlePatternDef {
        pattern: r"(?:序章|楔子|引子|序言|前言)(?:[：:\s].{0,30})?",
        name: "chinese_prologue",
    },
    TitlePatternDef {
        pattern: r"(?:尾声|后记|终章|完本感言|大结局)(?:[：:\s].{0,30})?",
        name: "chinese_epilogue",
    },
    TitlePatternDef {
        pattern: r"(?i)(?:prologue|epilogue|interlude)(?:[:\s].{0,40})?",
        name: "english_extra",
    },
];

/// 标题排除模式（命中任意一条即不视为标题）
const EXCLUDE_DEFS: &[&str] = &[
    // 以句子标点结尾，多半是正文
    r"[。！？!?…；;，,]$",
    // 标题过长
    r"^.{61,}$",
];

/// 敏感等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationLevel {
    Mild,
    Moderate,
    Severe,
}

impl ModerationLevel {
    /// 计分顺序
    pub const ALL: [ModerationLevel; 3] = [
        ModerationLevel::Mild,
        ModerationLevel::Moderate,
        ModerationLevel::Severe,
    ];

    pub fn weight(&self) -> u32 {
        match self {
            ModerationLevel::Mild => 1,
            ModerationLevel::Moderate => 2,
            ModerationLevel::Severe => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModerationLevel::Mild => "mild",
            ModerationLevel::Moderate => "moderate",
            ModerationLevel::Severe => "severe",
        }
    }
}

/// 词库文件中各级别的编码模式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconLevels {
    pub mild: String,
    pub moderate: String,
    pub severe: String,
}

/// 敏感词库资源
///
/// 模式源码不以明文存放，加载时解码，解码或编译失败属于构造期错误。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub version: u32,
    #[serde(default = "default_lexicon_encoding")]
    pub encoding: String,
    pub levels: LexiconLevels,
}

fn default_lexicon_encoding() -> String {
    "base64".to_string()
}

impl Lexicon {
    /// 内置词库
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_LEXICON)
    }

    /// 从外部文件加载词库
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ModerationError::lexicon(format!("读取 {} 失败: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let lexicon: Self = serde_json::from_str(content)
            .map_err(|e| ModerationError::lexicon(format!("解析词库失败: {}", e)))?;
        if lexicon.encoding != "base64" {
            return Err(ModerationError::lexicon(format!(
                "不支持的词库编码: {}",
                lexicon.encoding
            )));
        }
        Ok(lexicon)
    }

    /// 由明文模式构造词库，明文只在内存中存在
    pub fn from_plain(mild: &str, moderate: &str, severe: &str) -> Self {
        Self {
            version: 1,
            encoding: default_lexicon_encoding(),
            levels: LexiconLevels {
                mild: STANDARD.encode(mild),
                moderate: STANDARD.encode(moderate),
                severe: STANDARD.encode(severe),
            },
        }
    }

    /// 解码指定级别的模式源码
    fn decode(&self, level: ModerationLevel) -> Result<String> {
        let encoded = match level {
            ModerationLevel::Mild => &self.levels.mild,
            ModerationLevel::Moderate => &self.levels.moderate,
            ModerationLevel::Severe => &self.levels.severe,
        };
        let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
            ModerationError::lexicon(format!("{} 级模式解码失败: {}", level.name(), e))
        })?;
        let source = String::from_utf8(bytes).map_err(|e| {
            ModerationError::lexicon(format!("{} 级模式不是合法 UTF-8: {}", level.name(), e))
        })?;
        if source.trim().is_empty() {
            return Err(ModerationError::lexicon(format!("{} 级模式为空", level.name())));
        }
        Ok(source)
    }
}

/// 编译后的标题模式
#[derive(Debug)]
pub struct TitlePattern {
    regex: Regex,
    name: &'static str,
}

impl TitlePattern {
    fn compile(def: &TitlePatternDef, group: &'static str) -> Result<Self> {
        let anchored = format!("^(?:{})$", def.pattern);
        let regex = Regex::new(&anchored)
            .map_err(|e| ModerationError::invalid_pattern(group, def.pattern, e))?;
        Ok(Self {
            regex,
            name: def.name,
        })
    }

    /// 整行匹配
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// 编译后的敏感等级模式
#[derive(Debug)]
pub struct LevelPattern {
    pub level: ModerationLevel,
    pub regex: Regex,
}

/// 预编译模式库
#[derive(Debug)]
pub struct PatternLibrary {
    main: Vec<TitlePattern>,
    extra: Vec<TitlePattern>,
    exclude: Vec<Regex>,
    levels: Vec<LevelPattern>,
}

impl PatternLibrary {
    /// 使用指定词库构建模式库
    pub fn new(lexicon: &Lexicon) -> Result<Self> {
        let main = MAIN_TITLE_DEFS
            .iter()
            .map(|def| TitlePattern::compile(def, "main_title"))
            .collect::<Result<Vec<_>>>()?;
        let extra = EXTRA_TITLE_DEFS
            .iter()
            .map(|def| TitlePattern::compile(def, "extra_title"))
            .collect::<Result<Vec<_>>>()?;
        let exclude = EXCLUDE_DEFS
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ModerationError::invalid_pattern("title_exclude", p, e)))
            .collect::<Result<Vec<_>>>()?;

        let mut levels = Vec::with_capacity(ModerationLevel::ALL.len());
        for level in ModerationLevel::ALL {
            let source = lexicon.decode(level)?;
            let regex = Regex::new(&source)
                .map_err(|e| ModerationError::invalid_pattern(level.name(), &source, e))?;
            levels.push(LevelPattern { level, regex });
        }

        debug!(
            main = main.len(),
            extra = extra.len(),
            exclude = exclude.len(),
            lexicon_version = lexicon.version,
            "pattern library compiled"
        );

        Ok(Self {
            main,
            extra,
            exclude,
            levels,
        })
    }

    /// 使用内置词库构建
    pub fn bundled() -> Result<Self> {
        Self::new(&Lexicon::bundled()?)
    }

    pub fn main_patterns(&self) -> &[TitlePattern] {
        &self.main
    }

    pub fn extra_patterns(&self) -> &[TitlePattern] {
        &self.extra
    }

    /// 是否命中标题排除模式
    pub fn is_excluded(&self, line: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(line))
    }

    /// 按计分顺序排列的敏感等级模式
    pub fn level_patterns(&self) -> &[LevelPattern] {
        &self.levels
    }
}
