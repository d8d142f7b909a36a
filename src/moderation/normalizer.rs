//! 文本规范化
//! 负责编码检测、逐行清洗并丢弃空行

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::error::{ModerationError, Result};

const BOM: char = '\u{FEFF}';
/// 全角空格
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// 文本规范化器
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 单行规范化：去 BOM、全角空格、回车，并去除首尾空白
    pub fn normalize_line(line: &str) -> String {
        // BOM 不属于空白字符，trim 之后不能再暴露出新的 BOM
        let cleaned: String = line
            .chars()
            .filter(|&c| c != BOM && c != IDEOGRAPHIC_SPACE && c != '\r')
            .collect();
        cleaned.trim().to_string()
    }

    /// 已解码文本按行规范化，空行直接丢弃
    ///
    /// `\r\n` 与单独的 `\r` 都视为换行。
    pub fn lines_from_str(&self, text: &str) -> Vec<String> {
        let unified = text.replace("\r\n", "\n").replace('\r', "\n");
        unified
            .split('\n')
            .map(Self::normalize_line)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// 读取文件并自动检测编码
    pub fn lines_from_file(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModerationError::file_not_found(path));
        }
        if !path.is_file() {
            return Err(ModerationError::file_unreadable(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "不是普通文件"),
            ));
        }

        let bytes = fs::read(path).map_err(|e| ModerationError::file_unreadable(path, e))?;
        let (content, encoding) = Self::decode_bytes(&bytes);
        debug!(path = %path.display(), encoding = encoding.name(), bytes = bytes.len(), "file decoded");

        Ok(self.lines_from_str(&content))
    }

    /// 编码检测与解码，永不失败
    pub fn decode_bytes(bytes: &[u8]) -> (String, &'static Encoding) {
        // BOM 检测：UTF-8/UTF-16
        if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
            return (String::from_utf8_lossy(rest).into_owned(), UTF_8);
        }
        if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
            return (Self::decode_as(rest, UTF_16LE), UTF_16LE);
        }
        if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
            return (Self::decode_as(rest, UTF_16BE), UTF_16BE);
        }

        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        let encoding = detector.guess(None, true);
        (Self::decode_as(bytes, encoding), encoding)
    }

    /// 按调用方给出的编码名解码，无法识别的编码名回退到 UTF-8
    pub fn decode_with_label(bytes: &[u8], label: &str) -> (String, &'static Encoding) {
        let encoding = Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
            warn!(label, "unrecognized charset label, falling back to UTF-8");
            UTF_8
        });
        (Self::decode_as(bytes, encoding), encoding)
    }

    fn decode_as(bytes: &[u8], encoding: &'static Encoding) -> String {
        let (decoded, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            warn!(encoding = encoding.name(), "decoding produced replacement characters");
        }
        decoded.into_owned()
    }
}
