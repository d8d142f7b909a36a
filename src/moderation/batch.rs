//! 批量快速检查
//! 有界工作池并发检查一本书的多个章节，结果按章节号排序返回

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;
use tracing::{info, warn};

use super::service::ModerationService;
use super::types::QuickChapterResult;

const MIN_WORKERS: usize = 2;
const MAX_WORKERS: usize = 6;

/// 待检查章节
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterInput {
    pub id: u32,
    pub title: String,
    /// 原始章节文本
    pub text: String,
}

/// 单章检查结论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterVerdict {
    pub id: u32,
    pub title: String,
    pub result: QuickChapterResult,
}

/// 整书汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookVerdict {
    pub total_chapters: usize,
    pub flagged_chapters: usize,
    pub total_score: f64,
    pub flagged_ids: Vec<u32>,
}

impl BookVerdict {
    pub fn from_verdicts(verdicts: &[ChapterVerdict]) -> Self {
        let flagged_ids: Vec<u32> = verdicts
            .iter()
            .filter(|v| v.result.is_flagged)
            .map(|v| v.id)
            .collect();
        let total_score: f64 = verdicts.iter().map(|v| v.result.score).sum();
        Self {
            total_chapters: verdicts.len(),
            flagged_chapters: flagged_ids.len(),
            total_score: (total_score * 100.0).round() / 100.0,
            flagged_ids,
        }
    }
}

/// 工作线程数：可用并行度限制在 2..=6
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

/// 并发快速检查多个章节
///
/// 章节之间互不依赖，完成顺序无关；单个任务失败只记录日志并跳过。
pub async fn quick_check_chapters(
    service: Arc<ModerationService>,
    chapters: Vec<ChapterInput>,
) -> Vec<ChapterVerdict> {
    let workers = worker_count();
    let semaphore = Arc::new(Semaphore::new(workers));
    let total = chapters.len();

    let tasks = chapters.into_iter().map(|chapter| {
        let service = Arc::clone(&service);
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            let id = chapter.id;
            let handle = task::spawn_blocking(move || ChapterVerdict {
                result: service.quick_check_text(&chapter.text),
                id: chapter.id,
                title: chapter.title,
            });
            match handle.await {
                Ok(verdict) => Some(verdict),
                Err(e) => {
                    warn!(chapter = id, error = %e, "quick check task failed");
                    None
                }
            }
        }
    });

    let mut verdicts: Vec<ChapterVerdict> = join_all(tasks).await.into_iter().flatten().collect();
    verdicts.sort_by_key(|v| v.id);

    info!(
        chapters = total,
        checked = verdicts.len(),
        flagged = verdicts.iter().filter(|v| v.result.is_flagged).count(),
        workers,
        "batch quick check finished"
    );
    verdicts
}
