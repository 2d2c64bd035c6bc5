// ==========================================
// 考试名册系统 - 上传文件清理
// ==========================================
// 职责: 删除已处理的上传文件
// 红线: 删除幂等（文件已不存在视为成功）
// ==========================================

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::debug;

// ==========================================
// ArtifactStore Trait
// ==========================================
// 实现者: LocalArtifactStore（本地文件系统）
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// 删除源文件
    ///
    /// # 返回
    /// - Ok(true): 文件已删除
    /// - Ok(false): 文件本就不存在
    /// - Err: 删除失败（权限等）
    async fn delete(&self, path: &Path) -> io::Result<bool>;
}

pub struct LocalArtifactStore;

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn delete(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "源文件已删除");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "源文件不存在，跳过删除");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, "rollNo\nA1\n").unwrap();

        let store = LocalArtifactStore;
        assert!(store.delete(&path).await.unwrap());
        assert!(!path.exists());
        assert!(!store.delete(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_directory_fails() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore;
        assert!(store.delete(dir.path()).await.is_err());
    }
}
