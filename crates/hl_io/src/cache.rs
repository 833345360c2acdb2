// crates/hl_io/src/cache.rs

//! 表缓存
//!
//! 同一个连接文件会被多个通道读取（正向、反向、每步重建的再分配映射），
//! 缓存按 `(路径, 表头行数)` 保存已解析的表，并以修改时间判定是否失效。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use hl_foundation::{HlError, HlResult};
use parking_lot::RwLock;
use tracing::trace;

use crate::table::{load_table, Table};

type CacheKey = (PathBuf, usize);

#[derive(Debug)]
struct CacheEntry {
    modified: Option<SystemTime>,
    table: Arc<Table>,
}

/// 已解析表的共享缓存
#[derive(Debug, Default)]
pub struct TableCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl TableCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 加载表，文件未变化时返回缓存
    pub fn load(&self, path: &Path, skip_rows: usize) -> HlResult<Arc<Table>> {
        let modified = modification_time(path)?;
        let key = (path.to_path_buf(), skip_rows);

        if let Some(entry) = self.entries.read().get(&key) {
            if entry.modified == modified {
                trace!(file = %path.display(), "table cache hit");
                return Ok(Arc::clone(&entry.table));
            }
        }

        let table = Arc::new(load_table(path, skip_rows)?);
        self.entries.write().insert(
            key,
            CacheEntry {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// 缓存条目数
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

fn modification_time(path: &Path) -> HlResult<Option<SystemTime>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.modified().ok()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(HlError::file_not_found(path)),
        Err(e) => Err(HlError::io_with_source(format!("读取 {} 元数据失败", path.display()), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_cache_hit_shares_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 0 0").unwrap();
        writeln!(file, "5 5 1").unwrap();

        let cache = TableCache::new();
        let a = cache.load(file.path(), 1).unwrap();
        let b = cache.load(file.path(), 1).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        // 不同表头行数是不同的条目，首行此时作为数据读入
        let c = cache.load(file.path(), 0).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_modified_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DFLOWFM1D_POINTS.DAT");
        std::fs::write(&path, "5 5 1\n").unwrap();

        let cache = TableCache::new();
        let first = cache.load(&path, 0).unwrap();
        assert_eq!(first.len(), 1);

        std::fs::write(&path, "5 5 1\n25 15 2\n").unwrap();
        // 文件系统时间戳精度有限，显式推后修改时间
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();

        let second = cache.load(&path, 0).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
        assert_eq!(cache.len(), 1);

        // 已加载的旧表不受影响
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let cache = TableCache::new();
        let err = cache.load(Path::new("/nonexistent/mod2svat.inp"), 0).unwrap_err();
        assert!(matches!(err, HlError::FileNotFound { .. }));
        assert!(cache.is_empty());
    }
}
