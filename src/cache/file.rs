//! 文件缓存实现
//!
//! 所有键值保存在一个JSON文件中，同一主机上的多个进程
//! （例如定时执行的心跳命令与HTTP服务）可以通过同一路径共享数据。
//! 写操作在同目录的 `.lock` 文件上持有排他锁，读-改-写不会在进程间交错。

use super::Cache;
use crate::error::CacheError;
use async_trait::async_trait;
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// JSON文件缓存
#[derive(Debug)]
pub struct FileCache {
    /// 缓存文件路径
    path: PathBuf,
    /// 进程内写锁，避免同一实例的写操作占满阻塞线程等待文件锁
    write_lock: Mutex<()>,
}

fn storage_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Storage {
        path: path.display().to_string(),
        source,
    }
}

fn parse_entries(path: &Path, content: &str) -> Result<HashMap<String, String>, CacheError> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    serde_json::from_str(content).map_err(|source| CacheError::Corrupted {
        path: path.display().to_string(),
        source,
    })
}

/// 读取全部条目，文件不存在时视为空缓存
fn read_entries(path: &Path) -> Result<HashMap<String, String>, CacheError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_entries(path, &content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(storage_error(path, e)),
    }
}

/// 先写临时文件再重命名，读方不会看到写了一半的内容
fn write_entries(path: &Path, entries: &HashMap<String, String>) -> Result<(), CacheError> {
    let content = serde_json::to_string(entries).map_err(|source| CacheError::Corrupted {
        path: path.display().to_string(),
        source,
    })?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, content).map_err(|e| storage_error(path, e))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(storage_error(path, e));
    }

    Ok(())
}

/// 在排他文件锁内执行读-改-写，`update` 返回是否需要写回
fn locked_update<T>(
    path: &Path,
    update: impl FnOnce(&mut HashMap<String, String>) -> (T, bool),
) -> Result<T, CacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| storage_error(path, e))?;
        }
    }

    let mut lock_name = path.as_os_str().to_owned();
    lock_name.push(".lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(PathBuf::from(lock_name))
        .map_err(|e| storage_error(path, e))?;
    lock_file
        .lock_exclusive()
        .map_err(|e| storage_error(path, e))?;

    let result = read_entries(path).and_then(|mut entries| {
        let (value, changed) = update(&mut entries);
        if changed {
            write_entries(path, &entries)?;
        }
        Ok(value)
    });

    // 关闭文件同样会释放锁
    let _ = FileExt::unlock(&lock_file);
    result
}

impl FileCache {
    /// 创建文件缓存，文件在首次写入时创建
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn update<T, F>(&self, update: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&mut HashMap<String, String>) -> (T, bool) + Send + 'static,
    {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || locked_update(&path, update))
            .await
            .map_err(|e| storage_error(&self.path, std::io::Error::other(e)))?
    }
}

#[async_trait]
impl Cache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        Ok(parse_entries(&self.path, &content)?.remove(key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let (k, v) = (key.to_string(), value.to_string());
        self.update(move |entries| {
            entries.insert(k, v);
            ((), true)
        })
        .await?;
        log::debug!("缓存写入: {} -> {}", key, self.path.display());
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        let key = key.to_string();
        self.update(move |entries| {
            let existed = entries.remove(&key).is_some();
            (existed, existed)
        })
        .await
    }

    fn driver(&self) -> &'static str {
        "file"
    }
}
