//! Todo列表的文件存储
//!
//! 每次请求都从磁盘完整读取列表，修改后完整写回，不在内存中缓存。

use std::path::PathBuf;

use tokio::{fs, sync::Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};
use crate::todo::TodoList;

/// 存储句柄
#[derive(Debug)]
pub struct TodoStore {
    path: PathBuf,
    /// 串行化“读取-修改-写回”，避免并发写入互相覆盖
    write_lock: Mutex<()>,
}

impl TodoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// 读取完整列表
    ///
    /// 文件不存在或为空时返回空列表；内容损坏时返回错误，不会覆盖原文件。
    pub async fn load(&self) -> TodoResult<TodoList> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("存储文件不存在，使用空列表: {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|source| TodoError::CorruptStore {
            path: self.path.clone(),
            source,
        })
    }

    /// 完整写回列表
    ///
    /// 先写入同目录下的临时文件再重命名，读者不会看到写了一半的文件。
    pub async fn save(&self, todos: &TodoList) -> TodoResult<()> {
        let json = serde_json::to_string_pretty(todos)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.tmp_path();
        if let Err(e) = fs::write(&tmp_path, json).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!("已写入 {} 条记录到 {}", todos.len(), self.path.display());
        Ok(())
    }

    /// 在写锁内执行“读取-修改-写回”
    ///
    /// `apply` 返回错误时不写回文件，存储保持原样。
    pub async fn update<T, F>(&self, apply: F) -> TodoResult<T>
    where
        F: FnOnce(&mut TodoList) -> TodoResult<T>,
    {
        let _guard = self.write_lock.lock().await;

        let mut todos = self.load().await?;
        let output = apply(&mut todos)?;
        self.save(&todos).await?;

        Ok(output)
    }

    /// 启动时检查存储文件是否可读
    pub async fn verify(&self) -> TodoResult<usize> {
        let todos = self.load().await?;
        info!("存储文件 {} 中有 {} 条记录", self.path.display(), todos.len());
        Ok(todos.len())
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "todos".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::Todo;
    use serde_json::{json, Map};

    fn todo(id: u64, title: &str) -> Todo {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(title));
        Todo::new(id, fields)
    }

    #[tokio::test]
    async fn test_missing_and_empty_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        let store = TodoStore::new(&path);
        assert!(store.load().await.unwrap().is_empty());

        std::fs::write(&path, "  \n").unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error_and_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = TodoStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert_eq!(err.error_code(), "CORRUPT_STORE");

        let result = store.update(|todos| {
            todos.push(todo(1, "A"));
            Ok(())
        });
        assert!(result.await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_save_then_reload_from_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todos.json");

        let store = TodoStore::new(&path);
        store.save(&vec![todo(2, "B"), todo(1, "A")]).await.unwrap();

        let reopened = TodoStore::new(&path);
        let todos = reopened.load().await.unwrap();
        assert_eq!(todos, vec![todo(2, "B"), todo(1, "A")]);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todos.json");
        let store = TodoStore::new(&path);

        let result: TodoResult<()> = store.update(|_| Err(TodoError::NotFound)).await;
        assert!(matches!(result, Err(TodoError::NotFound)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(TodoStore::new(dir.path().join("todos.json")));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(|todos| {
                        let id = crate::todo::next_id(todos)?;
                        todos.push(todo(id, "x"));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let todos = store.load().await.unwrap();
        assert_eq!(todos.len(), 16);
        let ids: Vec<u64> = todos.iter().map(|t| t.id).collect();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }
}
