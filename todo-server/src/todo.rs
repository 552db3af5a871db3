use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TodoError, TodoResult};

/// 单条Todo记录
///
/// 除 `id` 外的字段（`title`、`description`、`completed` 以及客户端附加的任意字段）
/// 都原样保存在 `fields` 中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

pub type TodoList = Vec<Todo>;

impl Todo {
    /// 用请求体创建新记录，请求体中的 `id` 会被忽略
    pub fn new(id: u64, mut body: Map<String, Value>) -> Self {
        body.remove("id");
        Self { id, fields: body }
    }

    /// 浅合并：请求体的字段覆盖已有字段，`id` 保持不变
    pub fn merge(&mut self, body: Map<String, Value>) {
        for (key, value) in body {
            if key == "id" {
                continue;
            }
            self.fields.insert(key, value);
        }
    }
}

/// 下一个可用的id：现有最大id加一，空列表时为1
///
/// 最大id已是 `u64::MAX` 时返回错误，不会产生重复id。
pub fn next_id(todos: &[Todo]) -> TodoResult<u64> {
    let max = todos.iter().map(|todo| todo.id).max().unwrap_or(0);
    max.checked_add(1).ok_or(TodoError::IdExhausted(max))
}

/// 将路径参数宽松地转换为id
///
/// 非数字、负数或带小数部分的值返回 `None`，调用方按“记录不存在”处理。
pub fn parse_id(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<u64>() {
        return Some(id);
    }

    let number = trimmed.parse::<f64>().ok()?;
    if number.is_finite() && number >= 0.0 && number.fract() == 0.0 && number <= u64::MAX as f64 {
        Some(number as u64)
    } else {
        None
    }
}

/// 按动态语言的真值规则判断字段是否“有值”
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// 创建记录时要求存在非空标题
pub fn has_title(body: &Map<String, Value>) -> bool {
    body.get("title").is_some_and(is_truthy)
}

pub fn position(todos: &[Todo], id: u64) -> Option<usize> {
    todos.iter().position(|todo| todo.id == id)
}
