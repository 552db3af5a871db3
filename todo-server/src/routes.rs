use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    error::{TodoError, TodoResult},
    todo::{has_title, next_id, parse_id, position, Todo, TodoList},
    AppState,
};

/// 解析请求体，空请求体视为 `{}`
fn parse_body(body: &[u8]) -> TodoResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice(body).map_err(TodoError::invalid_body)? {
        Value::Object(map) => Ok(map),
        other => Err(TodoError::invalid_body(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 路径参数转换为id，无法解码或不是数字时都按记录不存在处理
fn resolve_id(path: Result<Path<String>, PathRejection>) -> TodoResult<u64> {
    let Path(raw_id) = path.map_err(|rejection| {
        debug!("无法解析路径参数: {}", rejection);
        TodoError::NotFound
    })?;
    parse_id(&raw_id).ok_or(TodoError::NotFound)
}

/// 获取Todo列表
pub async fn list_todos(State(state): State<AppState>) -> TodoResult<Json<TodoList>> {
    let todos = state.store.load().await?;
    Ok(Json(todos))
}

/// 按id获取单条Todo
pub async fn get_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> TodoResult<Json<Todo>> {
    let id = resolve_id(path)?;
    let todos = state.store.load().await?;

    todos
        .into_iter()
        .find(|todo| todo.id == id)
        .map(Json)
        .ok_or(TodoError::NotFound)
}

/// 创建Todo，返回更新后的完整列表
pub async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> TodoResult<(StatusCode, Json<TodoList>)> {
    let body = parse_body(&body)?;
    if !has_title(&body) {
        warn!("创建Todo失败: 缺少标题");
        return Err(TodoError::TitleMandatory);
    }

    let todos = state
        .store
        .update(|todos| {
            let id = next_id(todos)?;
            todos.push(Todo::new(id, body));
            info!("创建Todo: id={}", id);
            Ok(todos.clone())
        })
        .await?;

    Ok((StatusCode::CREATED, Json(todos)))
}

/// 按id更新Todo，请求体浅合并到原记录上
pub async fn update_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> TodoResult<Json<TodoList>> {
    let body = parse_body(&body)?;
    let id = resolve_id(path)?;

    let todos = state
        .store
        .update(|todos| {
            let index = position(todos, id).ok_or(TodoError::NotFound)?;
            todos[index].merge(body);
            info!("更新Todo: id={}", id);
            Ok(todos.clone())
        })
        .await?;

    Ok(Json(todos))
}

/// 按id删除Todo，返回剩余列表
pub async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> TodoResult<Json<TodoList>> {
    let id = resolve_id(path)?;

    let todos = state
        .store
        .update(|todos| {
            let index = position(todos, id).ok_or(TodoError::NotFound)?;
            todos.remove(index);
            info!("删除Todo: id={}", id);
            Ok(todos.clone())
        })
        .await?;

    Ok(Json(todos))
}

/// 未匹配的路由
pub async fn route_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Route not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert!(parse_body(b" \n").unwrap().is_empty());

        let map = parse_body(br#"{"title":"A","extra":[1,2]}"#).unwrap();
        assert_eq!(map.get("extra"), Some(&json!([1, 2])));

        let err = parse_body(b"[1,2]").unwrap_err();
        assert!(err.to_string().contains("array"));
        assert_eq!(parse_body(b"{oops").unwrap_err().status_code(), StatusCode::BAD_REQUEST);
    }
}
