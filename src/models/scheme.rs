// 方案编辑器数据结构

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 菜单树，结构对后端不透明
pub type TreeData = Map<String, Value>;

/// 方案图（节点 + 连线）
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Scheme {
    pub nodes: Vec<Value>,
    pub links: Vec<Value>,
    #[serde(rename = "nextEntityId")]
    pub next_entity_id: i64,
    #[serde(rename = "nextLinkNo")]
    pub next_link_no: i64,
}

impl Default for Scheme {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            next_entity_id: 1,
            next_link_no: 1,
        }
    }
}

impl Scheme {
    /// 从任意 JSON 对象规范化
    /// 缺失或类型不对的字段回落到默认值
    pub fn normalize(raw: &Map<String, Value>) -> Self {
        let mut scheme = Self::default();

        if let Some(Value::Array(nodes)) = raw.get("nodes") {
            scheme.nodes = nodes.clone();
        }
        if let Some(Value::Array(links)) = raw.get("links") {
            scheme.links = links.clone();
        }
        if let Some(id) = raw.get("nextEntityId").and_then(json_int) {
            scheme.next_entity_id = id;
        }
        if let Some(no) = raw.get("nextLinkNo").and_then(json_int) {
            scheme.next_link_no = no;
        }

        scheme
    }
}

/// 接受整数以及小数部分为 0 的浮点数（前端可能写出 3.0）
fn json_int(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.trunc() == f && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_empty_object_gives_defaults() {
        assert_eq!(Scheme::normalize(&Map::new()), Scheme::default());
    }

    #[test]
    fn test_normalize_keeps_valid_fields() {
        let raw = obj(json!({
            "nodes": [{"id": 1}],
            "links": [{"from": 1, "to": 2}],
            "nextEntityId": 5,
            "nextLinkNo": 3.0
        }));
        let scheme = Scheme::normalize(&raw);
        assert_eq!(scheme.nodes.len(), 1);
        assert_eq!(scheme.links.len(), 1);
        assert_eq!(scheme.next_entity_id, 5);
        assert_eq!(scheme.next_link_no, 3);
    }

    #[test]
    fn test_normalize_rejects_wrong_types() {
        let raw = obj(json!({
            "nodes": "not-a-list",
            "links": null,
            "nextEntityId": 2.5,
            "nextLinkNo": "7"
        }));
        assert_eq!(Scheme::normalize(&raw), Scheme::default());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(Scheme::default()).unwrap();
        assert_eq!(value["nextEntityId"], 1);
        assert_eq!(value["nextLinkNo"], 1);
    }
}
