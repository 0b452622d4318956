// Response envelope extraction for paginated list endpoints.
//
// The list endpoints wrap their records in several ways depending on the
// backend version: a bare array, `{ data: [...] }`, `{ data: { data: [...] } }`,
// `{ data: { reports: [...] } }`, or `{ reports: [...] }`. Pagination
// metadata sits next to the array or under `pagination` / `meta`, and the
// page count is called `totalPages` or `pages`. Anything unrecognized
// yields an empty page instead of an error.

use serde_json::{Map, Value};

use crate::sync::pagination::PaginationMeta;

/// Keys that may hold the record array, checked in order at each level.
const LIST_KEYS: [&str; 4] = ["data", "reports", "items", "results"];

/// Records and pagination metadata pulled out of a list response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub records: Vec<Value>,
    pub meta: PaginationMeta,
}

/// Extract the record array and pagination metadata from a response body.
pub fn extract_page(body: &Value) -> ExtractedPage {
    let mut containers: Vec<&Map<String, Value>> = Vec::new();
    let records = find_records(body, &mut containers, 0);

    let mut meta = PaginationMeta::default();
    // Innermost container first: nested metadata is the most specific.
    for container in containers.iter().rev() {
        meta = meta.or(meta_from(container));
        for key in ["pagination", "meta"] {
            if let Some(Value::Object(nested)) = container.get(key) {
                meta = meta.or(meta_from(nested));
            }
        }
    }

    ExtractedPage {
        records: records.cloned().unwrap_or_default(),
        meta,
    }
}

/// Walk at most two object levels looking for the record array, collecting
/// every object passed through so metadata can be read from them.
fn find_records<'a>(
    value: &'a Value,
    containers: &mut Vec<&'a Map<String, Value>>,
    depth: usize,
) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) if depth <= 2 => {
            containers.push(map);
            LIST_KEYS.iter().find_map(|key| {
                let inner = map.get(*key)?;
                match inner {
                    Value::Array(items) => Some(items),
                    Value::Object(_) => find_records(inner, containers, depth + 1),
                    _ => None,
                }
            })
        }
        _ => None,
    }
}

fn meta_from(map: &Map<String, Value>) -> PaginationMeta {
    PaginationMeta {
        total: number(map, &["total", "totalCount", "total_count", "count"]),
        page: small_number(map, &["page", "currentPage", "current_page"]),
        limit: small_number(map, &["limit", "perPage", "per_page", "pageSize"]),
        total_pages: small_number(map, &["totalPages", "total_pages", "pages"]),
    }
}

/// Like [`number`], but values that do not fit a `u32` are treated as absent.
fn small_number(map: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    number(map, keys).and_then(|n| u32::try_from(n).ok())
}

fn number(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
