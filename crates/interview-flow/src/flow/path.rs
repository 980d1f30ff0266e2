//! Fact path helpers.
//!
//! Paths that address a collection member use `*` in place of the item id,
//! e.g. `/filers/*/isBlind`. Binding an item id produces the concrete path
//! `/filers/#<id>/isBlind` that the fact store understands.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

const WILDCARD: char = '*';

/// Characters left untouched when encoding a single route component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn is_abstract(path: &str) -> bool {
    path.contains(WILDCARD)
}

pub fn concretize(path: &str, item_id: &str) -> String {
    path.replace(WILDCARD, &format!("#{item_id}"))
}

/// Binds `path` to the repetition context. An abstract path without an item
/// cannot be resolved.
pub fn resolve(path: &str, item_id: Option<&str>) -> Option<String> {
    match (is_abstract(path), item_id) {
        (false, _) => Some(path.to_string()),
        (true, Some(id)) => Some(concretize(path, id)),
        (true, None) => None,
    }
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Renders `key=value` pairs as a query string without the leading `?`.
pub fn query_string(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn with_query(route: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        route.to_string()
    } else {
        format!("{route}?{}", query_string(params))
    }
}

/// Query parameters identifying the repetition context and review mode.
pub fn route_params<'a>(
    collection: Option<&'a str>,
    item_id: Option<&'a str>,
    review_mode: bool,
) -> Vec<(&'a str, &'a str)> {
    let mut params = Vec::with_capacity(2);
    if let (Some(collection), Some(item_id)) = (collection, item_id) {
        params.push((collection, item_id));
    }
    if review_mode {
        params.push(("reviewMode", "true"));
    }
    params
}
