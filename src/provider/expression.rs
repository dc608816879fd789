use crate::listing::PageQuery;

/// Build the upstream search expression for one partition page
///
/// `folder="quotes" AND resource_type=raw AND type=upload`, narrowed to
/// `(filename="q-*" OR public_id="quotes/q-*")` when a prefix is set.
pub fn search_expression(query: &PageQuery) -> String {
    let folder = escape(&query.folder);

    let mut expression = format!(
        "folder=\"{}\" AND resource_type={} AND type={}",
        folder,
        query.partition.storage.as_str(),
        query.partition.access.as_str(),
    );

    if let Some(prefix) = query.prefix.as_deref() {
        let prefix = escape(prefix);
        expression.push_str(&format!(
            " AND (filename=\"{prefix}*\" OR public_id=\"{folder}/{prefix}*\")"
        ));
    }

    expression
}

fn escape(value: &str) -> String {
    value.replace('"', "\\\"")
}
